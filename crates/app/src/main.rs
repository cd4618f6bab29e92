use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quiz_core::model::{DEFAULT_QUESTION_COUNT, QuizSettings, ReviewQuality, SelectionMode};
use services::{Clock, QuizLoopService, QuizSession, SessionError, SessionPhase};
use storage::repository::{QuestionRepository, Storage};
use storage::{JsonFileStore, JsonQuestionBank};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCount { raw: String },
    InvalidLedger { raw: String },
    BlankSubject,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidLedger { raw } => write!(f, "invalid --ledger value: {raw}"),
            ArgsError::BlankSubject => write!(f, "--subject cannot be blank"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz [quiz]    [--bank <path>] [--ledger <dir|sqlite_url>] [--subject <name>]");
    eprintln!("                 [--count <n>] [--due | --random]");
    eprintln!("  quiz subjects  [--bank <path>] [--ledger <dir|sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --bank questions.json");
    eprintln!("  --ledger .quiz");
    eprintln!("  --count {DEFAULT_QUESTION_COUNT}");
    eprintln!("  --random");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BANK_PATH, QUIZ_LEDGER, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Subjects,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "subjects" => Some(Self::Subjects),
            _ => None,
        }
    }
}

/// Where review history is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LedgerTarget {
    Dir(PathBuf),
    Sqlite(String),
}

impl LedgerTarget {
    fn parse(raw: &str) -> Result<Self, ArgsError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ArgsError::InvalidLedger { raw: raw.to_owned() });
        }
        if trimmed.starts_with("sqlite:") {
            return Ok(Self::Sqlite(normalize_sqlite_url(trimmed)));
        }
        Ok(Self::Dir(PathBuf::from(trimmed)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    bank_path: PathBuf,
    ledger: LedgerTarget,
    subject: Option<String>,
    count: u32,
    mode: SelectionMode,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            bank_path: PathBuf::from("questions.json"),
            ledger: LedgerTarget::Dir(PathBuf::from(".quiz")),
            subject: None,
            count: DEFAULT_QUESTION_COUNT,
            mode: SelectionMode::Random,
        }
    }
}

impl Args {
    fn from_env() -> Result<Self, ArgsError> {
        let mut args = Self::default();
        if let Ok(path) = std::env::var("QUIZ_BANK_PATH") {
            args.bank_path = PathBuf::from(path);
        }
        if let Ok(ledger) = std::env::var("QUIZ_LEDGER") {
            args.ledger = LedgerTarget::parse(&ledger)?;
        }
        Ok(args)
    }

    fn apply_flags(
        mut self,
        args: &mut impl Iterator<Item = String>,
        cmd: Command,
    ) -> Result<Self, ArgsError> {
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bank" => self.bank_path = PathBuf::from(require_value(args, "--bank")?),
                "--ledger" => self.ledger = LedgerTarget::parse(&require_value(args, "--ledger")?)?,
                "--subject" if cmd == Command::Quiz => {
                    let value = require_value(args, "--subject")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::BlankSubject);
                    }
                    self.subject = Some(value);
                }
                "--count" if cmd == Command::Quiz => {
                    let value = require_value(args, "--count")?;
                    self.count = match value.parse::<u32>() {
                        Ok(n) if n > 0 => n,
                        _ => return Err(ArgsError::InvalidCount { raw: value }),
                    };
                }
                "--due" if cmd == Command::Quiz => self.mode = SelectionMode::Due,
                "--random" if cmd == Command::Quiz => self.mode = SelectionMode::Random,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(self)
    }

    fn settings(&self) -> Result<QuizSettings, quiz_core::Error> {
        Ok(QuizSettings::new(
            self.subject.clone(),
            self.count,
            self.mode,
        )?)
    }
}

fn normalize_sqlite_url(raw: &str) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw.to_owned();
    }

    let path_str = raw.strip_prefix("sqlite:").unwrap_or(raw);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidLedger {
            raw: db_url.to_owned(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidLedger {
            raw: db_url.to_owned(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

async fn open_storage(args: &Args) -> Result<Storage, Box<dyn std::error::Error>> {
    let questions: Arc<dyn QuestionRepository> =
        Arc::new(JsonQuestionBank::from_path(&args.bank_path).await?);

    let storage = match &args.ledger {
        LedgerTarget::Dir(dir) => Storage::new(questions, Arc::new(JsonFileStore::new(dir))),
        LedgerTarget::Sqlite(url) => {
            prepare_sqlite_file(url)?;
            Storage::sqlite(url, questions).await?
        }
    };
    Ok(storage)
}

//
// ─── TERMINAL LOOP ─────────────────────────────────────────────────────────────
//

struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `prompt` and read one trimmed line; `None` on end of input.
    async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_owned()))
    }
}

/// Resolve a typed response: a 1-based index picks from `choices`.
fn resolve_choice(input: &str, choices: &[String]) -> String {
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| choices.get(i))
        .cloned()
        .unwrap_or_else(|| input.to_owned())
}

fn print_question(session: &QuizSession) {
    let snapshot = session.snapshot();
    let Some(prompt) = snapshot.prompt else {
        return;
    };
    println!();
    println!(
        "[{}/{}] {}",
        snapshot.cursor + 1,
        snapshot.total,
        snapshot.subject.unwrap_or_default()
    );
    println!("{prompt}");
    for (i, choice) in snapshot.choices.iter().enumerate() {
        println!("  {}. {choice}", i + 1);
    }
}

/// Drive one session to completion. Returns `false` if input ended early.
async fn play(
    svc: &QuizLoopService,
    session: &mut QuizSession,
    term: &mut Terminal,
) -> Result<bool, Box<dyn std::error::Error>> {
    while session.phase().is_active() {
        print_question(session);

        loop {
            let Some(input) = term.ask("> ").await? else {
                return Ok(false);
            };
            let response = resolve_choice(&input, session.choices());
            match svc.submit_answer(session, &response) {
                Ok(_) => break,
                Err(SessionError::UnknownChoice(_)) => println!("Pick one of the listed choices."),
                Err(err) => return Err(err.into()),
            }
        }

        let snapshot = session.snapshot();
        if snapshot.is_correct == Some(true) {
            println!("Correct!");
        } else {
            println!(
                "Incorrect. The answer is: {}",
                snapshot.correct_answer.unwrap_or_default()
            );
        }

        let menu = ReviewQuality::ALL
            .iter()
            .map(|q| format!("{}={}", q.code(), q.label()))
            .collect::<Vec<_>>()
            .join("  ");
        loop {
            let Some(input) = term.ask(&format!("How hard was it? {menu}: ")).await? else {
                return Ok(false);
            };
            let Ok(code) = input.parse::<u8>() else {
                println!("Enter one of the listed numbers.");
                continue;
            };
            match svc.submit_review_code(session, code).await {
                Ok(submission) => {
                    if !submission.review.persisted {
                        println!("(review history could not be saved)");
                    }
                    break;
                }
                Err(SessionError::Review(_)) => println!("Enter one of the listed numbers."),
                Err(err) => return Err(err.into()),
            }
        }

        svc.advance(session)?;
    }
    Ok(session.phase() == SessionPhase::Completed)
}

async fn run_quiz(args: &Args, storage: &Storage) -> Result<(), Box<dyn std::error::Error>> {
    let svc = QuizLoopService::from_storage(Clock::default(), storage);
    let settings = args.settings()?;

    let breakdown = svc.due_breakdown(settings.subject()).await?;
    tracing::info!(
        due = breakdown.due,
        new = breakdown.new,
        scheduled = breakdown.scheduled,
        "review status"
    );

    let mut session = match svc.start(&settings).await {
        Ok(session) => session,
        Err(SessionError::Empty) => {
            println!("No questions available.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let mut term = Terminal::new();
    loop {
        if !play(&svc, &mut session, &mut term).await? {
            return Ok(());
        }

        let summary = session.summary()?;
        println!();
        println!(
            "Quiz complete: {}/{} correct ({:.0}%)",
            summary.correct(),
            summary.total(),
            summary.score_percent()
        );

        match term.ask("Restart with the same questions? [y/N] ").await? {
            Some(answer) if answer.eq_ignore_ascii_case("y") => {
                svc.restart(&mut session);
            }
            _ => return Ok(()),
        }
    }
}

async fn run_subjects(storage: &Storage) -> Result<(), Box<dyn std::error::Error>> {
    let svc = QuizLoopService::from_storage(Clock::default(), storage);
    for subject in svc.subjects().await? {
        let breakdown = svc.due_breakdown(Some(&subject)).await?;
        println!(
            "{subject}\t{} due\t{} new\t{} scheduled",
            breakdown.due, breakdown.new, breakdown.scheduled
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Quiz,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Quiz,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if argv.first().is_some_and(|a| !a.starts_with("--")) {
        argv.remove(0);
    }

    let parsed = Args::from_env()
        .and_then(|args| args.apply_flags(&mut argv.into_iter(), cmd))
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;

    let storage = open_storage(&parsed).await?;
    match cmd {
        Command::Quiz => run_quiz(&parsed, &storage).await,
        Command::Subjects => run_subjects(&storage).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::SettingsError;

    fn parse(cmd: Command, flags: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = flags.iter().map(|s| (*s).to_owned());
        Args::default().apply_flags(&mut iter, cmd)
    }

    #[test]
    fn defaults_apply_without_flags() {
        let args = parse(Command::Quiz, &[]).unwrap();
        assert_eq!(args, Args::default());
        assert_eq!(args.settings().unwrap(), QuizSettings::default());
    }

    #[test]
    fn quiz_flags_build_settings() {
        let args = parse(
            Command::Quiz,
            &["--subject", "Doors", "--count", "3", "--due", "--bank", "b.json"],
        )
        .unwrap();
        let settings = args.settings().unwrap();
        assert_eq!(settings.subject(), Some("Doors"));
        assert_eq!(settings.question_count(), 3);
        assert_eq!(settings.mode(), SelectionMode::Due);
        assert_eq!(args.bank_path, PathBuf::from("b.json"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse(Command::Quiz, &["--count", "0"]),
            Err(ArgsError::InvalidCount { .. })
        ));
        assert!(matches!(
            parse(Command::Quiz, &["--subject", "  "]),
            Err(ArgsError::BlankSubject)
        ));
        assert!(matches!(
            parse(Command::Quiz, &["--count"]),
            Err(ArgsError::MissingValue { flag: "--count" })
        ));
        assert!(matches!(
            parse(Command::Subjects, &["--due"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn invalid_settings_surface_as_domain_errors() {
        let args = Args {
            count: 0,
            ..Args::default()
        };
        assert!(matches!(
            args.settings(),
            Err(quiz_core::Error::Settings(SettingsError::InvalidQuestionCount))
        ));
    }

    #[test]
    fn ledger_prefix_selects_backend() {
        assert_eq!(
            LedgerTarget::parse("data").unwrap(),
            LedgerTarget::Dir(PathBuf::from("data"))
        );
        assert_eq!(
            LedgerTarget::parse("sqlite::memory:").unwrap(),
            LedgerTarget::Sqlite("sqlite::memory:".into())
        );
        let LedgerTarget::Sqlite(url) = LedgerTarget::parse("sqlite:quiz.db").unwrap() else {
            panic!("expected sqlite target");
        };
        assert!(url.starts_with("sqlite://") && url.ends_with("quiz.db"));
    }

    #[test]
    fn numeric_input_picks_choice() {
        let choices = vec!["A".to_owned(), "B".to_owned()];
        assert_eq!(resolve_choice("2", &choices), "B");
        assert_eq!(resolve_choice("0", &choices), "0");
        assert_eq!(resolve_choice("B", &choices), "B");
        assert_eq!(resolve_choice("7", &[]), "7");
    }
}
