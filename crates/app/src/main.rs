mod terminal;

use std::fmt;
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::QuizSettings;
use services::QuizLoopService;
use storage::repository::{QuestionFilter, QuestionRepository, Storage};
use storage::sample::sample_questions;
use tokio::io::BufReader;
use tokio::task::LocalSet;
use ui::{UiApp, build_app_context};

use crate::terminal::Terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { name: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { name, raw } => write!(f, "invalid {name} value: {raw}"),
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

struct TerminalApp {
    quiz_loop: Arc<QuizLoopService>,
    settings: QuizSettings,
    filter: QuestionFilter,
}

impl UiApp for TerminalApp {
    fn quiz_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz_loop)
    }

    fn settings(&self) -> QuizSettings {
        self.settings.clone()
    }

    fn default_filter(&self) -> QuestionFilter {
        self.filter.clone()
    }
}

struct Args {
    db_url: String,
    filter: QuestionFilter,
    shuffle: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- quiz [--db <sqlite_url>] [--category <tag>] [--shuffle]");
    eprintln!("  cargo run -p app -- seed [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_CATEGORY, QUIZ_TEXT_PREFIX_CHARS, QUIZ_SWIPE_SETTLE_MS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Seed,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "seed" => Some(Self::Seed),
            _ => None,
        }
    }
}

impl Args {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("QUIZ_DB_URL")
            .map_or_else(|| normalize_sqlite_url("sqlite:quiz.sqlite3".into()), normalize_sqlite_url);
        let mut filter = env("QUIZ_CATEGORY").map_or_else(QuestionFilter::all, QuestionFilter::category);
        let mut shuffle = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--category" => {
                    filter = QuestionFilter::category(require_value(args, "--category")?);
                }
                "--shuffle" => shuffle = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            filter,
            shuffle,
        })
    }
}

fn parse_env_number<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ArgsError> {
    env(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ArgsError::InvalidNumber { name, raw })
        })
        .transpose()
}

/// Settings from `QUIZ_*` overrides on top of the defaults.
fn load_settings(
    text_prefix_chars: Option<usize>,
    swipe_settle_ms: Option<u32>,
) -> Result<QuizSettings, quiz_core::error::Error> {
    let defaults = QuizSettings::default();
    let settle_ms = swipe_settle_ms
        .unwrap_or_else(|| u32::try_from(defaults.swipe_settle().as_millis()).unwrap_or(300));
    Ok(QuizSettings::new(
        text_prefix_chars.unwrap_or(defaults.text_match_prefix_chars()),
        defaults.swipe_commit_threshold(),
        defaults.swipe_exit_offset(),
        settle_ms,
    )?)
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
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

/// Write the sample bank. With `only_if_empty`, an existing bank is left alone.
async fn seed_sample_bank(
    questions: &dyn QuestionRepository,
    only_if_empty: bool,
) -> Result<usize, Box<dyn std::error::Error>> {
    if only_if_empty && questions.count_questions().await? > 0 {
        return Ok(0);
    }

    let mut written = 0;
    for draft in sample_questions() {
        let question = draft.validate()?;
        questions.upsert_question(&question).await?;
        written += 1;
    }
    log::info!("seeded {written} sample questions");
    Ok(written)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means `quiz`.
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
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
    let parsed = Args::parse(&mut argv.into_iter(), &env).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let settings = load_settings(
        parse_env_number(&env, "QUIZ_TEXT_PREFIX_CHARS")?,
        parse_env_number(&env, "QUIZ_SWIPE_SETTLE_MS")?,
    )?;

    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;

    match cmd {
        Command::Seed => {
            let written = seed_sample_bank(storage.questions.as_ref(), false).await?;
            println!("seeded {written} questions into {}", parsed.db_url);
            Ok(())
        }
        Command::Quiz => {
            seed_sample_bank(storage.questions.as_ref(), true).await?;

            let quiz_loop = QuizLoopService::new(
                Clock::system(),
                storage.source,
                storage.favorites,
                storage.answers,
            )
            .with_shuffle(parsed.shuffle);
            let app: Arc<dyn UiApp> = Arc::new(TerminalApp {
                quiz_loop: Arc::new(quiz_loop),
                settings,
                filter: parsed.filter,
            });

            let mut terminal = Terminal::new(build_app_context(&app));
            terminal.start().await;
            terminal::run_loop(
                &mut terminal,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await?;
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    // Swipe timers are `!Send` tasks bound to this thread.
    let local = LocalSet::new();
    if let Err(err) = local.run_until(run()).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
