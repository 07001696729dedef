use std::fmt;

use quiz_core::model::{QuizSettings, SettingsError, UserId};

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
const DEFAULT_USER_ID: u64 = 1;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { name: &'static str, raw: String },
    Settings(SettingsError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { name, raw } => write!(f, "invalid {name} value: {raw}"),
            ArgsError::Settings(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<SettingsError> for ArgsError {
    fn from(e: SettingsError) -> Self {
        ArgsError::Settings(e)
    }
}

/// Runtime configuration of the terminal driver.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub user_id: UserId,
    pub settings: QuizSettings,
    pub rust_log: String,
    pub show_help: bool,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ArgsError> {
    raw.trim().parse().map_err(|_| ArgsError::InvalidNumber {
        name,
        raw: raw.to_owned(),
    })
}

impl Config {
    /// Resolve configuration from environment values, overridden by flags.
    ///
    /// `env` looks up a variable by name; the binary passes `std::env::var`
    /// after loading `.env`.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown flags, missing or malformed values, or
    /// invalid quiz settings.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("QUIZ_DB_URL").map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut user_id = match env("QUIZ_USER_ID") {
            Some(raw) => parse_number("QUIZ_USER_ID", &raw)?,
            None => DEFAULT_USER_ID,
        };
        let mut question_count = match env("QUIZ_QUESTION_COUNT") {
            Some(raw) => parse_number("QUIZ_QUESTION_COUNT", &raw)?,
            None => QuizSettings::DEFAULT_QUESTION_COUNT,
        };
        let mut idle_timeout_secs = match env("QUIZ_IDLE_TIMEOUT_SECS") {
            Some(raw) => parse_number("QUIZ_IDLE_TIMEOUT_SECS", &raw)?,
            None => QuizSettings::DEFAULT_IDLE_TIMEOUT_SECS,
        };
        let rust_log = env("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.into());
        let mut show_help = false;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = parse_number("--user", &value)?;
                }
                "--count" => {
                    let value = require_value(&mut args, "--count")?;
                    question_count = parse_number("--count", &value)?;
                }
                "--idle-timeout" => {
                    let value = require_value(&mut args, "--idle-timeout")?;
                    idle_timeout_secs = parse_number("--idle-timeout", &value)?;
                }
                "--help" | "-h" => show_help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id: UserId::new(user_id),
            settings: QuizSettings::new(question_count, idle_timeout_secs)?,
            rust_log,
            show_help,
        })
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: {DEFAULT_DB_URL})");
    eprintln!("  --user <id>               User id to play as (default: {DEFAULT_USER_ID})");
    eprintln!(
        "  --count <n>               Questions per test (default: {})",
        QuizSettings::DEFAULT_QUESTION_COUNT
    );
    eprintln!(
        "  --idle-timeout <secs>     Expire idle tests, 0 disables (default: {})",
        QuizSettings::DEFAULT_IDLE_TIMEOUT_SECS
    );
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags, loaded from .env when present):");
    eprintln!("  QUIZ_DB_URL, QUIZ_USER_ID, QUIZ_QUESTION_COUNT, QUIZ_IDLE_TIMEOUT_SECS, RUST_LOG");
}

/// Turn a bare path or `sqlite:` path into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: String) -> String {
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

/// Make sure the database file and its directory exist before connecting.
///
/// # Errors
///
/// Returns an error for URLs without a file path or when the file cannot be
/// created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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
