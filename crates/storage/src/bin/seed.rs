use std::fmt;

use quiz_core::model::{Answer, Question, QuestionId, Topic, TopicId};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite://quiz.sqlite3?mode=rwc".into());

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://quiz.sqlite3?mode=rwc)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL");
}

fn options(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| (*l).to_owned()).collect()
}

fn sample_bank() -> Result<(Vec<Topic>, Vec<Question>), quiz_core::Error> {
    let rome = TopicId::new(1);
    let modern = TopicId::new(2);
    let topics = vec![
        Topic::new(rome, "Ancient Rome", Some("From the Republic to the fall".into()))?,
        Topic::new(modern, "Twentieth Century", None)?,
    ];

    let questions = vec![
        Question::new(
            QuestionId::new(1),
            rome,
            "Who was the first Roman emperor?",
            options(&["Julius Caesar", "Augustus", "Nero", "Trajan"]),
            Answer::Single(1),
        )?
        .with_explanation(Some("Octavian took the title Augustus in 27 BC.".into())),
        Question::new(
            QuestionId::new(2),
            rome,
            "Which of these were Roman provinces?",
            options(&["Gaul", "Persia", "Britannia", "Scythia"]),
            Answer::Multiple([0, 2].into_iter().collect()),
        )?
        .with_difficulty(2)?,
        Question::new(
            QuestionId::new(3),
            rome,
            "Put these events in chronological order.",
            options(&[
                "Sack of Rome by the Visigoths",
                "Founding of the Republic",
                "Assassination of Julius Caesar",
            ]),
            Answer::Sequence(vec![1, 2, 0]),
        )?
        .with_difficulty(3)?,
        Question::new(
            QuestionId::new(4),
            rome,
            "In which year did the Western Roman Empire fall?",
            options(&["410", "476", "527", "1453"]),
            Answer::Single(1),
        )?,
        Question::new(
            QuestionId::new(5),
            modern,
            "In which year did the First World War begin?",
            options(&["1905", "1914", "1918", "1939"]),
            Answer::Single(1),
        )?,
        Question::new(
            QuestionId::new(6),
            modern,
            "Order these events from earliest to latest.",
            options(&["Moon landing", "End of the Second World War", "Fall of the Berlin Wall"]),
            Answer::Sequence(vec![1, 0, 2]),
        )?
        .with_difficulty(2)?,
        Question::new(
            QuestionId::new(7),
            modern,
            "Which countries were founding members of the United Nations Security Council?",
            options(&["France", "Germany", "China", "Japan"]),
            Answer::Multiple([0, 2].into_iter().collect()),
        )?
        .with_media(Some("images/un_security_council.jpg".into())),
    ];

    Ok((topics, questions))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let (topics, questions) = sample_bank()?;

    for topic in &topics {
        storage.topics.upsert_topic(topic).await?;
    }
    for question in &questions {
        storage.questions.upsert_question(question).await?;
    }

    println!(
        "Seeded {} topics and {} questions into {}",
        topics.len(),
        questions.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
