use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{TopicId, UserId};
use services::{AppServices, Clock, QuizError, QuizSessionService, QuizStep};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod terminal;

use config::{Config, prepare_sqlite_file, print_usage};
use terminal::{
    Command, HELP, render_achievements, render_history, render_question, render_report,
    render_topics,
};

const HISTORY_LIMIT: u32 = 10;
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Drives one user's quiz from terminal input.
struct Driver {
    user_id: UserId,
    quiz: Arc<QuizSessionService>,
    services: AppServices,
    last_topic: Option<TopicId>,
}

impl Driver {
    fn report_error(&self, error: &QuizError) {
        if error.is_silent() {
            return;
        }
        match error {
            QuizError::NoActiveSession => {
                println!("No test in progress. Type `topics` and `start <topic>`.");
            }
            QuizError::EmptyTopic => println!("That topic has no questions yet."),
            QuizError::NoTopics => println!("There are no topics yet."),
            e if e.is_retryable() => {
                println!("Could not save right now. Type `finish` to try again later.");
            }
            other => println!("{other}"),
        }
    }

    fn show_step(&mut self, step: QuizStep) {
        match step {
            QuizStep::Next(view) | QuizStep::Updated(view) => println!("{}", render_question(&view)),
            QuizStep::Completed(report) => {
                self.last_topic = Some(report.topic_id);
                println!("{}", render_report(&report));
            }
        }
    }

    async fn show_current(&self) -> Result<(), QuizError> {
        match self.quiz.current_question(self.user_id).await? {
            Some(view) => println!("{}", render_question(&view)),
            None => println!("All questions answered. Type `finish` to see your result."),
        }
        Ok(())
    }

    /// Returns `false` when the user asked to quit.
    async fn handle(&mut self, command: Command) -> Result<bool, QuizError> {
        let user = self.user_id;
        match command {
            Command::Quit => return Ok(false),
            Command::Help => println!("{HELP}"),
            Command::Topics => {
                let topics = self.services.question_bank().list_topics().await?;
                println!("{}", render_topics(&topics));
            }
            Command::Start { topic_id, count } => {
                let view = self.quiz.start(user, topic_id, count).await?;
                self.last_topic = Some(view.topic_id);
                println!("{}", render_question(&view));
            }
            Command::Random { count } => {
                let view = self.quiz.start_random(user, count).await?;
                self.last_topic = Some(view.topic_id);
                println!("{}", render_question(&view));
            }
            Command::Repeat => match self.last_topic {
                Some(topic_id) => {
                    let view = self.quiz.start(user, topic_id, None).await?;
                    println!("{}", render_question(&view));
                }
                None => println!("Nothing to repeat yet."),
            },
            Command::Show => self.show_current().await?,
            Command::Finish => {
                let report = self.quiz.complete(user).await?;
                self.last_topic = Some(report.topic_id);
                println!("{}", render_report(&report));
            }
            Command::Achievements => {
                let summary = self.quiz.achievements(user).await?;
                println!("{}", render_achievements(&summary));
            }
            Command::History => {
                let rows = self.quiz.recent_results(user, HISTORY_LIMIT).await?;
                println!("{}", render_history(&rows));
            }
            shorthand @ (Command::Pick(_)
            | Command::Confirm
            | Command::Reset
            | Command::Skip
            | Command::Action(_)) => {
                let Some(view) = self.quiz.current_question(user).await? else {
                    println!("All questions answered. Type `finish` to see your result.");
                    return Ok(true);
                };
                match shorthand.to_action(&view) {
                    Some(action) => {
                        let step = self.quiz.apply(user, action).await?;
                        self.show_step(step);
                    }
                    None => println!("That choice is not available for this question."),
                }
            }
        }
        Ok(true)
    }
}

fn spawn_idle_sweeper(quiz: Arc<QuizSessionService>) {
    if quiz.settings().idle_timeout().is_none() {
        return;
    }
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(e) = quiz.sweep_idle().await {
                tracing::warn!(error = %e, "idle session sweep failed");
            }
        }
    });
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = Config::parse_from(std::env::args().skip(1), |key| std::env::var(key).ok())
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;
    if config.show_help {
        print_usage();
        return Ok(());
    }

    init_tracing(&config.rust_log);

    // Open + migrate SQLite at startup so core/services stay free of I/O setup.
    prepare_sqlite_file(&config.db_url)?;
    let services = AppServices::new_sqlite(&config.db_url, Clock::default(), config.settings).await?;
    tracing::info!(db_url = %config.db_url, user_id = %config.user_id, "quiz ready");

    let quiz = services.quiz();
    spawn_idle_sweeper(Arc::clone(&quiz));

    let mut driver = Driver {
        user_id: config.user_id,
        quiz,
        services,
        last_topic: None,
    };

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        match driver.handle(command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => driver.report_error(&e),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Answer, Question, QuestionId, QuizSettings, Topic};
    use quiz_core::time::fixed_clock;
    use services::InMemorySessionStore;
    use storage::repository::Storage;

    async fn driver_with_single_topic(topic_id: TopicId) -> Driver {
        let storage = Storage::in_memory();
        storage
            .topics
            .upsert_topic(&Topic::new(topic_id, "Geography", None).unwrap())
            .await
            .unwrap();
        let question = Question::new(
            QuestionId::new(1),
            topic_id,
            "Capital of Italy?",
            vec!["Rome".into(), "Milan".into()],
            Answer::Single(0),
        )
        .unwrap();
        storage.questions.upsert_question(&question).await.unwrap();

        let services = AppServices::from_storage(
            &storage,
            Arc::new(InMemorySessionStore::new()),
            fixed_clock(),
            QuizSettings::default(),
        );
        Driver {
            user_id: UserId::new(1),
            quiz: services.quiz(),
            services,
            last_topic: Some(TopicId::new(99)),
        }
    }

    #[tokio::test]
    async fn random_start_becomes_the_repeat_topic() {
        let topic = TopicId::new(2);
        let mut driver = driver_with_single_topic(topic).await;

        assert!(driver.handle(Command::Random { count: None }).await.unwrap());
        assert_eq!(driver.last_topic, Some(topic));

        assert!(driver.handle(Command::Repeat).await.unwrap());
        let view = driver.quiz.current_question(driver.user_id).await.unwrap().unwrap();
        assert_eq!(view.topic_id, topic);
    }
}
