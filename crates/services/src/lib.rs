#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod question_bank;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, QuizError};
pub use question_bank::QuestionBank;
pub use sessions::{
    AchievementSummary, CompletionReport, GradeBand, InMemorySessionStore, QuestionAction,
    QuestionView, QuizSession, QuizSessionService, QuizStep, SessionProgress, SessionStore,
};
