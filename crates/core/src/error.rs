use thiserror::Error;

use crate::model::{
    AchievementError, QuestionError, SettingsError, TestResultError, TopicError,
};

/// Any validation failure raised by the domain model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    TestResult(#[from] TestResultError),
    #[error(transparent)]
    Achievement(#[from] AchievementError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
