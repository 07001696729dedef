//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AchievementError, QuestionError, QuestionType, TestResultError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the quiz session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("topic has no questions")]
    EmptyTopic,
    #[error("no topics available")]
    NoTopics,
    #[error("no active session")]
    NoActiveSession,
    #[error("interaction targets a question that is not current")]
    StaleInteraction,
    #[error("option {index} is out of range for {options} options")]
    InvalidOption { index: usize, options: usize },
    #[error("current question expects a {expected} answer")]
    WrongQuestionType { expected: QuestionType },
    #[error("sequence has {picked} of {required} options")]
    IncompleteSequence { picked: usize, required: usize },
    #[error("option {index} is already in the sequence")]
    DuplicateChoice { index: usize },
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Result(#[from] TestResultError),
    #[error(transparent)]
    Achievement(#[from] AchievementError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QuizError {
    /// Errors a transport should drop without telling the user.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, QuizError::StaleInteraction)
    }

    /// Errors after which the session is kept and the action can be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, QuizError::Storage(_))
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stale_interactions_are_silent() {
        assert!(QuizError::StaleInteraction.is_silent());
        assert!(!QuizError::NoActiveSession.is_silent());
        assert!(!QuizError::EmptyTopic.is_silent());
    }

    #[test]
    fn storage_failures_are_retryable() {
        assert!(QuizError::Storage(StorageError::Conflict).is_retryable());
        assert!(!QuizError::InvalidOption { index: 4, options: 3 }.is_retryable());
    }
}
