use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question count must be > 0")]
    InvalidQuestionCount,
}

/// Tunables for quiz sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    question_count: usize,
    idle_timeout_secs: u64,
}

impl QuizSettings {
    pub const DEFAULT_QUESTION_COUNT: usize = 10;
    pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 3_600;

    /// Creates custom settings. An idle timeout of zero disables expiry.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidQuestionCount` if `question_count` is zero.
    pub fn new(question_count: usize, idle_timeout_secs: u64) -> Result<Self, SettingsError> {
        if question_count == 0 {
            return Err(SettingsError::InvalidQuestionCount);
        }
        Ok(Self {
            question_count,
            idle_timeout_secs,
        })
    }

    /// Number of questions drawn when the caller does not ask for a count.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    #[must_use]
    pub fn idle_timeout_secs(&self) -> u64 {
        self.idle_timeout_secs
    }

    /// How long a session may sit untouched before it is discarded.
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_secs == 0 {
            return None;
        }
        i64::try_from(self.idle_timeout_secs)
            .ok()
            .map(Duration::seconds)
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            question_count: Self::DEFAULT_QUESTION_COUNT,
            idle_timeout_secs: Self::DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}
