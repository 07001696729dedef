use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::Answer;
use crate::model::ids::{QuestionId, TopicId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestResultError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("score ({score}) exceeds max score ({max})")]
    ScoreExceedsMax { score: u32, max: u32 },

    #[error("too many questions for a single result: {len}")]
    TooManyQuestions { len: usize },
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Aggregate correctness for one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub correct: u32,
    pub total: u32,
    /// Percentage of correct answers, rounded to one decimal place.
    pub percentage: f64,
}

impl ScoreSummary {
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.total > 0 && self.correct == self.total
    }
}

/// Scored outcome for a single question of a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    /// `None` when the question was skipped.
    pub answer: Option<Answer>,
    pub is_correct: bool,
}

//
// ─── TEST RESULT ───────────────────────────────────────────────────────────────
//

/// Durable record of one completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    user_id: UserId,
    topic_id: TopicId,
    score: u32,
    max_score: u32,
    percentage: f64,
    time_spent_secs: u64,
    completed_at: DateTime<Utc>,
}

impl TestResult {
    /// Build a result from a freshly computed score.
    ///
    /// # Errors
    ///
    /// Returns `TestResultError::InvalidTimeRange` if `completed_at` is before
    /// `started_at`, or `ScoreExceedsMax` for an inconsistent summary.
    pub fn from_score(
        user_id: UserId,
        topic_id: TopicId,
        score: &ScoreSummary,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, TestResultError> {
        if completed_at < started_at {
            return Err(TestResultError::InvalidTimeRange);
        }
        let time_spent_secs = u64::try_from((completed_at - started_at).num_seconds()).unwrap_or(0);
        Self::from_persisted(
            user_id,
            topic_id,
            score.correct,
            score.total,
            score.percentage,
            time_spent_secs,
            completed_at,
        )
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `TestResultError::ScoreExceedsMax` if the score is larger than the max.
    pub fn from_persisted(
        user_id: UserId,
        topic_id: TopicId,
        score: u32,
        max_score: u32,
        percentage: f64,
        time_spent_secs: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, TestResultError> {
        if score > max_score {
            return Err(TestResultError::ScoreExceedsMax {
                score,
                max: max_score,
            });
        }
        Ok(Self {
            user_id,
            topic_id,
            score,
            max_score,
            percentage,
            time_spent_secs,
            completed_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        self.time_spent_secs
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn from_score_records_elapsed_seconds() {
        let started = fixed_now();
        let completed = started + Duration::seconds(95);
        let score = ScoreSummary {
            correct: 7,
            total: 10,
            percentage: 70.0,
        };
        let result =
            TestResult::from_score(UserId::new(1), TopicId::new(2), &score, started, completed)
                .unwrap();
        assert_eq!(result.time_spent_secs(), 95);
        assert_eq!(result.score(), 7);
        assert_eq!(result.max_score(), 10);
        assert_eq!(result.completed_at(), completed);
    }

    #[test]
    fn rejects_reversed_time_range() {
        let now = fixed_now();
        let score = ScoreSummary {
            correct: 0,
            total: 1,
            percentage: 0.0,
        };
        let err = TestResult::from_score(
            UserId::new(1),
            TopicId::new(1),
            &score,
            now,
            now - Duration::seconds(1),
        )
        .unwrap_err();
        assert_eq!(err, TestResultError::InvalidTimeRange);
    }

    #[test]
    fn rejects_score_above_max() {
        let err = TestResult::from_persisted(
            UserId::new(1),
            TopicId::new(1),
            4,
            3,
            133.3,
            10,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, TestResultError::ScoreExceedsMax { score: 4, max: 3 });
    }
}
