use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::fmt;

use quiz_core::model::{Answer, Question, QuestionId, QuestionOutcome, TopicId, UserId};
use quiz_core::{scoring, time};

use super::progress::SessionProgress;
use crate::error::QuizError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's in-progress quiz attempt.
///
/// Holds a snapshot of the sampled questions and steps through them in order.
/// `answers` keeps the final answer of every question already passed and the
/// accumulating draft of the current one. Skipped questions have no entry.
#[derive(Clone, PartialEq)]
pub struct QuizSession {
    user_id: UserId,
    topic_id: TopicId,
    questions: Vec<Question>,
    current: usize,
    answers: BTreeMap<QuestionId, Answer>,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl QuizSession {
    /// Build a session over already-sampled questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTopic` if `questions` is empty.
    pub fn new(
        user_id: UserId,
        topic_id: TopicId,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptyTopic);
        }

        Ok(Self {
            user_id,
            topic_id,
            questions,
            current: 0,
            answers: BTreeMap::new(),
            started_at,
            last_activity: started_at,
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
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.questions.len().saturating_sub(self.current)
    }

    /// All questions have been answered or skipped.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.current >= self.questions.len()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total_questions(),
            answered: self.current.min(self.questions.len()),
            remaining: self.remaining(),
            is_complete: self.is_exhausted(),
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    /// Recorded answer (or current draft) for a question.
    #[must_use]
    pub fn answer(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    /// True when no activity happened for longer than `timeout`.
    #[must_use]
    pub fn is_idle(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        time::is_expired(self.last_activity, now, timeout)
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    /// The current question if `question_id` names it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StaleInteraction` for any other id, including when
    /// the session is exhausted.
    pub(crate) fn expect_current(&self, question_id: QuestionId) -> Result<&Question, QuizError> {
        match self.current_question() {
            Some(question) if question.id() == question_id => Ok(question),
            _ => Err(QuizError::StaleInteraction),
        }
    }

    pub(crate) fn draft_mut(&mut self, question_id: QuestionId) -> Option<&mut Answer> {
        self.answers.get_mut(&question_id)
    }

    pub(crate) fn set_draft(&mut self, question_id: QuestionId, answer: Answer) {
        self.answers.insert(question_id, answer);
    }

    pub(crate) fn clear_draft(&mut self, question_id: QuestionId) {
        self.answers.remove(&question_id);
    }

    /// Record the final answer for the current question (or none, for a
    /// skip) and move to the next one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StaleInteraction` if `question_id` is not current.
    pub(crate) fn advance(
        &mut self,
        question_id: QuestionId,
        answer: Option<Answer>,
    ) -> Result<(), QuizError> {
        self.expect_current(question_id)?;
        match answer {
            Some(answer) => self.set_draft(question_id, answer),
            None => self.clear_draft(question_id),
        }
        self.current += 1;
        Ok(())
    }

    /// Score every question. Unreached questions count as skipped, and a
    /// draft left on the current question is ignored.
    #[must_use]
    pub fn outcomes(&self) -> Vec<QuestionOutcome> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let answer = if index < self.current {
                    self.answers.get(&question.id())
                } else {
                    None
                };
                scoring::outcome(question, answer)
            })
            .collect()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("user_id", &self.user_id)
            .field("topic_id", &self.topic_id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .field("last_activity", &self.last_activity)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
