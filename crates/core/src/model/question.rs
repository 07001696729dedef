use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::{Answer, QuestionType};
use crate::model::ids::{QuestionId, TopicId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must have at least one option")]
    NoOptions,

    #[error("option {index} is empty")]
    EmptyOption { index: usize },

    #[error("correct answer references option {index}, but only {options} options exist")]
    CorrectOutOfRange { index: usize, options: usize },

    #[error("multiple-choice question needs at least one correct option")]
    EmptyCorrectSet,

    #[error("sequence answer must order every option exactly once")]
    InvalidSequence,

    #[error("difficulty must be between 1 and 5, got {0}")]
    InvalidDifficulty(u8),
}

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated question from the bank.
///
/// The question type is carried by the tag of the correct answer, so a
/// question can never disagree with its own answer shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    topic_id: TopicId,
    prompt: String,
    options: Vec<String>,
    correct: Answer,
    explanation: Option<String>,
    media: Option<String>,
    difficulty: u8,
}

impl Question {
    /// Creates a question with validated options and correct answer.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or an option is blank, there are
    /// no options, or the correct answer does not fit the options.
    pub fn new(
        id: QuestionId,
        topic_id: TopicId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct: Answer,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if options.is_empty() {
            return Err(QuestionError::NoOptions);
        }
        if let Some(index) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        validate_correct(&correct, options.len())?;

        Ok(Self {
            id,
            topic_id,
            prompt,
            options,
            correct,
            explanation: None,
            media: None,
            difficulty: MIN_DIFFICULTY,
        })
    }

    #[must_use]
    pub fn with_explanation(mut self, explanation: Option<String>) -> Self {
        self.explanation = explanation.filter(|e| !e.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_media(mut self, media: Option<String>) -> Self {
        self.media = media.filter(|m| !m.trim().is_empty());
        self
    }

    /// Sets the difficulty level.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidDifficulty` outside `1..=5`.
    pub fn with_difficulty(mut self, difficulty: u8) -> Result<Self, QuestionError> {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&difficulty) {
            return Err(QuestionError::InvalidDifficulty(difficulty));
        }
        self.difficulty = difficulty;
        Ok(self)
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn correct(&self) -> &Answer {
        &self.correct
    }

    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        self.correct.question_type()
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn media(&self) -> Option<&str> {
        self.media.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }
}

fn validate_correct(correct: &Answer, options: usize) -> Result<(), QuestionError> {
    if let Some(index) = correct.max_index().filter(|i| *i >= options) {
        return Err(QuestionError::CorrectOutOfRange { index, options });
    }
    match correct {
        Answer::Single(_) => Ok(()),
        Answer::Multiple(set) if set.is_empty() => Err(QuestionError::EmptyCorrectSet),
        Answer::Multiple(_) => Ok(()),
        Answer::Sequence(order) => {
            let mut sorted = order.clone();
            sorted.sort_unstable();
            if sorted.into_iter().eq(0..options) {
                Ok(())
            } else {
                Err(QuestionError::InvalidSequence)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Option {i}")).collect()
    }

    #[test]
    fn type_follows_correct_answer() {
        let q = Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "Pick two",
            opts(3),
            Answer::Multiple([0, 2].into_iter().collect()),
        )
        .unwrap();
        assert_eq!(q.question_type(), QuestionType::Multiple);
        assert_eq!(q.option_count(), 3);
        assert_eq!(q.difficulty(), 1);
    }

    #[test]
    fn rejects_out_of_range_single() {
        let err = Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "Q",
            opts(2),
            Answer::Single(2),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::CorrectOutOfRange { index: 2, options: 2 });
    }

    #[test]
    fn rejects_partial_sequence() {
        let err = Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "Order",
            opts(3),
            Answer::Sequence(vec![2, 0]),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::InvalidSequence);

        let err = Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "Order",
            opts(3),
            Answer::Sequence(vec![2, 0, 0]),
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::InvalidSequence);
    }

    #[test]
    fn rejects_blank_prompt_and_options() {
        assert_eq!(
            Question::new(QuestionId::new(1), TopicId::new(1), "  ", opts(2), Answer::Single(0))
                .unwrap_err(),
            QuestionError::EmptyPrompt
        );
        assert_eq!(
            Question::new(QuestionId::new(1), TopicId::new(1), "Q", vec![], Answer::Single(0))
                .unwrap_err(),
            QuestionError::NoOptions
        );
        assert_eq!(
            Question::new(
                QuestionId::new(1),
                TopicId::new(1),
                "Q",
                vec!["a".into(), " ".into()],
                Answer::Single(0)
            )
            .unwrap_err(),
            QuestionError::EmptyOption { index: 1 }
        );
    }

    #[test]
    fn difficulty_is_bounded() {
        let q = Question::new(QuestionId::new(1), TopicId::new(1), "Q", opts(2), Answer::Single(0))
            .unwrap();
        assert_eq!(
            q.clone().with_difficulty(6).unwrap_err(),
            QuestionError::InvalidDifficulty(6)
        );
        assert_eq!(q.with_difficulty(4).unwrap().difficulty(), 4);
    }

    #[test]
    fn blank_explanation_is_dropped() {
        let q = Question::new(QuestionId::new(1), TopicId::new(1), "Q", opts(2), Answer::Single(0))
            .unwrap()
            .with_explanation(Some("   ".into()))
            .with_media(Some("maps/rome.png".into()));
        assert_eq!(q.explanation(), None);
        assert_eq!(q.media(), Some("maps/rome.png"));
    }
}
