use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── QUESTION TYPE ─────────────────────────────────────────────────────────────
//

/// How a question is answered and scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Exactly one option is correct.
    Single,
    /// A set of options is correct; the selection must match it exactly.
    Multiple,
    /// Every option is placed in a single correct order.
    Sequence,
}

impl QuestionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Sequence => "sequence",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown question type: {0}")]
pub struct ParseQuestionTypeError(pub String);

impl FromStr for QuestionType {
    type Err = ParseQuestionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single" => Ok(Self::Single),
            "multiple" => Ok(Self::Multiple),
            "sequence" => Ok(Self::Sequence),
            other => Err(ParseQuestionTypeError(other.to_owned())),
        }
    }
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

/// An answer value, tagged by the question type it belongs to.
///
/// The same shape describes both a user's (possibly partial) answer and a
/// question's correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Single(usize),
    Multiple(BTreeSet<usize>),
    Sequence(Vec<usize>),
}

impl Answer {
    /// An empty draft for accumulating question types.
    ///
    /// Returns `None` for `Single`, which has no accumulation phase.
    #[must_use]
    pub fn empty(question_type: QuestionType) -> Option<Self> {
        match question_type {
            QuestionType::Single => None,
            QuestionType::Multiple => Some(Self::Multiple(BTreeSet::new())),
            QuestionType::Sequence => Some(Self::Sequence(Vec::new())),
        }
    }

    /// Rebuild an answer from its type tag and flat list of option indices.
    ///
    /// Used by storage layers that persist answers as an index list.
    /// `Single` requires exactly one index.
    #[must_use]
    pub fn from_indices(question_type: QuestionType, indices: Vec<usize>) -> Option<Self> {
        match question_type {
            QuestionType::Single => match indices.as_slice() {
                [only] => Some(Self::Single(*only)),
                _ => None,
            },
            QuestionType::Multiple => Some(Self::Multiple(indices.into_iter().collect())),
            QuestionType::Sequence => Some(Self::Sequence(indices)),
        }
    }

    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        match self {
            Answer::Single(_) => QuestionType::Single,
            Answer::Multiple(_) => QuestionType::Multiple,
            Answer::Sequence(_) => QuestionType::Sequence,
        }
    }

    /// Option indices in answer order (ascending for `Multiple`).
    #[must_use]
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Answer::Single(index) => vec![*index],
            Answer::Multiple(set) => set.iter().copied().collect(),
            Answer::Sequence(list) => list.clone(),
        }
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        match self {
            Answer::Single(selected) => *selected == index,
            Answer::Multiple(set) => set.contains(&index),
            Answer::Sequence(list) => list.contains(&index),
        }
    }

    /// Largest option index referenced, if any.
    #[must_use]
    pub fn max_index(&self) -> Option<usize> {
        match self {
            Answer::Single(index) => Some(*index),
            Answer::Multiple(set) => set.last().copied(),
            Answer::Sequence(list) => list.iter().max().copied(),
        }
    }
}
