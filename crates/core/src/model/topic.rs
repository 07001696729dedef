use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::TopicId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopicError {
    #[error("topic name cannot be empty")]
    EmptyName,
}

/// A named subject area grouping questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    id: TopicId,
    name: String,
    description: Option<String>,
}

impl Topic {
    /// Creates a topic.
    ///
    /// # Errors
    ///
    /// Returns `TopicError::EmptyName` if the name is blank.
    pub fn new(
        id: TopicId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, TopicError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(TopicError::EmptyName);
        }
        Ok(Self {
            id,
            name: trimmed.to_owned(),
            description: description.filter(|d| !d.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn id(&self) -> TopicId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed() {
        let topic = Topic::new(TopicId::new(3), "  Ancient Rome ", None).unwrap();
        assert_eq!(topic.name(), "Ancient Rome");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            Topic::new(TopicId::new(1), "\t", None).unwrap_err(),
            TopicError::EmptyName
        );
    }
}
