use std::sync::Arc;

use quiz_core::model::{Question, Topic, TopicId};
use storage::repository::{QuestionRepository, StorageError, TopicRepository};

/// Read-only access to topics and their questions.
#[derive(Clone)]
pub struct QuestionBank {
    topics: Arc<dyn TopicRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(topics: Arc<dyn TopicRepository>, questions: Arc<dyn QuestionRepository>) -> Self {
        Self { topics, questions }
    }

    /// All topics.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    pub async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        self.topics.list_topics().await
    }

    /// Fetch a single topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    pub async fn topic(&self, topic_id: TopicId) -> Result<Option<Topic>, StorageError> {
        self.topics.get_topic(topic_id).await
    }

    /// All questions of a topic; empty when the topic has none.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    pub async fn list_questions(&self, topic_id: TopicId) -> Result<Vec<Question>, StorageError> {
        self.questions.questions_by_topic(topic_id).await
    }
}
