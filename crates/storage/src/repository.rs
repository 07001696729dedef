use async_trait::async_trait;
use quiz_core::model::{
    Achievement, Question, QuestionId, QuestionOutcome, TestResult, Topic, TopicId, UserId,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Everything produced by completing one session.
///
/// Persisted as a unit: either all of it commits or none of it does.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRecord {
    pub result: TestResult,
    pub outcomes: Vec<QuestionOutcome>,
    pub achievements: Vec<Achievement>,
}

/// A persisted test result along with its storage id.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResultRow {
    pub id: i64,
    pub result: TestResult,
}

impl TestResultRow {
    #[must_use]
    pub fn new(id: i64, result: TestResult) -> Self {
        Self { id, result }
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// All topics. Order carries no meaning.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError>;

    /// Fetch a topic by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError>;

    /// Persist or update a topic.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the topic cannot be stored.
    async fn upsert_topic(&self, topic: &Topic) -> Result<(), StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// All questions of a topic ordered by id. An unknown or empty topic
    /// yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn questions_by_topic(&self, topic_id: TopicId) -> Result<Vec<Question>, StorageError>;

    /// Persist or update a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question's topic does not exist.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Append a single test result without per-question rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn append_result(&self, result: &TestResult) -> Result<i64, StorageError>;

    /// Number of results recorded for the user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn completed_result_count(&self, user_id: UserId) -> Result<u64, StorageError>;

    /// Names of achievements already granted to the user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn achievement_names(&self, user_id: UserId) -> Result<HashSet<String>, StorageError>;

    /// Append one achievement.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the user already holds that name.
    async fn append_achievement(&self, achievement: &Achievement) -> Result<(), StorageError>;

    /// Atomically persist a result, its per-question outcomes and any newly
    /// granted achievements. Returns the result id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if an achievement name is already held;
    /// nothing is written in that case.
    async fn record_completion(&self, record: &CompletionRecord) -> Result<i64, StorageError>;

    /// Most recent results for the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_results(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<TestResultRow>, StorageError>;

    /// Per-question outcomes stored for a result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the result does not exist.
    async fn outcomes_for_result(
        &self,
        result_id: i64,
    ) -> Result<Vec<QuestionOutcome>, StorageError>;

    /// Achievements held by the user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_achievements(&self, user_id: UserId) -> Result<Vec<Achievement>, StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    topics: BTreeMap<TopicId, Topic>,
    questions: BTreeMap<(TopicId, QuestionId), Question>,
    results: Vec<TestResultRow>,
    outcomes: BTreeMap<i64, Vec<QuestionOutcome>>,
    achievements: Vec<Achievement>,
}

impl MemoryState {
    fn next_result_id(&self) -> i64 {
        self.results.last().map_or(1, |row| row.id + 1)
    }

    fn holds(&self, achievement: &Achievement) -> bool {
        self.achievements
            .iter()
            .any(|a| a.user_id() == achievement.user_id() && a.name() == achievement.name())
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// All collections share one lock, so `record_completion` is atomic.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl TopicRepository for InMemoryRepository {
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        Ok(self.lock()?.topics.values().cloned().collect())
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError> {
        Ok(self.lock()?.topics.get(&id).cloned())
    }

    async fn upsert_topic(&self, topic: &Topic) -> Result<(), StorageError> {
        self.lock()?.topics.insert(topic.id(), topic.clone());
        Ok(())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn questions_by_topic(&self, topic_id: TopicId) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .questions
            .range((topic_id, QuestionId::new(0))..=(topic_id, QuestionId::new(u64::MAX)))
            .map(|(_, q)| q.clone())
            .collect())
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.topics.contains_key(&question.topic_id()) {
            return Err(StorageError::NotFound);
        }
        guard.questions.retain(|(_, id), _| *id != question.id());
        guard
            .questions
            .insert((question.topic_id(), question.id()), question.clone());
        Ok(())
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &TestResult) -> Result<i64, StorageError> {
        let mut guard = self.lock()?;
        let id = guard.next_result_id();
        guard.results.push(TestResultRow::new(id, result.clone()));
        Ok(id)
    }

    async fn completed_result_count(&self, user_id: UserId) -> Result<u64, StorageError> {
        let guard = self.lock()?;
        let count = guard
            .results
            .iter()
            .filter(|row| row.result.user_id() == user_id)
            .count();
        u64::try_from(count).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn achievement_names(&self, user_id: UserId) -> Result<HashSet<String>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .achievements
            .iter()
            .filter(|a| a.user_id() == user_id)
            .map(|a| a.name().to_owned())
            .collect())
    }

    async fn append_achievement(&self, achievement: &Achievement) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if guard.holds(achievement) {
            return Err(StorageError::Conflict);
        }
        guard.achievements.push(achievement.clone());
        Ok(())
    }

    async fn record_completion(&self, record: &CompletionRecord) -> Result<i64, StorageError> {
        let mut guard = self.lock()?;
        let mut names = HashSet::new();
        for achievement in &record.achievements {
            if guard.holds(achievement) || !names.insert(achievement.name()) {
                return Err(StorageError::Conflict);
            }
        }

        let id = guard.next_result_id();
        guard
            .results
            .push(TestResultRow::new(id, record.result.clone()));
        guard.outcomes.insert(id, record.outcomes.clone());
        guard
            .achievements
            .extend(record.achievements.iter().cloned());
        Ok(id)
    }

    async fn list_results(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<TestResultRow>, StorageError> {
        let guard = self.lock()?;
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(guard
            .results
            .iter()
            .rev()
            .filter(|row| row.result.user_id() == user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn outcomes_for_result(
        &self,
        result_id: i64,
    ) -> Result<Vec<QuestionOutcome>, StorageError> {
        let guard = self.lock()?;
        if !guard.results.iter().any(|row| row.id == result_id) {
            return Err(StorageError::NotFound);
        }
        Ok(guard.outcomes.get(&result_id).cloned().unwrap_or_default())
    }

    async fn list_achievements(&self, user_id: UserId) -> Result<Vec<Achievement>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .achievements
            .iter()
            .filter(|a| a.user_id() == user_id)
            .cloned()
            .collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub topics: Arc<dyn TopicRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Wire every repository to the same backing implementation.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: TopicRepository + QuestionRepository + ResultRepository + Clone + 'static,
    {
        let topics: Arc<dyn TopicRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self {
            topics,
            questions,
            results,
        }
    }
}
