use std::sync::Arc;

use quiz_core::model::QuizSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::question_bank::QuestionBank;
use crate::sessions::{InMemorySessionStore, QuizSessionService, SessionStore};

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    question_bank: QuestionBank,
    quiz: Arc<QuizSessionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and an in-process session store.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(
            &storage,
            Arc::new(InMemorySessionStore::new()),
            clock,
            settings,
        ))
    }

    /// Build services over an existing storage and session store.
    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        sessions: Arc<dyn SessionStore>,
        clock: Clock,
        settings: QuizSettings,
    ) -> Self {
        let question_bank =
            QuestionBank::new(Arc::clone(&storage.topics), Arc::clone(&storage.questions));
        let quiz = Arc::new(QuizSessionService::new(
            clock,
            settings,
            question_bank.clone(),
            Arc::clone(&storage.results),
            sessions,
        ));
        Self {
            question_bank,
            quiz,
        }
    }

    #[must_use]
    pub fn question_bank(&self) -> &QuestionBank {
        &self.question_bank
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizSessionService> {
        Arc::clone(&self.quiz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_clock;

    #[tokio::test]
    async fn in_memory_services_start_empty() {
        let services = AppServices::from_storage(
            &Storage::in_memory(),
            Arc::new(InMemorySessionStore::new()),
            fixed_clock(),
            QuizSettings::default(),
        );
        assert!(services.question_bank().list_topics().await.unwrap().is_empty());
        assert_eq!(services.quiz().settings().question_count(), 10);
    }
}
