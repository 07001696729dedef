#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    CompletionRecord, InMemoryRepository, QuestionRepository, ResultRepository, Storage,
    StorageError, TestResultRow, TopicRepository,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
