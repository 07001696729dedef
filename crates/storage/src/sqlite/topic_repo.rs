use quiz_core::model::{Topic, TopicId};

use super::SqliteRepository;
use super::mapping::{conn, id_i64, map_topic_row};
use crate::repository::{StorageError, TopicRepository};

#[async_trait::async_trait]
impl TopicRepository for SqliteRepository {
    async fn list_topics(&self) -> Result<Vec<Topic>, StorageError> {
        let rows = sqlx::query("SELECT id, name, description FROM topics ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        rows.iter().map(map_topic_row).collect()
    }

    async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>, StorageError> {
        let row = sqlx::query("SELECT id, name, description FROM topics WHERE id = ?1")
            .bind(id_i64("topic_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_topic_row).transpose()
    }

    async fn upsert_topic(&self, topic: &Topic) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO topics (id, name, description)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description
            ",
        )
        .bind(id_i64("topic_id", topic.id().value())?)
        .bind(topic.name())
        .bind(topic.description())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
