use quiz_core::model::{Question, TopicId};

use super::SqliteRepository;
use super::mapping::{
    conn, correct_answer_to_json, id_i64, map_question_row, options_to_json,
};
use crate::repository::{QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn questions_by_topic(&self, topic_id: TopicId) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, topic_id, text, options, correct_answer, question_type,
                    difficulty, media_url, explanation
                FROM questions
                WHERE topic_id = ?1
                ORDER BY id ASC
            ",
        )
        .bind(id_i64("topic_id", topic_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let topic_id = id_i64("topic_id", question.topic_id().value())?;
        let topic_exists = sqlx::query("SELECT 1 FROM topics WHERE id = ?1")
            .bind(topic_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .is_some();
        if !topic_exists {
            return Err(StorageError::NotFound);
        }

        sqlx::query(
            r"
            INSERT INTO questions (
                id, topic_id, text, options, correct_answer, question_type,
                difficulty, media_url, explanation
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                topic_id = excluded.topic_id,
                text = excluded.text,
                options = excluded.options,
                correct_answer = excluded.correct_answer,
                question_type = excluded.question_type,
                difficulty = excluded.difficulty,
                media_url = excluded.media_url,
                explanation = excluded.explanation
            ",
        )
        .bind(id_i64("question_id", question.id().value())?)
        .bind(topic_id)
        .bind(question.prompt())
        .bind(options_to_json(question.options())?)
        .bind(correct_answer_to_json(question.correct())?)
        .bind(question.question_type().as_str())
        .bind(i64::from(question.difficulty()))
        .bind(question.media())
        .bind(question.explanation())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
