use std::collections::HashSet;

use quiz_core::model::{Achievement, QuestionOutcome, TestResult, UserId};
use sqlx::SqliteConnection;

use super::SqliteRepository;
use super::mapping::{
    conn, id_i64, map_achievement_row, map_outcome_row, map_result_row, ser,
    user_answer_to_json,
};
use crate::repository::{CompletionRecord, ResultRepository, StorageError, TestResultRow};

fn write_err(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
        other => conn(other),
    }
}

async fn insert_result(db: &mut SqliteConnection, result: &TestResult) -> Result<i64, StorageError> {
    let res = sqlx::query(
        r"
            INSERT INTO test_results (
                user_id, topic_id, score, max_score, percentage, time_spent, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ",
    )
    .bind(id_i64("user_id", result.user_id().value())?)
    .bind(id_i64("topic_id", result.topic_id().value())?)
    .bind(i64::from(result.score()))
    .bind(i64::from(result.max_score()))
    .bind(result.percentage())
    .bind(id_i64("time_spent", result.time_spent_secs())?)
    .bind(result.completed_at())
    .execute(&mut *db)
    .await
    .map_err(write_err)?;

    Ok(res.last_insert_rowid())
}

async fn insert_outcomes(
    db: &mut SqliteConnection,
    result_id: i64,
    outcomes: &[QuestionOutcome],
) -> Result<(), StorageError> {
    for (position, outcome) in outcomes.iter().enumerate() {
        sqlx::query(
            r"
                INSERT INTO question_results (
                    test_result_id, position, question_id, is_correct, user_answer
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(result_id)
        .bind(i64::try_from(position).map_err(ser)?)
        .bind(id_i64("question_id", outcome.question_id.value())?)
        .bind(outcome.is_correct)
        .bind(user_answer_to_json(outcome.answer.as_ref())?)
        .execute(&mut *db)
        .await
        .map_err(write_err)?;
    }
    Ok(())
}

async fn insert_achievement(
    db: &mut SqliteConnection,
    achievement: &Achievement,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
            INSERT INTO achievements (
                user_id, name, description, badge_url, points, achieved_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
    )
    .bind(id_i64("user_id", achievement.user_id().value())?)
    .bind(achievement.name())
    .bind(achievement.description())
    .bind(achievement.badge())
    .bind(i64::from(achievement.points()))
    .bind(achievement.achieved_at())
    .execute(&mut *db)
    .await
    .map_err(write_err)?;

    Ok(())
}

#[async_trait::async_trait]
impl ResultRepository for SqliteRepository {
    async fn append_result(&self, result: &TestResult) -> Result<i64, StorageError> {
        let mut c = self.pool.acquire().await.map_err(conn)?;
        insert_result(&mut c, result).await
    }

    async fn completed_result_count(&self, user_id: UserId) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM test_results WHERE user_id = ?1")
            .bind(id_i64("user_id", user_id.value())?)
            .fetch_one(&self.pool)
            .await
            .map_err(conn)?;

        u64::try_from(count).map_err(ser)
    }

    async fn achievement_names(&self, user_id: UserId) -> Result<HashSet<String>, StorageError> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM achievements WHERE user_id = ?1")
                .bind(id_i64("user_id", user_id.value())?)
                .fetch_all(&self.pool)
                .await
                .map_err(conn)?;

        Ok(names.into_iter().collect())
    }

    async fn append_achievement(&self, achievement: &Achievement) -> Result<(), StorageError> {
        let mut c = self.pool.acquire().await.map_err(conn)?;
        insert_achievement(&mut c, achievement).await
    }

    async fn record_completion(&self, record: &CompletionRecord) -> Result<i64, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let result_id = insert_result(&mut tx, &record.result).await?;
        insert_outcomes(&mut tx, result_id, &record.outcomes).await?;
        for achievement in &record.achievements {
            insert_achievement(&mut tx, achievement).await?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(result_id)
    }

    async fn list_results(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<TestResultRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, topic_id, score, max_score, percentage,
                    time_spent, completed_at
                FROM test_results
                WHERE user_id = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_result_row).collect()
    }

    async fn outcomes_for_result(
        &self,
        result_id: i64,
    ) -> Result<Vec<QuestionOutcome>, StorageError> {
        let exists = sqlx::query("SELECT 1 FROM test_results WHERE id = ?1")
            .bind(result_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .is_some();
        if !exists {
            return Err(StorageError::NotFound);
        }

        let rows = sqlx::query(
            r"
                SELECT question_id, is_correct, user_answer
                FROM question_results
                WHERE test_result_id = ?1
                ORDER BY position ASC
            ",
        )
        .bind(result_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_outcome_row).collect()
    }

    async fn list_achievements(&self, user_id: UserId) -> Result<Vec<Achievement>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, name, description, badge_url, points, achieved_at
                FROM achievements
                WHERE user_id = ?1
                ORDER BY achieved_at ASC, id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_achievement_row).collect()
    }
}
