use quiz_core::model::{
    Achievement, Answer, Question, QuestionId, QuestionOutcome, QuestionType, TestResult, Topic,
    TopicId, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{StorageError, TestResultRow};

pub(super) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(super) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(super) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// Correct answers are stored as a JSON index list next to the type column.
pub(super) fn correct_answer_to_json(answer: &Answer) -> Result<String, StorageError> {
    serde_json::to_string(&answer.indices()).map_err(ser)
}

fn correct_answer_from_json(question_type: QuestionType, raw: &str) -> Result<Answer, StorageError> {
    let indices: Vec<usize> = serde_json::from_str(raw).map_err(ser)?;
    Answer::from_indices(question_type, indices).ok_or_else(|| {
        StorageError::Serialization(format!("invalid {question_type} answer: {raw}"))
    })
}

/// User answers are self-describing (tagged JSON) so they decode without the
/// question at hand.
pub(super) fn user_answer_to_json(answer: Option<&Answer>) -> Result<Option<String>, StorageError> {
    answer.map(|a| serde_json::to_string(a).map_err(ser)).transpose()
}

fn user_answer_from_json(raw: Option<String>) -> Result<Option<Answer>, StorageError> {
    raw.map(|s| serde_json::from_str(&s).map_err(ser)).transpose()
}

pub(super) fn options_to_json(options: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(options).map_err(ser)
}

//
// ─── ROWS ──────────────────────────────────────────────────────────────────────
//

pub(super) fn map_topic_row(row: &SqliteRow) -> Result<Topic, StorageError> {
    let id = TopicId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?);
    let name: String = row.try_get("name").map_err(ser)?;
    let description: Option<String> = row.try_get("description").map_err(ser)?;
    Topic::new(id, name, description).map_err(ser)
}

pub(super) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let id = QuestionId::new(i64_to_u64("id", row.try_get("id").map_err(ser)?)?);
    let topic_id = TopicId::new(i64_to_u64("topic_id", row.try_get("topic_id").map_err(ser)?)?);
    let text: String = row.try_get("text").map_err(ser)?;
    let options_raw: String = row.try_get("options").map_err(ser)?;
    let options: Vec<String> = serde_json::from_str(&options_raw).map_err(ser)?;
    let question_type: QuestionType = row
        .try_get::<String, _>("question_type")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let correct_raw: String = row.try_get("correct_answer").map_err(ser)?;
    let correct = correct_answer_from_json(question_type, &correct_raw)?;
    let difficulty = u8::try_from(row.try_get::<i64, _>("difficulty").map_err(ser)?)
        .map_err(ser)?;
    let media: Option<String> = row.try_get("media_url").map_err(ser)?;
    let explanation: Option<String> = row.try_get("explanation").map_err(ser)?;

    Question::new(id, topic_id, text, options, correct)
        .and_then(|q| q.with_difficulty(difficulty))
        .map(|q| q.with_media(media).with_explanation(explanation))
        .map_err(ser)
}

pub(super) fn map_result_row(row: &SqliteRow) -> Result<TestResultRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let user_id = UserId::new(i64_to_u64("user_id", row.try_get("user_id").map_err(ser)?)?);
    let topic_id = TopicId::new(i64_to_u64("topic_id", row.try_get("topic_id").map_err(ser)?)?);
    let score = u32_from_i64("score", row.try_get("score").map_err(ser)?)?;
    let max_score = u32_from_i64("max_score", row.try_get("max_score").map_err(ser)?)?;
    let percentage: f64 = row.try_get("percentage").map_err(ser)?;
    let time_spent = i64_to_u64("time_spent", row.try_get("time_spent").map_err(ser)?)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;

    let result = TestResult::from_persisted(
        user_id,
        topic_id,
        score,
        max_score,
        percentage,
        time_spent,
        completed_at,
    )
    .map_err(ser)?;
    Ok(TestResultRow::new(id, result))
}

pub(super) fn map_outcome_row(row: &SqliteRow) -> Result<QuestionOutcome, StorageError> {
    let question_id =
        QuestionId::new(i64_to_u64("question_id", row.try_get("question_id").map_err(ser)?)?);
    let is_correct: bool = row.try_get("is_correct").map_err(ser)?;
    let answer = user_answer_from_json(row.try_get("user_answer").map_err(ser)?)?;
    Ok(QuestionOutcome {
        question_id,
        answer,
        is_correct,
    })
}

pub(super) fn map_achievement_row(row: &SqliteRow) -> Result<Achievement, StorageError> {
    let user_id = UserId::new(i64_to_u64("user_id", row.try_get("user_id").map_err(ser)?)?);
    let name: String = row.try_get("name").map_err(ser)?;
    let description: String = row.try_get("description").map_err(ser)?;
    let badge: Option<String> = row.try_get("badge_url").map_err(ser)?;
    let points = u32_from_i64("points", row.try_get("points").map_err(ser)?)?;
    let achieved_at = row.try_get("achieved_at").map_err(ser)?;
    Achievement::new(user_id, name, description, points, badge, achieved_at).map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_answer_round_trips_through_index_list() {
        let answer = Answer::Multiple([2, 0].into_iter().collect());
        let json = correct_answer_to_json(&answer).unwrap();
        assert_eq!(json, "[0,2]");
        assert_eq!(
            correct_answer_from_json(QuestionType::Multiple, &json).unwrap(),
            answer
        );
    }

    #[test]
    fn single_answer_with_many_indices_is_rejected() {
        let err = correct_answer_from_json(QuestionType::Single, "[0,1]").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn skipped_user_answer_is_null() {
        assert_eq!(user_answer_to_json(None).unwrap(), None);
        assert_eq!(user_answer_from_json(None).unwrap(), None);
    }
}
