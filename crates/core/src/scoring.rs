//! Per-question correctness and session aggregation.
//!
//! Scoring is a pure function of the question and the recorded answer.
//! There is no partial credit.

use crate::model::{Answer, Question, QuestionOutcome, ScoreSummary, TestResultError};

/// Returns whether `answer` is correct for `question`.
///
/// - `Single`: the index equals the correct index.
/// - `Multiple`: the selected set equals the correct set exactly.
/// - `Sequence`: the ordered list equals the correct order element for element.
///
/// A skipped question (`None`) or an answer of the wrong type is incorrect.
#[must_use]
pub fn score(question: &Question, answer: Option<&Answer>) -> bool {
    match (question.correct(), answer) {
        (Answer::Single(expected), Some(Answer::Single(given))) => expected == given,
        (Answer::Multiple(expected), Some(Answer::Multiple(given))) => expected == given,
        (Answer::Sequence(expected), Some(Answer::Sequence(given))) => expected == given,
        _ => false,
    }
}

/// Score a question and package the outcome for reporting and persistence.
#[must_use]
pub fn outcome(question: &Question, answer: Option<&Answer>) -> QuestionOutcome {
    QuestionOutcome {
        question_id: question.id(),
        answer: answer.cloned(),
        is_correct: score(question, answer),
    }
}

/// Aggregate question outcomes into a score summary.
///
/// The percentage is rounded to one decimal place and is `0.0` when there are
/// no outcomes.
///
/// # Errors
///
/// Returns `TestResultError::TooManyQuestions` if the count does not fit in `u32`.
pub fn aggregate(outcomes: &[QuestionOutcome]) -> Result<ScoreSummary, TestResultError> {
    let total = u32::try_from(outcomes.len())
        .map_err(|_| TestResultError::TooManyQuestions { len: outcomes.len() })?;
    let correct = outcomes.iter().fold(0_u32, |acc, o| {
        if o.is_correct { acc.saturating_add(1) } else { acc }
    });

    Ok(ScoreSummary {
        correct,
        total,
        percentage: percentage(correct, total),
    })
}

/// `correct / total * 100`, rounded to one decimal place with ties to even.
#[must_use]
pub fn percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = f64::from(correct) / f64::from(total) * 100.0;
    (raw * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionId, TopicId};

    fn question(correct: Answer, options: usize) -> Question {
        Question::new(
            QuestionId::new(1),
            TopicId::new(1),
            "Q",
            (0..options).map(|i| format!("opt {i}")).collect(),
            correct,
        )
        .unwrap()
    }

    fn set(items: &[usize]) -> Answer {
        Answer::Multiple(items.iter().copied().collect())
    }

    #[test]
    fn single_matches_only_correct_index() {
        let q = question(Answer::Single(2), 4);
        assert!(score(&q, Some(&Answer::Single(2))));
        assert!(!score(&q, Some(&Answer::Single(1))));
    }

    #[test]
    fn multiple_requires_exact_set() {
        let q = question(set(&[0, 2]), 3);
        assert!(score(&q, Some(&set(&[2, 0]))));
        assert!(!score(&q, Some(&set(&[0]))));
        assert!(!score(&q, Some(&set(&[0, 1, 2]))));
        assert!(!score(&q, Some(&set(&[]))));
    }

    #[test]
    fn sequence_requires_exact_order() {
        let q = question(Answer::Sequence(vec![2, 0, 1]), 3);
        assert!(score(&q, Some(&Answer::Sequence(vec![2, 0, 1]))));
        assert!(!score(&q, Some(&Answer::Sequence(vec![0, 2, 1]))));
        assert!(!score(&q, Some(&Answer::Sequence(vec![2, 1, 0]))));
        assert!(!score(&q, Some(&Answer::Sequence(vec![2, 0]))));
    }

    #[test]
    fn skipped_and_mismatched_answers_are_incorrect() {
        let q = question(Answer::Single(0), 2);
        assert!(!score(&q, None));
        assert!(!score(&q, Some(&set(&[0]))));
        assert!(!score(&q, Some(&Answer::Sequence(vec![0]))));
    }

    #[test]
    fn scoring_is_repeatable() {
        let q = question(set(&[1, 3]), 4);
        let answer = set(&[1, 3]);
        let first = score(&q, Some(&answer));
        for _ in 0..10 {
            assert_eq!(score(&q, Some(&answer)), first);
        }
    }

    #[test]
    fn seven_of_ten_is_seventy_percent() {
        let outcomes: Vec<_> = (0..10)
            .map(|i| QuestionOutcome {
                question_id: QuestionId::new(i),
                answer: None,
                is_correct: i < 7,
            })
            .collect();
        let summary = aggregate(&outcomes).unwrap();
        assert_eq!(summary.correct, 7);
        assert_eq!(summary.total, 10);
        assert!((summary.percentage - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_rounds_to_one_decimal() {
        assert!((percentage(1, 3) - 33.3).abs() < 1e-9);
        assert!((percentage(2, 3) - 66.7).abs() < 1e-9);
        assert!((percentage(3, 3) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn exact_halves_round_to_even() {
        assert!((percentage(1, 16) - 6.2).abs() < 1e-9);
        assert!((percentage(5, 16) - 31.2).abs() < 1e-9);
        assert!((percentage(3, 16) - 18.8).abs() < 1e-9);
    }

    #[test]
    fn empty_aggregate_is_zero() {
        let summary = aggregate(&[]).unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.percentage.abs() < f64::EPSILON);
        assert!(!summary.is_perfect());
    }
}
