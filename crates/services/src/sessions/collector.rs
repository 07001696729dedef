//! Answer collection for the current question of a session.
//!
//! `Single` answers are final as soon as they are given. `Multiple` and
//! `Sequence` answers accumulate in a draft until confirmed. Every operation
//! names the question it targets and is rejected with
//! `QuizError::StaleInteraction` when that question is not current, leaving
//! the session untouched.

use std::collections::BTreeSet;

use quiz_core::model::{Answer, Question, QuestionId, QuestionType};

use super::session::QuizSession;
use crate::error::QuizError;

fn check_type(question: &Question, expected: QuestionType) -> Result<(), QuizError> {
    if question.question_type() == expected {
        Ok(())
    } else {
        Err(QuizError::WrongQuestionType {
            expected: question.question_type(),
        })
    }
}

fn check_index(question: &Question, index: usize) -> Result<(), QuizError> {
    if index < question.option_count() {
        Ok(())
    } else {
        Err(QuizError::InvalidOption {
            index,
            options: question.option_count(),
        })
    }
}

/// Validate a complete answer against the question it is submitted for.
///
/// # Errors
///
/// Returns `WrongQuestionType`, `InvalidOption`, `DuplicateChoice` or
/// `IncompleteSequence` when the answer cannot be accepted as final.
pub(crate) fn validate_final(question: &Question, answer: &Answer) -> Result<(), QuizError> {
    check_type(question, answer.question_type())?;
    if let Some(max) = answer.max_index() {
        check_index(question, max)?;
    }

    if let Answer::Sequence(list) = answer {
        let mut seen = BTreeSet::new();
        if let Some(dup) = list.iter().find(|index| !seen.insert(**index)) {
            return Err(QuizError::DuplicateChoice { index: *dup });
        }
        if list.len() != question.option_count() {
            return Err(QuizError::IncompleteSequence {
                picked: list.len(),
                required: question.option_count(),
            });
        }
    }
    Ok(())
}

impl QuizSession {
    /// Add `index` to a multiple-choice draft, or remove it if present.
    ///
    /// Returns the draft after the change.
    ///
    /// # Errors
    ///
    /// Returns `StaleInteraction`, `WrongQuestionType` or `InvalidOption`.
    pub fn toggle_option(
        &mut self,
        question_id: QuestionId,
        index: usize,
    ) -> Result<Answer, QuizError> {
        let question = self.expect_current(question_id)?;
        check_type(question, QuestionType::Multiple)?;
        check_index(question, index)?;

        match self.draft_mut(question_id) {
            Some(Answer::Multiple(set)) => {
                if !set.remove(&index) {
                    set.insert(index);
                }
            }
            _ => self.set_draft(question_id, Answer::Multiple(BTreeSet::from([index]))),
        }
        Ok(self.current_draft(question_id))
    }

    /// Append `index` to a sequence draft.
    ///
    /// # Errors
    ///
    /// Returns `StaleInteraction`, `WrongQuestionType`, `InvalidOption`, or
    /// `DuplicateChoice` if the option is already in the sequence.
    pub fn append_choice(
        &mut self,
        question_id: QuestionId,
        index: usize,
    ) -> Result<Answer, QuizError> {
        let question = self.expect_current(question_id)?;
        check_type(question, QuestionType::Sequence)?;
        check_index(question, index)?;

        match self.draft_mut(question_id) {
            Some(Answer::Sequence(list)) => {
                if list.contains(&index) {
                    return Err(QuizError::DuplicateChoice { index });
                }
                list.push(index);
            }
            _ => self.set_draft(question_id, Answer::Sequence(vec![index])),
        }
        Ok(self.current_draft(question_id))
    }

    /// Clear a sequence draft back to empty.
    ///
    /// # Errors
    ///
    /// Returns `StaleInteraction` or `WrongQuestionType`.
    pub fn reset_sequence(&mut self, question_id: QuestionId) -> Result<(), QuizError> {
        let question = self.expect_current(question_id)?;
        check_type(question, QuestionType::Sequence)?;
        self.clear_draft(question_id);
        Ok(())
    }

    /// The accumulated draft, ready to be submitted as final.
    ///
    /// A multiple-choice draft with nothing selected confirms as the empty
    /// set. The draft is left in place so a rejected confirm loses nothing.
    ///
    /// # Errors
    ///
    /// Returns `StaleInteraction`, `WrongQuestionType` for single-choice
    /// questions, or `IncompleteSequence` until every option is placed.
    pub fn confirmable_answer(&self, question_id: QuestionId) -> Result<Answer, QuizError> {
        let question = self.expect_current(question_id)?;
        if question.question_type() == QuestionType::Single {
            return Err(QuizError::WrongQuestionType {
                expected: QuestionType::Single,
            });
        }
        let answer = self.current_draft(question_id);
        validate_final(question, &answer)?;
        Ok(answer)
    }

    fn current_draft(&self, question_id: QuestionId) -> Answer {
        let fallback = self
            .current_question()
            .and_then(|q| Answer::empty(q.question_type()))
            .unwrap_or_else(|| Answer::Multiple(BTreeSet::new()));
        self.answer(question_id).cloned().unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{TopicId, UserId};
    use quiz_core::time::fixed_now;

    fn question(id: u64, correct: Answer) -> Question {
        Question::new(
            QuestionId::new(id),
            TopicId::new(1),
            format!("Q{id}"),
            vec!["a".into(), "b".into(), "c".into()],
            correct,
        )
        .unwrap()
    }

    fn session(questions: Vec<Question>) -> QuizSession {
        QuizSession::new(UserId::new(1), TopicId::new(1), questions, fixed_now()).unwrap()
    }

    #[test]
    fn toggle_adds_then_removes() {
        let q = QuestionId::new(1);
        let mut s = session(vec![question(1, Answer::Multiple(BTreeSet::from([0, 2])))]);

        s.toggle_option(q, 0).unwrap();
        s.toggle_option(q, 2).unwrap();
        let draft = s.toggle_option(q, 1).unwrap();
        assert_eq!(draft, Answer::Multiple(BTreeSet::from([0, 1, 2])));

        let draft = s.toggle_option(q, 1).unwrap();
        assert_eq!(draft, Answer::Multiple(BTreeSet::from([0, 2])));
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.confirmable_answer(q).unwrap(), draft);
    }

    #[test]
    fn empty_multiple_draft_confirms_as_empty_set() {
        let q = QuestionId::new(1);
        let s = session(vec![question(1, Answer::Multiple(BTreeSet::from([0])))]);
        assert_eq!(
            s.confirmable_answer(q).unwrap(),
            Answer::Multiple(BTreeSet::new())
        );
    }

    #[test]
    fn sequence_rejects_duplicates_and_requires_full_length() {
        let q = QuestionId::new(1);
        let mut s = session(vec![question(1, Answer::Sequence(vec![2, 0, 1]))]);

        s.append_choice(q, 2).unwrap();
        let err = s.append_choice(q, 2).unwrap_err();
        assert!(matches!(err, QuizError::DuplicateChoice { index: 2 }));

        s.append_choice(q, 0).unwrap();
        let err = s.confirmable_answer(q).unwrap_err();
        assert!(matches!(
            err,
            QuizError::IncompleteSequence {
                picked: 2,
                required: 3
            }
        ));
        assert_eq!(s.answer(q), Some(&Answer::Sequence(vec![2, 0])));

        s.append_choice(q, 1).unwrap();
        assert_eq!(s.confirmable_answer(q).unwrap(), Answer::Sequence(vec![2, 0, 1]));
    }

    #[test]
    fn reset_clears_sequence() {
        let q = QuestionId::new(1);
        let mut s = session(vec![question(1, Answer::Sequence(vec![0, 1, 2]))]);
        s.append_choice(q, 1).unwrap();
        s.reset_sequence(q).unwrap();
        assert!(s.answer(q).is_none());
        assert_eq!(s.append_choice(q, 0).unwrap(), Answer::Sequence(vec![0]));
    }

    #[test]
    fn out_of_range_and_wrong_type_are_rejected() {
        let q = QuestionId::new(1);
        let mut s = session(vec![question(1, Answer::Multiple(BTreeSet::from([0])))]);

        let err = s.toggle_option(q, 3).unwrap_err();
        assert!(matches!(err, QuizError::InvalidOption { index: 3, options: 3 }));
        let err = s.append_choice(q, 0).unwrap_err();
        assert!(matches!(
            err,
            QuizError::WrongQuestionType {
                expected: QuestionType::Multiple
            }
        ));
        assert!(s.answer(q).is_none());
    }

    #[test]
    fn stale_question_is_rejected_without_change() {
        let mut s = session(vec![
            question(1, Answer::Multiple(BTreeSet::from([0]))),
            question(2, Answer::Multiple(BTreeSet::from([1]))),
        ]);
        let err = s.toggle_option(QuestionId::new(2), 0).unwrap_err();
        assert!(err.is_silent());
        assert!(s.answer(QuestionId::new(2)).is_none());
    }

    #[test]
    fn final_answers_are_validated() {
        let q = question(1, Answer::Sequence(vec![0, 1, 2]));
        assert!(validate_final(&q, &Answer::Sequence(vec![1, 0, 2])).is_ok());
        assert!(matches!(
            validate_final(&q, &Answer::Sequence(vec![1, 1, 2])),
            Err(QuizError::DuplicateChoice { index: 1 })
        ));
        assert!(matches!(
            validate_final(&q, &Answer::Single(0)),
            Err(QuizError::WrongQuestionType {
                expected: QuestionType::Sequence
            })
        ));
        assert!(matches!(
            validate_final(&q, &Answer::Sequence(vec![0, 1, 5])),
            Err(QuizError::InvalidOption { index: 5, options: 3 })
        ));
    }
}
