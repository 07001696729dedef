//! Presentation payloads emitted by the quiz services.
//!
//! These are not UI view-models: there is no markup and no localized text.
//! A transport renders them however it likes and feeds `QuestionAction`
//! identifiers back into the controller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use quiz_core::model::{
    Achievement, Answer, Question, QuestionId, QuestionOutcome, QuestionType, ScoreSummary,
    TopicId, UserId,
};

use super::session::QuizSession;

//
// ─── ACTIONS ───────────────────────────────────────────────────────────────────
//

/// A command a user can trigger from a displayed question.
///
/// Every action names the question it was rendered for, so a replayed
/// button from an earlier question is detected as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionAction {
    Answer { question_id: QuestionId, index: usize },
    Toggle { question_id: QuestionId, index: usize },
    Append { question_id: QuestionId, index: usize },
    Reset { question_id: QuestionId },
    Confirm { question_id: QuestionId },
    Skip { question_id: QuestionId },
}

impl QuestionAction {
    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        match self {
            QuestionAction::Answer { question_id, .. }
            | QuestionAction::Toggle { question_id, .. }
            | QuestionAction::Append { question_id, .. }
            | QuestionAction::Reset { question_id }
            | QuestionAction::Confirm { question_id }
            | QuestionAction::Skip { question_id } => *question_id,
        }
    }
}

impl fmt::Display for QuestionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionAction::Answer { question_id, index } => write!(f, "answer:{question_id}:{index}"),
            QuestionAction::Toggle { question_id, index } => write!(f, "toggle:{question_id}:{index}"),
            QuestionAction::Append { question_id, index } => write!(f, "append:{question_id}:{index}"),
            QuestionAction::Reset { question_id } => write!(f, "reset:{question_id}"),
            QuestionAction::Confirm { question_id } => write!(f, "confirm:{question_id}"),
            QuestionAction::Skip { question_id } => write!(f, "skip:{question_id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid action identifier: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for QuestionAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseActionError(s.to_owned());
        let mut parts = s.trim().split(':');
        let kind = parts.next().ok_or_else(err)?;
        let question_id: QuestionId = parts
            .next()
            .ok_or_else(err)?
            .parse()
            .map_err(|_| err())?;
        let index = parts
            .next()
            .map(|raw| raw.parse::<usize>().map_err(|_| err()))
            .transpose()?;
        if parts.next().is_some() {
            return Err(err());
        }

        match (kind, index) {
            ("answer", Some(index)) => Ok(QuestionAction::Answer { question_id, index }),
            ("toggle", Some(index)) => Ok(QuestionAction::Toggle { question_id, index }),
            ("append", Some(index)) => Ok(QuestionAction::Append { question_id, index }),
            ("reset", None) => Ok(QuestionAction::Reset { question_id }),
            ("confirm", None) => Ok(QuestionAction::Confirm { question_id }),
            ("skip", None) => Ok(QuestionAction::Skip { question_id }),
            _ => Err(err()),
        }
    }
}

//
// ─── QUESTION VIEW ─────────────────────────────────────────────────────────────
//

/// Extra instruction shown for accumulating question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionHint {
    ChooseAllThatApply,
    PutInOrder,
}

impl QuestionHint {
    #[must_use]
    pub fn for_type(question_type: QuestionType) -> Option<Self> {
        match question_type {
            QuestionType::Single => None,
            QuestionType::Multiple => Some(Self::ChooseAllThatApply),
            QuestionType::Sequence => Some(Self::PutInOrder),
        }
    }
}

/// One option as currently displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub index: usize,
    pub label: String,
    /// Selected in a multiple-choice draft, or already placed in a sequence.
    pub selected: bool,
    /// `None` for sequence options that are already placed.
    pub action: Option<QuestionAction>,
}

/// Display payload for the current question of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub question_id: QuestionId,
    pub topic_id: TopicId,
    /// 1-based position within the session.
    pub number: usize,
    pub total: usize,
    pub prompt: String,
    pub question_type: QuestionType,
    pub hint: Option<QuestionHint>,
    pub media: Option<String>,
    pub difficulty: u8,
    pub options: Vec<OptionView>,
    /// Option indices placed so far, for sequence questions.
    pub sequence: Vec<usize>,
    /// Non-option actions: reset, confirm and skip as applicable.
    pub actions: Vec<QuestionAction>,
}

impl QuestionView {
    /// Build the view for the session's current question, if any.
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Option<Self> {
        let question = session.current_question()?;
        Some(Self::build(
            question,
            session.answer(question.id()),
            session.current_index() + 1,
            session.total_questions(),
        ))
    }

    fn build(question: &Question, draft: Option<&Answer>, number: usize, total: usize) -> Self {
        let question_id = question.id();
        let question_type = question.question_type();
        let sequence = match draft {
            Some(Answer::Sequence(list)) => list.clone(),
            _ => Vec::new(),
        };

        let options = question
            .options()
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let selected = draft.is_some_and(|d| d.contains(index));
                let action = match question_type {
                    QuestionType::Single => Some(QuestionAction::Answer { question_id, index }),
                    QuestionType::Multiple => Some(QuestionAction::Toggle { question_id, index }),
                    QuestionType::Sequence => {
                        (!selected).then_some(QuestionAction::Append { question_id, index })
                    }
                };
                OptionView {
                    index,
                    label: label.clone(),
                    selected,
                    action,
                }
            })
            .collect();

        let mut actions = Vec::new();
        match question_type {
            QuestionType::Single => {}
            QuestionType::Multiple => actions.push(QuestionAction::Confirm { question_id }),
            QuestionType::Sequence => {
                if !sequence.is_empty() {
                    actions.push(QuestionAction::Reset { question_id });
                }
                if sequence.len() == question.option_count() {
                    actions.push(QuestionAction::Confirm { question_id });
                }
            }
        }
        actions.push(QuestionAction::Skip { question_id });

        Self {
            question_id,
            topic_id: question.topic_id(),
            number,
            total,
            prompt: question.prompt().to_owned(),
            question_type,
            hint: QuestionHint::for_type(question_type),
            media: question.media().map(str::to_owned),
            difficulty: question.difficulty(),
            options,
            sequence,
            actions,
        }
    }

    /// Labels of the placed sequence options, in placement order.
    #[must_use]
    pub fn sequence_labels(&self) -> Vec<&str> {
        self.sequence
            .iter()
            .filter_map(|i| self.options.get(*i).map(|o| o.label.as_str()))
            .collect()
    }
}

//
// ─── COMPLETION ────────────────────────────────────────────────────────────────
//

/// Coarse verdict on a completed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeBand {
    Excellent,
    Good,
    Fair,
    NeedsReview,
}

impl GradeBand {
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            Self::Excellent
        } else if percentage >= 70.0 {
            Self::Good
        } else if percentage >= 50.0 {
            Self::Fair
        } else {
            Self::NeedsReview
        }
    }
}

/// Per-question breakdown line of a completion report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionReport {
    pub question_id: QuestionId,
    pub prompt: String,
    pub answer: Option<Answer>,
    pub correct_answer: Answer,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

impl QuestionReport {
    #[must_use]
    pub fn from_outcome(question: &Question, outcome: &QuestionOutcome) -> Self {
        Self {
            question_id: question.id(),
            prompt: question.prompt().to_owned(),
            answer: outcome.answer.clone(),
            correct_answer: question.correct().clone(),
            is_correct: outcome.is_correct,
            explanation: question.explanation().map(str::to_owned),
        }
    }
}

/// Everything produced by completing a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReport {
    pub result_id: i64,
    pub user_id: UserId,
    /// Topic of the finished session, for starting it again.
    pub topic_id: TopicId,
    pub score: ScoreSummary,
    pub grade: GradeBand,
    pub time_spent_secs: u64,
    pub completed_at: DateTime<Utc>,
    pub questions: Vec<QuestionReport>,
    pub new_achievements: Vec<Achievement>,
}

/// Achievements held by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementSummary {
    pub achievements: Vec<Achievement>,
    pub total_points: u32,
}

impl AchievementSummary {
    #[must_use]
    pub fn new(achievements: Vec<Achievement>) -> Self {
        let total_points = achievements
            .iter()
            .fold(0_u32, |acc, a| acc.saturating_add(a.points()));
        Self {
            achievements,
            total_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;
    use std::collections::BTreeSet;

    fn question(correct: Answer) -> Question {
        Question::new(
            QuestionId::new(9),
            TopicId::new(1),
            "Prompt",
            vec!["a".into(), "b".into(), "c".into()],
            correct,
        )
        .unwrap()
        .with_media(Some("img.png".into()))
    }

    fn session(q: Question) -> QuizSession {
        QuizSession::new(UserId::new(1), TopicId::new(1), vec![q], fixed_now()).unwrap()
    }

    #[test]
    fn action_identifiers_parse_back() {
        let q = QuestionId::new(12);
        for action in [
            QuestionAction::Answer { question_id: q, index: 3 },
            QuestionAction::Toggle { question_id: q, index: 0 },
            QuestionAction::Append { question_id: q, index: 1 },
            QuestionAction::Reset { question_id: q },
            QuestionAction::Confirm { question_id: q },
            QuestionAction::Skip { question_id: q },
        ] {
            assert_eq!(action.to_string().parse::<QuestionAction>().unwrap(), action);
        }
        assert_eq!(
            "answer:12:3".parse::<QuestionAction>().unwrap(),
            QuestionAction::Answer { question_id: q, index: 3 }
        );
    }

    #[test]
    fn malformed_action_identifiers_are_rejected() {
        for raw in ["", "skip", "answer:12", "reset:12:1", "answer:x:1", "jump:12", "skip:1:2:3"] {
            assert!(raw.parse::<QuestionAction>().is_err(), "{raw}");
        }
    }

    #[test]
    fn single_view_offers_answer_per_option_and_skip() {
        let view = QuestionView::from_session(&session(question(Answer::Single(1)))).unwrap();
        assert_eq!(view.number, 1);
        assert_eq!(view.total, 1);
        assert_eq!(view.topic_id, TopicId::new(1));
        assert_eq!(view.hint, None);
        assert_eq!(view.media.as_deref(), Some("img.png"));
        assert_eq!(
            view.options[2].action,
            Some(QuestionAction::Answer {
                question_id: QuestionId::new(9),
                index: 2
            })
        );
        assert_eq!(
            view.actions,
            vec![QuestionAction::Skip {
                question_id: QuestionId::new(9)
            }]
        );
    }

    #[test]
    fn multiple_view_marks_selected_options() {
        let mut s = session(question(Answer::Multiple(BTreeSet::from([0, 1]))));
        s.toggle_option(QuestionId::new(9), 1).unwrap();
        let view = QuestionView::from_session(&s).unwrap();

        assert_eq!(view.hint, Some(QuestionHint::ChooseAllThatApply));
        let selected: Vec<bool> = view.options.iter().map(|o| o.selected).collect();
        assert_eq!(selected, vec![false, true, false]);
        assert!(view.actions.contains(&QuestionAction::Confirm {
            question_id: QuestionId::new(9)
        }));
    }

    #[test]
    fn sequence_view_shows_placed_and_remaining_options() {
        let q = QuestionId::new(9);
        let mut s = session(question(Answer::Sequence(vec![2, 0, 1])));
        s.append_choice(q, 2).unwrap();
        let view = QuestionView::from_session(&s).unwrap();

        assert_eq!(view.hint, Some(QuestionHint::PutInOrder));
        assert_eq!(view.sequence_labels(), vec!["c"]);
        assert_eq!(view.options[2].action, None);
        assert!(view.options[0].action.is_some());
        assert_eq!(
            view.actions,
            vec![QuestionAction::Reset { question_id: q }, QuestionAction::Skip { question_id: q }]
        );

        s.append_choice(q, 0).unwrap();
        s.append_choice(q, 1).unwrap();
        let view = QuestionView::from_session(&s).unwrap();
        assert!(view.actions.contains(&QuestionAction::Confirm { question_id: q }));
    }

    #[test]
    fn question_view_serializes_for_transports() {
        let view = QuestionView::from_session(&session(question(Answer::Single(1)))).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["question_type"], "single");
        assert_eq!(json["options"][1]["action"]["kind"], "answer");
        assert_eq!(json["options"][1]["action"]["index"], 1);
        assert_eq!(json["actions"][0]["kind"], "skip");
    }

    #[test]
    fn grade_bands_follow_thresholds() {
        assert_eq!(GradeBand::from_percentage(100.0), GradeBand::Excellent);
        assert_eq!(GradeBand::from_percentage(90.0), GradeBand::Excellent);
        assert_eq!(GradeBand::from_percentage(70.0), GradeBand::Good);
        assert_eq!(GradeBand::from_percentage(50.0), GradeBand::Fair);
        assert_eq!(GradeBand::from_percentage(49.9), GradeBand::NeedsReview);
    }

    #[test]
    fn achievement_summary_totals_points() {
        let a = Achievement::new(UserId::new(1), "A", "a", 10, None, fixed_now()).unwrap();
        let b = Achievement::new(UserId::new(1), "B", "b", 50, None, fixed_now()).unwrap();
        assert_eq!(AchievementSummary::new(vec![a, b]).total_points, 60);
    }
}
