//! Line-oriented command surface and plain-text rendering.

use quiz_core::model::{Achievement, Answer, Topic, TopicId};
use services::sessions::{OptionView, QuestionHint, QuestionReport};
use services::{AchievementSummary, CompletionReport, GradeBand, QuestionAction, QuestionView};
use storage::repository::TestResultRow;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Topics,
    Start { topic_id: TopicId, count: Option<usize> },
    Random { count: Option<usize> },
    Repeat,
    Show,
    /// 1-based option number of the current question.
    Pick(usize),
    Confirm,
    Reset,
    Skip,
    Finish,
    Achievements,
    History,
    /// A raw action identifier such as `answer:3:1`.
    Action(QuestionAction),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Show);
        };
        let count = |raw: Option<&str>| -> Result<Option<usize>, String> {
            raw.map(|r| r.parse().map_err(|_| format!("not a number: {r}")))
                .transpose()
        };

        match head {
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "topics" => Ok(Command::Topics),
            "start" => {
                let raw = words.next().ok_or("usage: start <topic> [count]")?;
                let topic_id = raw.parse().map_err(|_| format!("not a topic id: {raw}"))?;
                Ok(Command::Start {
                    topic_id,
                    count: count(words.next())?,
                })
            }
            "random" => Ok(Command::Random {
                count: count(words.next())?,
            }),
            "repeat" => Ok(Command::Repeat),
            "show" => Ok(Command::Show),
            "c" | "confirm" => Ok(Command::Confirm),
            "r" | "reset" => Ok(Command::Reset),
            "s" | "skip" => Ok(Command::Skip),
            "finish" => Ok(Command::Finish),
            "achievements" => Ok(Command::Achievements),
            "history" => Ok(Command::History),
            other => {
                if let Ok(number) = other.parse::<usize>() {
                    return Ok(Command::Pick(number));
                }
                other
                    .parse::<QuestionAction>()
                    .map(Command::Action)
                    .map_err(|_| format!("unknown command: {other} (type `help`)"))
            }
        }
    }

    /// Resolve a shorthand against the question on screen.
    pub fn to_action(&self, view: &QuestionView) -> Option<QuestionAction> {
        let question_id = view.question_id;
        let offered = |action: QuestionAction| view.actions.contains(&action).then_some(action);
        match self {
            Command::Pick(number) => number
                .checked_sub(1)
                .and_then(|i| view.options.get(i))
                .and_then(|o| o.action),
            Command::Confirm => offered(QuestionAction::Confirm { question_id }),
            Command::Reset => offered(QuestionAction::Reset { question_id }),
            Command::Skip => Some(QuestionAction::Skip { question_id }),
            Command::Action(action) => Some(*action),
            _ => None,
        }
    }
}

pub const HELP: &str = "\
Commands:
  topics                 list topics
  start <topic> [count]  start a test on a topic
  random [count]         start a test on a random topic
  repeat                 start the last finished topic again
  <n>                    pick option n of the current question
  c / r / s              confirm, reset sequence, skip
  finish                 end the test now
  achievements, history  show your rewards and recent results
  quit";

pub fn render_topics(topics: &[Topic]) -> String {
    if topics.is_empty() {
        return "No topics yet. Run the seed binary first.".into();
    }
    topics
        .iter()
        .map(|t| match t.description() {
            Some(d) => format!("  [{}] {} - {d}", t.id(), t.name()),
            None => format!("  [{}] {}", t.id(), t.name()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn option_line(option: &OptionView, view: &QuestionView) -> String {
    let marker = match (view.hint, option.selected) {
        (Some(QuestionHint::ChooseAllThatApply), true) => "[x] ",
        (Some(QuestionHint::ChooseAllThatApply), false) => "[ ] ",
        (Some(QuestionHint::PutInOrder), true) => "(placed) ",
        _ => "",
    };
    format!("  {}. {marker}{}", option.index + 1, option.label)
}

pub fn render_question(view: &QuestionView) -> String {
    let mut out = vec![format!("Question {}/{}", view.number, view.total)];
    out.push(view.prompt.clone());
    match view.hint {
        Some(QuestionHint::ChooseAllThatApply) => out.push("(choose all that apply)".into()),
        Some(QuestionHint::PutInOrder) => out.push("(put the options in order)".into()),
        None => {}
    }
    if let Some(media) = &view.media {
        out.push(format!("Media: {media}"));
    }
    out.extend(view.options.iter().map(|o| option_line(o, view)));
    if view.hint == Some(QuestionHint::PutInOrder) && !view.sequence.is_empty() {
        out.push(format!("Your order: {}", view.sequence_labels().join(" -> ")));
    }

    let extra: Vec<&str> = view
        .actions
        .iter()
        .map(|a| match a {
            QuestionAction::Confirm { .. } => "c = confirm",
            QuestionAction::Reset { .. } => "r = reset",
            _ => "s = skip",
        })
        .collect();
    out.push(extra.join(", "));
    out.join("\n")
}

fn answer_text(answer: &Answer) -> String {
    answer
        .indices()
        .iter()
        .map(|i| (i + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn question_line(number: usize, report: &QuestionReport) -> String {
    let verdict = if report.is_correct { "correct" } else { "wrong" };
    let given = report
        .answer
        .as_ref()
        .map_or_else(|| "skipped".to_owned(), answer_text);
    let mut line = format!(
        "  {number}. {} - {verdict} (yours: {given}; expected: {})",
        report.prompt,
        answer_text(&report.correct_answer)
    );
    if let Some(explanation) = &report.explanation {
        line.push_str(&format!("\n     {explanation}"));
    }
    line
}

fn achievement_line(a: &Achievement) -> String {
    match a.badge() {
        Some(badge) => format!("  {} (+{}) - {} [{badge}]", a.name(), a.points(), a.description()),
        None => format!("  {} (+{}) - {}", a.name(), a.points(), a.description()),
    }
}

pub fn render_report(report: &CompletionReport) -> String {
    let grade = match report.grade {
        GradeBand::Excellent => "Excellent!",
        GradeBand::Good => "Good job.",
        GradeBand::Fair => "Not bad.",
        GradeBand::NeedsReview => "Worth another review.",
    };
    let mut out = vec![
        format!(
            "Test finished: {}/{} correct ({:.1}%) in {}s. {grade}",
            report.score.correct, report.score.total, report.score.percentage, report.time_spent_secs
        ),
    ];
    out.extend(
        report
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| question_line(i + 1, q)),
    );
    if !report.new_achievements.is_empty() {
        out.push("New achievements:".into());
        out.extend(report.new_achievements.iter().map(achievement_line));
    }
    out.push("Type `repeat` to try this topic again.".into());
    out.join("\n")
}

pub fn render_achievements(summary: &AchievementSummary) -> String {
    if summary.achievements.is_empty() {
        return "No achievements yet.".into();
    }
    let mut out: Vec<String> = summary.achievements.iter().map(achievement_line).collect();
    out.push(format!("Total points: {}", summary.total_points));
    out.join("\n")
}

pub fn render_history(rows: &[TestResultRow]) -> String {
    if rows.is_empty() {
        return "No finished tests yet.".into();
    }
    rows.iter()
        .map(|row| {
            let r = &row.result;
            format!(
                "  {} topic {}: {}/{} ({:.1}%)",
                r.completed_at().format("%Y-%m-%d %H:%M"),
                r.topic_id(),
                r.score(),
                r.max_score(),
                r.percentage()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("").unwrap(), Command::Show);
        assert_eq!(
            Command::parse("start 2 5").unwrap(),
            Command::Start {
                topic_id: TopicId::new(2),
                count: Some(5)
            }
        );
        assert_eq!(
            Command::parse("random").unwrap(),
            Command::Random { count: None }
        );
        assert_eq!(Command::parse(" 3 ").unwrap(), Command::Pick(3));
        assert_eq!(
            Command::parse("skip:4").unwrap(),
            Command::Action(QuestionAction::Skip {
                question_id: QuestionId::new(4)
            })
        );
        assert!(Command::parse("start").is_err());
        assert!(Command::parse("start x").is_err());
        assert!(Command::parse("dance").is_err());
    }

    fn view() -> QuestionView {
        let q = QuestionId::new(8);
        QuestionView {
            question_id: q,
            topic_id: TopicId::new(1),
            number: 1,
            total: 2,
            prompt: "Pick".into(),
            question_type: quiz_core::model::QuestionType::Multiple,
            hint: Some(QuestionHint::ChooseAllThatApply),
            media: None,
            difficulty: 1,
            options: vec![
                OptionView {
                    index: 0,
                    label: "a".into(),
                    selected: true,
                    action: Some(QuestionAction::Toggle { question_id: q, index: 0 }),
                },
                OptionView {
                    index: 1,
                    label: "b".into(),
                    selected: false,
                    action: Some(QuestionAction::Toggle { question_id: q, index: 1 }),
                },
            ],
            sequence: Vec::new(),
            actions: vec![
                QuestionAction::Confirm { question_id: q },
                QuestionAction::Skip { question_id: q },
            ],
        }
    }

    #[test]
    fn shorthands_resolve_against_current_view() {
        let v = view();
        let q = v.question_id;
        assert_eq!(
            Command::Pick(2).to_action(&v),
            Some(QuestionAction::Toggle { question_id: q, index: 1 })
        );
        assert_eq!(Command::Pick(0).to_action(&v), None);
        assert_eq!(Command::Pick(3).to_action(&v), None);
        assert_eq!(
            Command::Confirm.to_action(&v),
            Some(QuestionAction::Confirm { question_id: q })
        );
        assert_eq!(Command::Reset.to_action(&v), None);
    }

    #[test]
    fn question_rendering_marks_selection() {
        let text = render_question(&view());
        assert!(text.contains("Question 1/2"));
        assert!(text.contains("1. [x] a"));
        assert!(text.contains("2. [ ] b"));
        assert!(text.contains("c = confirm, s = skip"));
    }
}
