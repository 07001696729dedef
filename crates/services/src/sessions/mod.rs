mod collector;
mod plan;
mod progress;
mod session;
mod store;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::QuizError;
pub use progress::SessionProgress;
pub use session::QuizSession;
pub use store::{InMemorySessionStore, SessionStore};
pub use view::{
    AchievementSummary, CompletionReport, GradeBand, OptionView, ParseActionError, QuestionAction,
    QuestionHint, QuestionReport, QuestionView,
};
pub use workflow::{QuizSessionService, QuizStep};
