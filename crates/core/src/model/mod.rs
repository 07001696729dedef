mod achievement;
mod answer;
mod ids;
mod question;
mod result;
mod settings;
mod topic;

pub use ids::{ParseIdError, QuestionId, TopicId, UserId};

pub use achievement::{Achievement, AchievementError};
pub use answer::{Answer, ParseQuestionTypeError, QuestionType};
pub use question::{MAX_DIFFICULTY, MIN_DIFFICULTY, Question, QuestionError};
pub use result::{QuestionOutcome, ScoreSummary, TestResult, TestResultError};
pub use settings::{QuizSettings, SettingsError};
pub use topic::{Topic, TopicError};
