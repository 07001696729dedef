use std::collections::HashSet;
use std::sync::Arc;

use quiz_core::achievements::{AchievementContext, AchievementRules};
use quiz_core::model::{Answer, Question, QuestionId, QuizSettings, TestResult, TopicId, UserId};
use quiz_core::scoring;
use storage::repository::{CompletionRecord, ResultRepository, TestResultRow};

use super::collector::validate_final;
use super::plan::{choose_topic, sample_questions};
use super::progress::SessionProgress;
use super::session::QuizSession;
use super::store::SessionStore;
use super::view::{
    AchievementSummary, CompletionReport, GradeBand, QuestionAction, QuestionReport, QuestionView,
};
use crate::Clock;
use crate::error::QuizError;
use crate::question_bank::QuestionBank;

/// Result of an action that may move the session forward.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizStep {
    /// The session continues; this is the question to show next.
    Next(QuestionView),
    /// The draft changed; the same question should be shown again.
    Updated(QuestionView),
    /// The last question was passed and the session was finalised.
    Completed(Box<CompletionReport>),
}

/// Session lifecycle controller.
///
/// Owns the time source, the session store and repository access. Every
/// method is scoped to one user's session.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    settings: QuizSettings,
    rules: Arc<AchievementRules>,
    bank: QuestionBank,
    results: Arc<dyn ResultRepository>,
    sessions: Arc<dyn SessionStore>,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        bank: QuestionBank,
        results: Arc<dyn ResultRepository>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            clock,
            settings,
            rules: Arc::new(AchievementRules::standard()),
            bank,
            results,
            sessions,
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: AchievementRules) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn question_bank(&self) -> &QuestionBank {
        &self.bank
    }

    //
    // ─── START ─────────────────────────────────────────────────────────────────
    //

    /// Start a session over up to `count` random questions of a topic,
    /// replacing any unfinished session of the user.
    ///
    /// `None` uses the configured question count.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTopic` if the topic has no questions, or
    /// `QuizError::Storage` on repository failures.
    pub async fn start(
        &self,
        user_id: UserId,
        topic_id: TopicId,
        count: Option<usize>,
    ) -> Result<QuestionView, QuizError> {
        let count = count
            .filter(|c| *c > 0)
            .unwrap_or_else(|| self.settings.question_count());
        let available = self.bank.list_questions(topic_id).await?;
        let available_len = available.len();
        let questions = sample_questions(available, count, &mut rand::rng());

        let session = QuizSession::new(user_id, topic_id, questions, self.clock.now())
            .inspect_err(|_| {
                tracing::info!(user_id = %user_id, topic_id = %topic_id, "topic has no questions");
            })?;
        let view = QuestionView::from_session(&session).ok_or(QuizError::EmptyTopic)?;

        if self.sessions.remove(user_id).await?.is_some() {
            tracing::debug!(user_id = %user_id, "abandoned unfinished session");
        }
        tracing::info!(
            user_id = %user_id,
            topic_id = %topic_id,
            questions = session.total_questions(),
            available = available_len,
            "quiz session started"
        );
        self.sessions.put(session).await?;
        Ok(view)
    }

    /// Start a session on a topic picked at random.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoTopics` if there are no topics, plus everything
    /// `start` returns.
    pub async fn start_random(
        &self,
        user_id: UserId,
        count: Option<usize>,
    ) -> Result<QuestionView, QuizError> {
        let topics = self.bank.list_topics().await?;
        let topic_id = choose_topic(&topics, &mut rand::rng())
            .map(|t| t.id())
            .ok_or(QuizError::NoTopics)?;
        self.start(user_id, topic_id, count).await
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    /// The question currently shown to the user.
    ///
    /// Returns `None` when every question has been passed but the session
    /// could not be finalised yet.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` if the user has no live session.
    pub async fn current_question(&self, user_id: UserId) -> Result<Option<QuestionView>, QuizError> {
        let session = self.load(user_id).await?;
        Ok(QuestionView::from_session(&session))
    }

    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` if the user has no live session.
    pub async fn progress(&self, user_id: UserId) -> Result<SessionProgress, QuizError> {
        Ok(self.load(user_id).await?.progress())
    }

    /// Achievements held by the user with their point total.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on repository failures.
    pub async fn achievements(&self, user_id: UserId) -> Result<AchievementSummary, QuizError> {
        let achievements = self.results.list_achievements(user_id).await?;
        Ok(AchievementSummary::new(achievements))
    }

    /// Most recent results for the user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on repository failures.
    pub async fn recent_results(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<TestResultRow>, QuizError> {
        Ok(self.results.list_results(user_id, limit).await?)
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Answer a single-choice question and advance.
    ///
    /// # Errors
    ///
    /// See [`Self::submit`].
    pub async fn answer_single(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        index: usize,
    ) -> Result<QuizStep, QuizError> {
        self.submit(user_id, question_id, Answer::Single(index)).await
    }

    /// Submit a final answer for the current question and advance.
    ///
    /// Completes the session when this was the last question.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession`, `StaleInteraction`, or a validation error
    /// for an answer that does not fit the question. The session is
    /// unchanged in those cases.
    pub async fn submit(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        answer: Answer,
    ) -> Result<QuizStep, QuizError> {
        let mut session = self.load(user_id).await?;
        let question = self.current_or_stale(&session, question_id)?;
        validate_final(question, &answer)?;
        self.advance(&mut session, question_id, Some(answer)).await
    }

    /// Skip the current question; it scores as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession` or `StaleInteraction`.
    pub async fn skip(&self, user_id: UserId, question_id: QuestionId) -> Result<QuizStep, QuizError> {
        let mut session = self.load(user_id).await?;
        self.current_or_stale(&session, question_id)?;
        self.advance(&mut session, question_id, None).await
    }

    /// Toggle an option of a multiple-choice question.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession`, `StaleInteraction`, `WrongQuestionType` or
    /// `InvalidOption`.
    pub async fn toggle_option(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        index: usize,
    ) -> Result<QuizStep, QuizError> {
        self.edit_draft(user_id, question_id, |s| {
            s.toggle_option(question_id, index).map(|_| ())
        })
        .await
    }

    /// Append an option to a sequence answer.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession`, `StaleInteraction`, `WrongQuestionType`,
    /// `InvalidOption` or `DuplicateChoice`.
    pub async fn append_choice(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        index: usize,
    ) -> Result<QuizStep, QuizError> {
        self.edit_draft(user_id, question_id, |s| {
            s.append_choice(question_id, index).map(|_| ())
        })
        .await
    }

    /// Clear a sequence answer.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession`, `StaleInteraction` or `WrongQuestionType`.
    pub async fn reset_sequence(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<QuizStep, QuizError> {
        self.edit_draft(user_id, question_id, |s| s.reset_sequence(question_id))
            .await
    }

    /// Confirm the accumulated multiple-choice or sequence answer and advance.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession`, `StaleInteraction`, `WrongQuestionType`, or
    /// `IncompleteSequence` while options are still unplaced.
    pub async fn confirm(
        &self,
        user_id: UserId,
        question_id: QuestionId,
    ) -> Result<QuizStep, QuizError> {
        let mut session = self.load(user_id).await?;
        let answer = session
            .confirmable_answer(question_id)
            .inspect_err(|e| self.log_rejection(user_id, question_id, e))?;
        self.advance(&mut session, question_id, Some(answer)).await
    }

    /// Dispatch a parsed action identifier.
    ///
    /// # Errors
    ///
    /// Whatever the underlying operation returns.
    pub async fn apply(&self, user_id: UserId, action: QuestionAction) -> Result<QuizStep, QuizError> {
        match action {
            QuestionAction::Answer { question_id, index } => {
                self.answer_single(user_id, question_id, index).await
            }
            QuestionAction::Toggle { question_id, index } => {
                self.toggle_option(user_id, question_id, index).await
            }
            QuestionAction::Append { question_id, index } => {
                self.append_choice(user_id, question_id, index).await
            }
            QuestionAction::Reset { question_id } => self.reset_sequence(user_id, question_id).await,
            QuestionAction::Confirm { question_id } => self.confirm(user_id, question_id).await,
            QuestionAction::Skip { question_id } => self.skip(user_id, question_id).await,
        }
    }

    //
    // ─── COMPLETION ────────────────────────────────────────────────────────────
    //

    /// Finalise the user's session: score it, persist the result with any
    /// new achievements and remove it from the store.
    ///
    /// Called automatically after the last question. Calling it earlier ends
    /// the session with unreached questions scored as skipped.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveSession` if there is nothing to complete.
    /// On `QuizError::Storage` the session stays in the store and completion
    /// can be retried.
    pub async fn complete(&self, user_id: UserId) -> Result<CompletionReport, QuizError> {
        let session = self.load(user_id).await?;
        self.finish(&session).await
    }

    /// Drop every session idle for longer than the configured timeout.
    ///
    /// Returns the users whose sessions were removed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the session store fails.
    pub async fn sweep_idle(&self) -> Result<Vec<UserId>, QuizError> {
        let Some(timeout) = self.settings.idle_timeout() else {
            return Ok(Vec::new());
        };
        let cutoff = self.clock.now() - timeout;
        let removed = self.sessions.remove_inactive_since(cutoff).await?;
        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "expired idle quiz sessions");
        }
        Ok(removed)
    }

    async fn finish(&self, session: &QuizSession) -> Result<CompletionReport, QuizError> {
        let user_id = session.user_id();
        let completed_at = self.clock.now();
        let outcomes = session.outcomes();
        let score = scoring::aggregate(&outcomes)?;
        let result = TestResult::from_score(
            user_id,
            session.topic_id(),
            &score,
            session.started_at(),
            completed_at.max(session.started_at()),
        )?;

        let (lifetime_completed, held) = match self.history(user_id).await {
            Ok(history) => history,
            Err(e) => return Err(self.storage_failure(user_id, e)),
        };
        let ctx = AchievementContext {
            lifetime_completed: lifetime_completed.saturating_add(1),
            score,
        };
        let new_achievements = self
            .rules
            .evaluate(&ctx, &held)
            .into_iter()
            .map(|rule| rule.grant(user_id, completed_at))
            .collect::<Result<Vec<_>, _>>()?;

        let record = CompletionRecord {
            result: result.clone(),
            outcomes: outcomes.clone(),
            achievements: new_achievements.clone(),
        };
        let result_id = match self.results.record_completion(&record).await {
            Ok(id) => id,
            Err(e) => return Err(self.storage_failure(user_id, e.into())),
        };

        if let Err(e) = self.sessions.remove(user_id).await {
            tracing::warn!(user_id = %user_id, error = %e, "completed session left in store");
        }

        tracing::info!(
            user_id = %user_id,
            topic_id = %session.topic_id(),
            result_id,
            correct = score.correct,
            total = score.total,
            percentage = score.percentage,
            "quiz session completed"
        );
        for achievement in &new_achievements {
            tracing::info!(
                user_id = %user_id,
                achievement = achievement.name(),
                points = achievement.points(),
                "achievement granted"
            );
        }

        let questions = session
            .questions()
            .iter()
            .zip(&outcomes)
            .map(|(question, outcome)| QuestionReport::from_outcome(question, outcome))
            .collect();

        Ok(CompletionReport {
            result_id,
            user_id,
            topic_id: session.topic_id(),
            score,
            grade: GradeBand::from_percentage(score.percentage),
            time_spent_secs: result.time_spent_secs(),
            completed_at: result.completed_at(),
            questions,
            new_achievements,
        })
    }

    async fn history(
        &self,
        user_id: UserId,
    ) -> Result<(u64, HashSet<String>), QuizError> {
        let count = self.results.completed_result_count(user_id).await?;
        let held = self.results.achievement_names(user_id).await?;
        Ok((count, held))
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    /// Load the user's live session, dropping it if it has been idle too long.
    ///
    /// Exhausted sessions await a completion retry and never expire.
    async fn load(&self, user_id: UserId) -> Result<QuizSession, QuizError> {
        let session = self
            .sessions
            .get(user_id)
            .await?
            .ok_or(QuizError::NoActiveSession)?;

        let expired = self
            .settings
            .idle_timeout()
            .is_some_and(|timeout| session.is_idle(self.clock.now(), timeout))
            && !session.is_exhausted();
        if expired {
            self.sessions.remove(user_id).await?;
            tracing::info!(
                user_id = %user_id,
                idle_since = %session.last_activity(),
                "quiz session expired"
            );
            return Err(QuizError::NoActiveSession);
        }
        Ok(session)
    }

    fn current_or_stale<'s>(
        &self,
        session: &'s QuizSession,
        question_id: QuestionId,
    ) -> Result<&'s Question, QuizError> {
        session
            .expect_current(question_id)
            .inspect_err(|e| self.log_rejection(session.user_id(), question_id, e))
    }

    async fn edit_draft(
        &self,
        user_id: UserId,
        question_id: QuestionId,
        edit: impl FnOnce(&mut QuizSession) -> Result<(), QuizError>,
    ) -> Result<QuizStep, QuizError> {
        let mut session = self.load(user_id).await?;
        edit(&mut session).inspect_err(|e| self.log_rejection(user_id, question_id, e))?;
        session.touch(self.clock.now());
        let view = QuestionView::from_session(&session).ok_or(QuizError::StaleInteraction)?;
        self.sessions.put(session).await?;
        Ok(QuizStep::Updated(view))
    }

    async fn advance(
        &self,
        session: &mut QuizSession,
        question_id: QuestionId,
        answer: Option<Answer>,
    ) -> Result<QuizStep, QuizError> {
        session.advance(question_id, answer)?;
        session.touch(self.clock.now());
        tracing::debug!(
            user_id = %session.user_id(),
            question_id = %question_id,
            index = session.current_index(),
            "question passed"
        );

        if let Some(view) = QuestionView::from_session(session) {
            self.sessions.put(session.clone()).await?;
            return Ok(QuizStep::Next(view));
        }

        // Keep the exhausted session stored so completion can be retried.
        self.sessions.put(session.clone()).await?;
        let report = self.finish(session).await?;
        Ok(QuizStep::Completed(Box::new(report)))
    }

    fn log_rejection(&self, user_id: UserId, question_id: QuestionId, error: &QuizError) {
        if error.is_silent() {
            tracing::debug!(user_id = %user_id, question_id = %question_id, "ignored stale interaction");
        } else {
            tracing::debug!(user_id = %user_id, question_id = %question_id, %error, "rejected action");
        }
    }

    fn storage_failure(&self, user_id: UserId, error: QuizError) -> QuizError {
        tracing::error!(user_id = %user_id, %error, "failed to record quiz completion");
        error
    }
}
