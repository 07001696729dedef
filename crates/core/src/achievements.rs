use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::model::{Achievement, AchievementError, ScoreSummary, UserId};

/// Facts an achievement predicate can inspect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementContext {
    /// Completed sessions for the user, including the one being completed.
    pub lifetime_completed: u64,
    /// Score of the session being completed.
    pub score: ScoreSummary,
}

type Predicate = Arc<dyn Fn(&AchievementContext) -> bool + Send + Sync>;

/// A named reward and the condition under which it is granted.
#[derive(Clone)]
pub struct AchievementRule {
    name: String,
    description: String,
    points: u32,
    badge: Option<String>,
    predicate: Predicate,
}

impl AchievementRule {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        points: u32,
        predicate: impl Fn(&AchievementContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            points,
            badge: None,
            predicate: Arc::new(predicate),
        }
    }

    #[must_use]
    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn badge(&self) -> Option<&str> {
        self.badge.as_deref()
    }

    #[must_use]
    pub fn matches(&self, ctx: &AchievementContext) -> bool {
        (self.predicate)(ctx)
    }

    /// Build the durable record for this rule.
    ///
    /// # Errors
    ///
    /// Returns `AchievementError` if the rule has a blank name.
    pub fn grant(
        &self,
        user_id: UserId,
        achieved_at: DateTime<Utc>,
    ) -> Result<Achievement, AchievementError> {
        Achievement::new(
            user_id,
            self.name.clone(),
            self.description.clone(),
            self.points,
            self.badge.clone(),
            achieved_at,
        )
    }
}

impl fmt::Debug for AchievementRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AchievementRule")
            .field("name", &self.name)
            .field("points", &self.points)
            .field("badge", &self.badge)
            .finish_non_exhaustive()
    }
}

/// Ordered, extensible set of achievement rules.
#[derive(Debug, Clone, Default)]
pub struct AchievementRules {
    rules: Vec<AchievementRule>,
}

impl AchievementRules {
    pub const FIRST_TEST: &'static str = "First Test";
    pub const TOP_STUDENT: &'static str = "Top Student";
    pub const HISTORY_EXPERT: &'static str = "History Expert";

    /// The built-in rules: first completed test, a perfect score, and ten
    /// lifetime completed tests.
    #[must_use]
    pub fn standard() -> Self {
        Self::default()
            .with_rule(
                AchievementRule::new(Self::FIRST_TEST, "Completed your first test!", 10, |_| true)
                    .with_badge("badges/first_test.png"),
            )
            .with_rule(
                AchievementRule::new(Self::TOP_STUDENT, "Scored 100% on a test", 50, |ctx| {
                    ctx.score.is_perfect()
                })
                .with_badge("badges/perfect_score.png"),
            )
            .with_rule(
                AchievementRule::new(Self::HISTORY_EXPERT, "Completed 10 tests", 100, |ctx| {
                    ctx.lifetime_completed >= 10
                })
                .with_badge("badges/history_expert.png"),
            )
    }

    #[must_use]
    pub fn with_rule(mut self, rule: AchievementRule) -> Self {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[AchievementRule] {
        &self.rules
    }

    /// Rules whose predicate holds and whose name the user does not hold yet.
    ///
    /// A name is reported at most once even if several rules share it.
    #[must_use]
    pub fn evaluate<'a>(
        &'a self,
        ctx: &AchievementContext,
        already_granted: &HashSet<String>,
    ) -> Vec<&'a AchievementRule> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.rules
            .iter()
            .filter(|rule| !already_granted.contains(rule.name()))
            .filter(|rule| rule.matches(ctx))
            .filter(|rule| seen.insert(rule.name()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn ctx(lifetime_completed: u64, correct: u32, total: u32) -> AchievementContext {
        AchievementContext {
            lifetime_completed,
            score: ScoreSummary {
                correct,
                total,
                percentage: crate::scoring::percentage(correct, total),
            },
        }
    }

    fn names(rules: &[&AchievementRule]) -> Vec<String> {
        rules.iter().map(|r| r.name().to_owned()).collect()
    }

    #[test]
    fn first_completion_grants_first_test() {
        let rules = AchievementRules::standard();
        let granted = rules.evaluate(&ctx(1, 3, 5), &HashSet::new());
        assert_eq!(names(&granted), vec![AchievementRules::FIRST_TEST]);
    }

    #[test]
    fn perfect_tenth_test_grants_everything_new() {
        let rules = AchievementRules::standard();
        let held: HashSet<String> = [AchievementRules::FIRST_TEST.to_owned()].into();
        let granted = rules.evaluate(&ctx(10, 5, 5), &held);
        assert_eq!(
            names(&granted),
            vec![AchievementRules::TOP_STUDENT, AchievementRules::HISTORY_EXPERT]
        );
    }

    #[test]
    fn held_names_are_never_regranted() {
        let rules = AchievementRules::standard();
        let held: HashSet<String> = rules.rules().iter().map(|r| r.name().to_owned()).collect();
        assert!(rules.evaluate(&ctx(42, 5, 5), &held).is_empty());
    }

    #[test]
    fn custom_rules_extend_the_set() {
        let rules = AchievementRules::default().with_rule(AchievementRule::new(
            "Half Way",
            "Scored at least 50%",
            5,
            |ctx| ctx.score.percentage >= 50.0,
        ));
        assert_eq!(rules.evaluate(&ctx(1, 1, 2), &HashSet::new()).len(), 1);
        assert!(rules.evaluate(&ctx(1, 0, 2), &HashSet::new()).is_empty());
    }

    #[test]
    fn duplicate_rule_names_fire_once() {
        let rules = AchievementRules::default()
            .with_rule(AchievementRule::new("Dup", "a", 1, |_| true))
            .with_rule(AchievementRule::new("Dup", "b", 2, |_| true));
        assert_eq!(rules.evaluate(&ctx(1, 0, 1), &HashSet::new()).len(), 1);
    }

    #[test]
    fn grant_copies_rule_fields() {
        let rules = AchievementRules::standard();
        let rule = &rules.rules()[1];
        let achievement = rule.grant(UserId::new(9), fixed_now()).unwrap();
        assert_eq!(achievement.name(), AchievementRules::TOP_STUDENT);
        assert_eq!(achievement.points(), 50);
        assert_eq!(achievement.badge(), Some("badges/perfect_score.png"));
        assert_eq!(achievement.achieved_at(), fixed_now());
    }
}
