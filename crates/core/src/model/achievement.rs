use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AchievementError {
    #[error("achievement name cannot be empty")]
    EmptyName,
}

/// A one-time reward granted to a user. Append-only; never re-issued for the
/// same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    user_id: UserId,
    name: String,
    description: String,
    points: u32,
    badge: Option<String>,
    achieved_at: DateTime<Utc>,
}

impl Achievement {
    /// Creates an achievement record.
    ///
    /// # Errors
    ///
    /// Returns `AchievementError::EmptyName` if the name is blank.
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        description: impl Into<String>,
        points: u32,
        badge: Option<String>,
        achieved_at: DateTime<Utc>,
    ) -> Result<Self, AchievementError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AchievementError::EmptyName);
        }
        Ok(Self {
            user_id,
            name,
            description: description.into(),
            points,
            badge,
            achieved_at,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
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
    pub fn achieved_at(&self) -> DateTime<Utc> {
        self.achieved_at
    }
}
