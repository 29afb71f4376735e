use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ParticipantId;

/// Role a participant holds within a trip.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Creator,
    #[default]
    Member,
}

/// Member of a trip who can pay for or benefit from expenses.
///
/// Participants are never removed from a ledger; leaving a trip clears
/// `is_active` so historical expenses keep resolving their payer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub role: ParticipantRole,
    #[serde(default = "active_default")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub joined_at: DateTime<Utc>,
}

fn active_default() -> bool {
    true
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: ParticipantRole::Member,
            is_active: true,
            joined_at: Utc::now(),
        }
    }

    pub fn with_role(mut self, role: ParticipantRole) -> Self {
        self.role = role;
        self
    }
}
