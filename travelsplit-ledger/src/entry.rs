use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use travelsplit_core::{ExpenseId, Money, ParticipantId, TripId};
use uuid::Uuid;

use crate::BeneficiaryShare;

/// Canonical journal record describing a single ledger event.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub trip_id: TripId,
    pub event: LedgerEvent,
    pub meta: Option<serde_json::Value>,
}

impl LedgerEntry {
    /// Creates a new entry with a zero sequence number.
    pub fn new(trip_id: TripId, event: LedgerEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            timestamp: Utc::now(),
            trip_id,
            event,
            meta: None,
        }
    }

    /// Assign the monotonic sequence number used for replay.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn entry_type(&self) -> LedgerEntryType {
        self.event.entry_type()
    }
}

/// Payload of a journal entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    ParticipantJoined {
        participant: ParticipantId,
    },
    ParticipantDeactivated {
        participant: ParticipantId,
    },
    ExpenseRecorded {
        expense_id: ExpenseId,
        payer: ParticipantId,
        amount: Money,
        shares: Vec<BeneficiaryShare>,
    },
    ExpenseVoided {
        expense_id: ExpenseId,
    },
    LedgerClosed,
}

impl LedgerEvent {
    pub fn entry_type(&self) -> LedgerEntryType {
        match self {
            LedgerEvent::ParticipantJoined { .. } => LedgerEntryType::ParticipantJoined,
            LedgerEvent::ParticipantDeactivated { .. } => LedgerEntryType::ParticipantDeactivated,
            LedgerEvent::ExpenseRecorded { .. } => LedgerEntryType::ExpenseRecorded,
            LedgerEvent::ExpenseVoided { .. } => LedgerEntryType::ExpenseVoided,
            LedgerEvent::LedgerClosed => LedgerEntryType::LedgerClosed,
        }
    }
}

/// Enumerates the supported journal entry categories.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    ParticipantJoined,
    ParticipantDeactivated,
    ExpenseRecorded,
    ExpenseVoided,
    LedgerClosed,
}

impl LedgerEntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            LedgerEntryType::ParticipantJoined => "participant_joined",
            LedgerEntryType::ParticipantDeactivated => "participant_deactivated",
            LedgerEntryType::ExpenseRecorded => "expense_recorded",
            LedgerEntryType::ExpenseVoided => "expense_voided",
            LedgerEntryType::LedgerClosed => "ledger_closed",
        }
    }
}

impl fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerEntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "participant_joined" => Ok(LedgerEntryType::ParticipantJoined),
            "participant_deactivated" => Ok(LedgerEntryType::ParticipantDeactivated),
            "expense_recorded" => Ok(LedgerEntryType::ExpenseRecorded),
            "expense_voided" => Ok(LedgerEntryType::ExpenseVoided),
            "ledger_closed" => Ok(LedgerEntryType::LedgerClosed),
            other => Err(format!("unknown ledger entry type: {other}")),
        }
    }
}
