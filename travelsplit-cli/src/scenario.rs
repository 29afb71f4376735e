//! TOML trip scenarios replayed into an in-memory ledger.
//!
//! ```toml
//! [trip]
//! name = "Cartagena"
//!
//! [[participants]]
//! id = "ana"
//! name = "Ana"
//!
//! [[expenses]]
//! payer = "ana"
//! beneficiaries = ["ana", "beto"]
//! amount = 120000
//! title = "Hotel"
//! date = "2024-03-01"
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info};
use travelsplit_core::{
    CategoryId, CreateExpenseCommand, Money, Participant, ParticipantId, ParticipantRole, TripId,
};
use travelsplit_ledger::TripLedger;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub trip: TripSection,
    #[serde(default)]
    pub participants: Vec<ParticipantEntry>,
    #[serde(default)]
    pub expenses: Vec<ExpenseEntry>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TripSection {
    #[serde(default)]
    pub id: Option<TripId>,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticipantEntry {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub role: ParticipantRole,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpenseEntry {
    pub payer: ParticipantId,
    pub beneficiaries: Vec<ParticipantId>,
    pub amount: i64,
    #[serde(default)]
    pub category: CategoryId,
    pub title: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub receipt_url: Option<String>,
    /// Recorded and then removed, leaving only an audit trail.
    #[serde(default)]
    pub voided: bool,
}

fn default_active() -> bool {
    true
}

/// Ledger rebuilt from a scenario, plus the trip's display name.
#[derive(Debug)]
pub struct LoadedTrip {
    pub name: String,
    pub ledger: TripLedger,
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Replay the scenario: roster first, expenses in file order, then
    /// departures and closing.
    pub fn build(&self, max_amount: Money) -> Result<LoadedTrip> {
        let trip_id = self.trip.id.unwrap_or_default();
        let roster = self.participants.iter().map(ParticipantEntry::participant);
        let mut ledger = TripLedger::with_participants(trip_id, roster)
            .context("invalid participant roster")?
            .with_max_amount(max_amount);

        for (idx, entry) in self.expenses.iter().enumerate() {
            let expense = ledger
                .add_expense(entry.command(trip_id))
                .with_context(|| format!("expense #{} ({:?}) rejected", idx + 1, entry.title))?;
            if entry.voided {
                ledger
                    .remove_expense(expense.id)
                    .with_context(|| format!("failed to void expense #{}", idx + 1))?;
                debug!(expense = %expense.id, "voided scenario expense");
            }
        }

        for entry in self.participants.iter().filter(|entry| !entry.active) {
            ledger
                .deactivate_participant(&entry.id)
                .with_context(|| format!("failed to deactivate {}", entry.id))?;
        }
        if self.trip.closed {
            ledger.close();
        }

        info!(
            trip = %trip_id,
            name = %self.trip.name,
            expenses = self.expenses.len(),
            "scenario loaded"
        );
        Ok(LoadedTrip {
            name: self.trip.name.clone(),
            ledger,
        })
    }
}

impl ParticipantEntry {
    fn participant(&self) -> Participant {
        Participant::new(self.id.clone(), self.name.clone()).with_role(self.role)
    }
}

impl ExpenseEntry {
    fn command(&self, trip_id: TripId) -> CreateExpenseCommand {
        let mut command = CreateExpenseCommand::new(
            trip_id,
            self.payer.clone(),
            self.beneficiaries.iter().cloned(),
            self.amount,
            self.title.clone(),
        )
        .with_category(self.category);
        if let Some(date) = self.date {
            command = command.with_expense_date(date);
        }
        if let Some(url) = &self.receipt_url {
            command = command.with_receipt_url(url.clone());
        }
        command
    }
}
