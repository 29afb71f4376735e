use std::collections::HashMap;

use travelsplit_core::{ExpenseId, LedgerError, LedgerResult, ParticipantId, TripId};

use crate::{
    BalanceSheet, BeneficiaryShare, LedgerAggregator, LedgerEntry, LedgerEntryType, LedgerEvent,
    LedgerSequencer,
};

/// Append-only audit log of everything that happened to a trip ledger.
#[derive(Clone, Debug)]
pub struct Journal {
    trip_id: TripId,
    sequencer: LedgerSequencer,
    entries: Vec<LedgerEntry>,
}

impl Journal {
    pub fn new(trip_id: TripId) -> Self {
        Self {
            trip_id,
            sequencer: LedgerSequencer::default(),
            entries: Vec::new(),
        }
    }

    /// Append an event and return the sequenced entry.
    pub fn append(
        &mut self,
        event: LedgerEvent,
        meta: Option<serde_json::Value>,
    ) -> &LedgerEntry {
        let mut entry = LedgerEntry::new(self.trip_id, event)
            .with_sequence(self.sequencer.next());
        if let Some(meta) = meta {
            entry = entry.with_meta(meta);
        }
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Sequence of the most recent entry, zero for an empty journal.
    pub fn tail_sequence(&self) -> u64 {
        self.sequencer.current()
    }

    /// Entries recorded strictly after `sequence`.
    pub fn since(&self, sequence: u64) -> &[LedgerEntry] {
        let start = self
            .entries
            .partition_point(|entry| entry.sequence <= sequence);
        &self.entries[start..]
    }

    pub fn of_type(&self, kind: LedgerEntryType) -> impl Iterator<Item = &LedgerEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.entry_type() == kind)
    }

    /// Re-derive balances purely from the journal.
    ///
    /// A void that names an expense the journal never recorded is reported as
    /// [`LedgerError::ExpenseNotFound`].
    pub fn replay(&self) -> LedgerResult<BalanceSheet> {
        let mut recorded: HashMap<ExpenseId, (&ParticipantId, &[BeneficiaryShare])> =
            HashMap::new();
        let mut aggregator = LedgerAggregator::new();
        for entry in &self.entries {
            match &entry.event {
                LedgerEvent::ExpenseRecorded {
                    expense_id,
                    payer,
                    shares,
                    ..
                } => {
                    aggregator.apply_shares(payer, shares)?;
                    recorded.insert(*expense_id, (payer, shares.as_slice()));
                }
                LedgerEvent::ExpenseVoided { expense_id } => {
                    let (payer, shares) = recorded
                        .remove(expense_id)
                        .ok_or(LedgerError::ExpenseNotFound(*expense_id))?;
                    aggregator.reverse_shares(payer, shares)?;
                }
                LedgerEvent::ParticipantJoined { .. }
                | LedgerEvent::ParticipantDeactivated { .. }
                | LedgerEvent::LedgerClosed => {}
            }
        }
        Ok(aggregator.into_sheet())
    }
}
