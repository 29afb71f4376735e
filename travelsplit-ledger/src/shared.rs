use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::Serialize;
use travelsplit_core::{
    CreateExpenseCommand, Expense, ExpenseId, LedgerResult, Money, Participant, ParticipantId,
    SettlementTransfer, TripId,
};

use crate::{BalanceSheet, Debt, LedgerState, TripLedger, TripSummary};

/// Consistent read-only view of a ledger taken under a single read lock.
#[derive(Clone, Debug)]
pub struct LedgerSnapshot {
    pub trip_id: TripId,
    pub version: u64,
    pub state: LedgerState,
    pub balances: BalanceSheet,
    pub settlement: Vec<SettlementTransfer>,
}

/// Serialisable balance report handed to transport layers.
#[derive(Clone, Debug, Serialize)]
pub struct BalanceReport {
    pub trip_id: TripId,
    pub version: u64,
    pub debts: Vec<Debt>,
    /// Net position per participant; positive when the group owes them.
    pub positions: BTreeMap<ParticipantId, Money>,
    pub settlement: Vec<SettlementTransfer>,
}

impl From<&LedgerSnapshot> for BalanceReport {
    fn from(snapshot: &LedgerSnapshot) -> Self {
        Self {
            trip_id: snapshot.trip_id,
            version: snapshot.version,
            debts: snapshot.balances.debts(),
            positions: snapshot.balances.positions().clone(),
            settlement: snapshot.settlement.clone(),
        }
    }
}

/// Single-writer, many-reader guard around one [`TripLedger`].
///
/// Mutations hold the write lock for their whole duration; queries copy what
/// they need out under the read lock, so readers never see a half-applied
/// expense.
#[derive(Debug)]
pub struct SharedTripLedger {
    inner: RwLock<TripLedger>,
}

impl SharedTripLedger {
    pub fn new(ledger: TripLedger) -> Self {
        Self {
            inner: RwLock::new(ledger),
        }
    }

    pub fn trip_id(&self) -> TripId {
        self.inner.read().trip_id()
    }

    pub fn add_expense(&self, command: CreateExpenseCommand) -> LedgerResult<Expense> {
        self.inner.write().add_expense(command)
    }

    pub fn remove_expense(&self, expense_id: ExpenseId) -> LedgerResult<Expense> {
        self.inner.write().remove_expense(expense_id)
    }

    pub fn add_participant(&self, participant: Participant) -> LedgerResult<()> {
        self.inner.write().add_participant(participant)
    }

    pub fn deactivate_participant(&self, id: &ParticipantId) -> LedgerResult<()> {
        self.inner.write().deactivate_participant(id)
    }

    pub fn close(&self) {
        self.inner.write().close();
    }

    pub fn balances(&self) -> BalanceSheet {
        self.inner.read().balances()
    }

    pub fn settlement(&self) -> Vec<SettlementTransfer> {
        self.inner.read().settlement()
    }

    pub fn summary(&self) -> TripSummary {
        self.inner.read().summary()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let ledger = self.inner.read();
        LedgerSnapshot {
            trip_id: ledger.trip_id(),
            version: ledger.version(),
            state: ledger.state(),
            balances: ledger.balances(),
            settlement: ledger.settlement(),
        }
    }

    /// Run an arbitrary read-only query under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&TripLedger) -> R) -> R {
        f(&self.inner.read())
    }
}
