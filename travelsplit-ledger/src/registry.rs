use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;
use travelsplit_core::{
    CreateExpenseCommand, Expense, ExpenseId, LedgerError, LedgerResult, Money, Participant,
    SettlementTransfer, TripId,
};

use crate::{BalanceSheet, SharedTripLedger, TripLedger};

/// Lookup of trip ledgers by trip id.
///
/// The registry lock only guards the map; each trip serialises its own
/// mutations, so writers on different trips never contend.
#[derive(Debug)]
pub struct TripRegistry {
    trips: RwLock<HashMap<TripId, Arc<SharedTripLedger>>>,
    max_amount: Money,
}

impl Default for TripRegistry {
    fn default() -> Self {
        Self::new(Money::MAX)
    }
}

impl TripRegistry {
    /// `max_amount` applies to every ledger opened through this registry.
    pub fn new(max_amount: Money) -> Self {
        Self {
            trips: RwLock::new(HashMap::new()),
            max_amount,
        }
    }

    /// Open a ledger for a trip, returning the existing one when already open.
    pub fn open_trip<I>(
        &self,
        trip_id: TripId,
        participants: I,
    ) -> LedgerResult<Arc<SharedTripLedger>>
    where
        I: IntoIterator<Item = Participant>,
    {
        if let Some(existing) = self.trips.read().get(&trip_id) {
            return Ok(Arc::clone(existing));
        }
        let ledger = TripLedger::with_participants(trip_id, participants)?;
        Ok(self.register(ledger.with_max_amount(self.max_amount)))
    }

    /// Take ownership of a ledger built elsewhere.
    pub fn register(&self, ledger: TripLedger) -> Arc<SharedTripLedger> {
        let trip_id = ledger.trip_id();
        let mut trips = self.trips.write();
        let shared = trips
            .entry(trip_id)
            .or_insert_with(|| Arc::new(SharedTripLedger::new(ledger)));
        info!(trip = %trip_id, "trip ledger registered");
        Arc::clone(shared)
    }

    pub fn get(&self, trip_id: TripId) -> LedgerResult<Arc<SharedTripLedger>> {
        self.trips
            .read()
            .get(&trip_id)
            .cloned()
            .ok_or(LedgerError::UnknownTrip(trip_id))
    }

    pub fn trip_ids(&self) -> Vec<TripId> {
        let mut ids: Vec<TripId> = self.trips.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn create_expense(&self, command: CreateExpenseCommand) -> LedgerResult<Expense> {
        self.get(command.trip_id)?.add_expense(command)
    }

    pub fn remove_expense(&self, trip_id: TripId, expense_id: ExpenseId) -> LedgerResult<Expense> {
        self.get(trip_id)?.remove_expense(expense_id)
    }

    pub fn get_balances(&self, trip_id: TripId) -> LedgerResult<BalanceSheet> {
        Ok(self.get(trip_id)?.balances())
    }

    pub fn get_settlement(&self, trip_id: TripId) -> LedgerResult<Vec<SettlementTransfer>> {
        Ok(self.get(trip_id)?.settlement())
    }

    pub fn close_trip(&self, trip_id: TripId) -> LedgerResult<()> {
        self.get(trip_id)?.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use travelsplit_core::ParticipantId;

    fn roster() -> Vec<Participant> {
        vec![Participant::new("ana", "Ana"), Participant::new("beto", "Beto")]
    }

    #[test]
    fn routes_commands_by_trip() {
        let registry = TripRegistry::default();
        let trip = TripId::new();
        registry.open_trip(trip, roster()).unwrap();
        let taxi = CreateExpenseCommand::new(trip, "ana", ["beto"], 40, "Taxi");
        registry.create_expense(taxi).unwrap();
        let balances = registry.get_balances(trip).unwrap();
        let ana = ParticipantId::from("ana");
        let beto = ParticipantId::from("beto");
        assert_eq!(balances.owed(&beto, &ana).units(), 40);
        assert_eq!(registry.get_settlement(trip).unwrap().len(), 1);
    }

    #[test]
    fn unknown_trip_is_reported() {
        let registry = TripRegistry::default();
        let trip = TripId::new();
        assert_eq!(
            registry.get_balances(trip).unwrap_err(),
            LedgerError::UnknownTrip(trip)
        );
        let command = CreateExpenseCommand::new(trip, "ana", ["beto"], 1, "x");
        assert_eq!(
            registry.create_expense(command).unwrap_err(),
            LedgerError::UnknownTrip(trip)
        );
    }

    #[test]
    fn reopening_returns_same_ledger() {
        let registry = TripRegistry::default();
        let trip = TripId::new();
        let first = registry.open_trip(trip, roster()).unwrap();
        let second = registry.open_trip(trip, Vec::new()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.trip_ids(), vec![trip]);
    }

    #[test]
    fn registry_ceiling_applies_to_opened_trips() {
        let registry = TripRegistry::new(Money::new(100).unwrap());
        let trip = TripId::new();
        registry.open_trip(trip, roster()).unwrap();
        let too_much = CreateExpenseCommand::new(trip, "ana", ["beto"], 101, "x");
        assert_eq!(
            registry.create_expense(too_much).unwrap_err(),
            LedgerError::AmountOverflow
        );
        registry.close_trip(trip).unwrap();
        let late = CreateExpenseCommand::new(trip, "ana", ["beto"], 10, "x");
        assert_eq!(
            registry.create_expense(late).unwrap_err(),
            LedgerError::LedgerClosed(trip)
        );
    }
}
