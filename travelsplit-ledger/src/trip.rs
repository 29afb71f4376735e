use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use travelsplit_core::{
    CategoryId, CreateExpenseCommand, Expense, ExpenseId, ExpenseSplit, LedgerError, LedgerResult,
    Money, Participant, ParticipantId, SettlementTransfer, SplitId, TripId,
};

use crate::{
    BalanceSheet, ExpenseQuery, Journal, LedgerAggregator, LedgerEvent, SettlementPlanner,
    SplitCalculator,
};

/// Lifecycle of a trip's ledger. Closing is one-way.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerState {
    #[default]
    Active,
    Closed,
}

/// Spending totals for one participant across active expenses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub participant: ParticipantId,
    pub name: String,
    pub is_active: bool,
    /// Total of expenses this participant paid for.
    pub paid: Money,
    /// Total of this participant's own shares, including shares of expenses they paid.
    pub owed: Money,
    /// `paid - owed`; positive when the group owes them.
    pub net: Money,
}

/// Aggregate view of a trip used by summary screens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSummary {
    pub trip_id: TripId,
    pub state: LedgerState,
    pub expense_count: usize,
    pub total_spent: Money,
    pub participants: Vec<ParticipantSummary>,
    pub categories: BTreeMap<CategoryId, Money>,
}

/// Financial state of a single trip.
///
/// Owns the participant roster, every recorded expense (voided ones are
/// retained for audit), the incrementally maintained balance sheet and the
/// audit journal. All mutation goes through `&mut self`; wrap the ledger in a
/// [`crate::SharedTripLedger`] to share it between threads.
#[derive(Clone, Debug)]
pub struct TripLedger {
    trip_id: TripId,
    state: LedgerState,
    max_amount: Money,
    participants: BTreeMap<ParticipantId, Participant>,
    expenses: Vec<Expense>,
    index: HashMap<ExpenseId, usize>,
    aggregator: LedgerAggregator,
    journal: Journal,
}

impl TripLedger {
    pub fn new(trip_id: TripId) -> Self {
        Self {
            trip_id,
            state: LedgerState::Active,
            max_amount: Money::MAX,
            participants: BTreeMap::new(),
            expenses: Vec::new(),
            index: HashMap::new(),
            aggregator: LedgerAggregator::new(),
            journal: Journal::new(trip_id),
        }
    }

    /// Build an open ledger with an initial roster.
    pub fn with_participants<I>(trip_id: TripId, participants: I) -> LedgerResult<Self>
    where
        I: IntoIterator<Item = Participant>,
    {
        let mut ledger = Self::new(trip_id);
        for participant in participants {
            ledger.add_participant(participant)?;
        }
        Ok(ledger)
    }

    /// Cap accepted expense amounts below [`Money::MAX_SAFE`].
    pub fn with_max_amount(mut self, max_amount: Money) -> Self {
        self.max_amount = max_amount.min(Money::MAX);
        self
    }

    pub fn trip_id(&self) -> TripId {
        self.trip_id
    }

    pub fn state(&self) -> LedgerState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == LedgerState::Closed
    }

    /// Journal tail sequence; changes on every mutation.
    pub fn version(&self) -> u64 {
        self.journal.tail_sequence()
    }

    /// Add a participant, or reactivate one who left earlier.
    pub fn add_participant(&mut self, participant: Participant) -> LedgerResult<()> {
        self.ensure_open()?;
        let id = participant.id.clone();
        match self.participants.get_mut(&id) {
            Some(existing) if existing.is_active => return Ok(()),
            Some(existing) => {
                existing.is_active = true;
                existing.name = participant.name;
            }
            None => {
                let mut participant = participant;
                participant.is_active = true;
                self.participants.insert(id.clone(), participant);
            }
        }
        info!(trip = %self.trip_id, participant = %id, "participant joined trip");
        self.journal
            .append(LedgerEvent::ParticipantJoined { participant: id }, None);
        Ok(())
    }

    /// Mark a participant inactive. Their history and balances are kept, but
    /// new expenses can no longer name them.
    pub fn deactivate_participant(&mut self, id: &ParticipantId) -> LedgerResult<()> {
        self.ensure_open()?;
        let participant = self
            .participants
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownParticipant(id.clone()))?;
        if !participant.is_active {
            return Ok(());
        }
        participant.is_active = false;
        let outstanding = self.aggregator.sheet().position(id);
        info!(
            trip = %self.trip_id,
            participant = %id,
            outstanding = outstanding.units(),
            "participant deactivated"
        );
        self.journal.append(
            LedgerEvent::ParticipantDeactivated {
                participant: id.clone(),
            },
            None,
        );
        Ok(())
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Validate, split and record a new expense.
    pub fn add_expense(&mut self, command: CreateExpenseCommand) -> LedgerResult<Expense> {
        self.record_expense(command).inspect_err(|err| {
            warn!(
                trip = %self.trip_id,
                error = %err,
                kind = err.kind().as_str(),
                "expense rejected"
            );
        })
    }

    fn record_expense(&mut self, command: CreateExpenseCommand) -> LedgerResult<Expense> {
        self.ensure_open()?;
        if command.trip_id != self.trip_id {
            return Err(LedgerError::UnknownTrip(command.trip_id));
        }
        let amount = command.validate(self.max_amount)?;
        self.ensure_active(&command.payer_id)?;
        for beneficiary in &command.beneficiary_ids {
            self.ensure_active(beneficiary)?;
        }

        let shares = SplitCalculator::compute_splits(amount, &command.beneficiary_ids)?;
        let expense_id = ExpenseId::new();
        let created_at = Utc::now();
        let splits: Vec<ExpenseSplit> = shares
            .iter()
            .map(|share| ExpenseSplit {
                id: SplitId::new(),
                expense_id,
                beneficiary_id: share.beneficiary.clone(),
                amount_owed: share.amount,
                created_at,
            })
            .collect();
        let mut expense = Expense {
            id: expense_id,
            trip_id: self.trip_id,
            sequence: 0,
            payer_id: command.payer_id,
            category_id: command.category_id,
            title: command.title.trim().to_string(),
            amount,
            receipt_url: command.receipt_url.filter(|url| !url.trim().is_empty()),
            expense_date: command
                .expense_date
                .unwrap_or_else(|| created_at.date_naive()),
            created_at,
            voided_at: None,
            splits,
        };

        self.aggregator.apply(&expense)?;
        let meta = json!({
            "title": expense.title,
            "category_id": expense.category_id,
            "expense_date": expense.expense_date,
        });
        expense.sequence = self
            .journal
            .append(
                LedgerEvent::ExpenseRecorded {
                    expense_id,
                    payer: expense.payer_id.clone(),
                    amount,
                    shares,
                },
                Some(meta),
            )
            .sequence;

        for split in &expense.splits {
            debug!(
                expense = %expense_id,
                beneficiary = %split.beneficiary_id,
                owed = split.amount_owed.units(),
                "split computed"
            );
        }
        info!(
            trip = %self.trip_id,
            expense = %expense_id,
            payer = %expense.payer_id,
            amount = amount.units(),
            beneficiaries = expense.splits.len(),
            "expense recorded"
        );

        self.index.insert(expense_id, self.expenses.len());
        self.expenses.push(expense.clone());
        Ok(expense)
    }

    /// Void an expense: reverse its splits and keep it for audit.
    pub fn remove_expense(&mut self, expense_id: ExpenseId) -> LedgerResult<Expense> {
        self.ensure_open()?;
        let position = *self
            .index
            .get(&expense_id)
            .ok_or(LedgerError::ExpenseNotFound(expense_id))?;
        let expense = &self.expenses[position];
        if !expense.is_active() {
            return Err(LedgerError::ExpenseNotFound(expense_id));
        }

        self.aggregator.reverse(expense)?;
        let expense = &mut self.expenses[position];
        expense.voided_at = Some(Utc::now());
        self.journal
            .append(LedgerEvent::ExpenseVoided { expense_id }, None);
        info!(
            trip = %self.trip_id,
            expense = %expense_id,
            amount = expense.amount.units(),
            "expense voided"
        );
        Ok(expense.clone())
    }

    pub fn expense(&self, expense_id: ExpenseId) -> Option<&Expense> {
        self.index
            .get(&expense_id)
            .map(|position| &self.expenses[*position])
    }

    /// Expenses matching `query`, ordered by ledger sequence.
    pub fn expenses(&self, query: &ExpenseQuery) -> Vec<&Expense> {
        let matching = self
            .expenses
            .iter()
            .filter(|expense| query.matches(expense));
        let limit = query.limit.unwrap_or(usize::MAX);
        if query.ascending {
            matching.take(limit).collect()
        } else {
            let mut all: Vec<&Expense> = matching.collect();
            all.reverse();
            all.truncate(limit);
            all
        }
    }

    /// Snapshot of the current net balances.
    pub fn balances(&self) -> BalanceSheet {
        self.aggregator.sheet().clone()
    }

    pub fn settlement(&self) -> Vec<SettlementTransfer> {
        SettlementPlanner::plan(self.aggregator.sheet())
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Close the ledger; further mutation fails with [`LedgerError::LedgerClosed`].
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        self.state = LedgerState::Closed;
        self.journal.append(LedgerEvent::LedgerClosed, None);
        info!(trip = %self.trip_id, "ledger closed");
    }

    pub fn summary(&self) -> TripSummary {
        let mut paid: BTreeMap<&ParticipantId, i64> = BTreeMap::new();
        let mut owed: BTreeMap<&ParticipantId, i64> = BTreeMap::new();
        let mut categories: BTreeMap<CategoryId, i64> = BTreeMap::new();
        let mut total: i64 = 0;
        let mut count = 0;
        for expense in self.expenses.iter().filter(|expense| expense.is_active()) {
            count += 1;
            let units = expense.amount.units();
            total = total.saturating_add(units);
            let payer = paid.entry(&expense.payer_id).or_default();
            *payer = payer.saturating_add(units);
            let category = categories.entry(expense.category_id).or_default();
            *category = category.saturating_add(units);
            for split in &expense.splits {
                let owes = owed.entry(&split.beneficiary_id).or_default();
                *owes = owes.saturating_add(split.amount_owed.units());
            }
        }

        let participants = self
            .participants
            .values()
            .map(|participant| {
                let paid = paid.get(&participant.id).copied().unwrap_or(0);
                let owed = owed.get(&participant.id).copied().unwrap_or(0);
                ParticipantSummary {
                    participant: participant.id.clone(),
                    name: participant.name.clone(),
                    is_active: participant.is_active,
                    paid: saturate(paid),
                    owed: saturate(owed),
                    net: self.aggregator.sheet().position(&participant.id),
                }
            })
            .collect();

        TripSummary {
            trip_id: self.trip_id,
            state: self.state,
            expense_count: count,
            total_spent: saturate(total),
            participants,
            categories: categories
                .into_iter()
                .map(|(category, units)| (category, saturate(units)))
                .collect(),
        }
    }

    fn ensure_open(&self) -> LedgerResult<()> {
        if self.is_closed() {
            return Err(LedgerError::LedgerClosed(self.trip_id));
        }
        Ok(())
    }

    fn ensure_active(&self, id: &ParticipantId) -> LedgerResult<()> {
        match self.participants.get(id) {
            Some(participant) if participant.is_active => Ok(()),
            _ => Err(LedgerError::UnknownParticipant(id.clone())),
        }
    }
}

/// Totals are reporting figures; clamp them rather than fail the whole summary.
fn saturate(units: i64) -> Money {
    Money::new(units.clamp(-Money::MAX_SAFE, Money::MAX_SAFE)).unwrap_or(Money::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ledger() -> TripLedger {
        TripLedger::with_participants(
            TripId::new(),
            ["a", "b", "c"].map(|name| Participant::new(name, name.to_uppercase())),
        )
        .unwrap()
    }

    fn id(name: &str) -> ParticipantId {
        ParticipantId::from(name)
    }

    fn titles(ledger: &TripLedger, query: ExpenseQuery) -> Vec<String> {
        ledger
            .expenses(&query)
            .iter()
            .map(|expense| expense.title.clone())
            .collect()
    }

    fn record_on(
        ledger: &mut TripLedger,
        payer: &str,
        beneficiaries: &[&str],
        category: u32,
        day: u32,
        title: &str,
    ) -> Expense {
        let trip = ledger.trip_id();
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let beneficiaries = beneficiaries.iter().copied();
        let command = CreateExpenseCommand::new(trip, payer, beneficiaries, 10, title)
            .with_category(category)
            .with_expense_date(date);
        ledger.add_expense(command).unwrap()
    }

    #[test]
    fn records_expense_with_splits() {
        let mut ledger = ledger();
        let trip = ledger.trip_id();
        let command = CreateExpenseCommand::new(trip, "a", ["a", "b", "c"], 100, "Cena");
        let expense = ledger.add_expense(command).unwrap();
        let owed: Vec<i64> = expense
            .splits
            .iter()
            .map(|split| split.amount_owed.units())
            .collect();
        assert_eq!(owed, [34, 33, 33]);
        assert_eq!(expense.sequence, ledger.version());
        assert!(expense.is_active());
        assert_eq!(ledger.balances().owed(&id("b"), &id("a")).units(), 33);
    }

    #[test]
    fn unknown_or_inactive_participants_are_rejected() {
        let mut ledger = ledger();
        let trip = ledger.trip_id();
        assert_eq!(
            ledger.add_expense(CreateExpenseCommand::new(trip, "z", ["a"], 10, "Taxi")),
            Err(LedgerError::UnknownParticipant(id("z")))
        );
        ledger.deactivate_participant(&id("c")).unwrap();
        assert_eq!(
            ledger.add_expense(CreateExpenseCommand::new(trip, "a", ["c"], 10, "Taxi")),
            Err(LedgerError::UnknownParticipant(id("c")))
        );
        assert!(ledger.participant(&id("c")).is_some());
        assert!(ledger.balances().is_settled());
    }

    #[test]
    fn rejects_command_for_other_trip() {
        let mut ledger = ledger();
        let other = TripId::new();
        assert_eq!(
            ledger.add_expense(CreateExpenseCommand::new(other, "a", ["b"], 10, "Taxi")),
            Err(LedgerError::UnknownTrip(other))
        );
    }

    #[test]
    fn removal_reverses_and_retains_expense() {
        let mut ledger = ledger();
        let trip = ledger.trip_id();
        let command = CreateExpenseCommand::new(trip, "b", ["a", "c"], 50, "Museo");
        let expense = ledger.add_expense(command).unwrap();
        let voided = ledger.remove_expense(expense.id).unwrap();
        assert!(!voided.is_active());
        assert!(ledger.balances().is_settled());
        assert!(ledger.expense(expense.id).is_some());
        assert!(ledger.expenses(&ExpenseQuery::default()).is_empty());
        let everything = ledger.expenses(&ExpenseQuery::default().including_voided());
        assert_eq!(everything.len(), 1);
        assert_eq!(
            ledger.remove_expense(expense.id),
            Err(LedgerError::ExpenseNotFound(expense.id))
        );
    }

    #[test]
    fn closed_ledger_rejects_mutation_but_answers_queries() {
        let mut ledger = ledger();
        let trip = ledger.trip_id();
        let expense = ledger
            .add_expense(CreateExpenseCommand::new(trip, "a", ["b"], 30, "Bus"))
            .unwrap();
        ledger.close();
        ledger.close();
        assert_eq!(
            ledger.add_expense(CreateExpenseCommand::new(trip, "a", ["b"], 30, "Bus")),
            Err(LedgerError::LedgerClosed(trip))
        );
        assert_eq!(
            ledger.remove_expense(expense.id),
            Err(LedgerError::LedgerClosed(trip))
        );
        assert_eq!(
            ledger.add_participant(Participant::new("d", "D")),
            Err(LedgerError::LedgerClosed(trip))
        );
        assert_eq!(ledger.settlement().len(), 1);
        assert_eq!(ledger.state(), LedgerState::Closed);
    }

    #[test]
    fn rejoining_reactivates_participant() {
        let mut ledger = ledger();
        ledger.deactivate_participant(&id("b")).unwrap();
        ledger
            .add_participant(Participant::new("b", "Beto"))
            .unwrap();
        let participant = ledger.participant(&id("b")).unwrap();
        assert!(participant.is_active);
        assert_eq!(participant.name, "Beto");
        assert_eq!(
            ledger.deactivate_participant(&id("nobody")),
            Err(LedgerError::UnknownParticipant(id("nobody")))
        );
    }

    #[test]
    fn summary_reports_paid_owed_and_categories() {
        let mut ledger = ledger();
        let trip = ledger.trip_id();
        let hotel = CreateExpenseCommand::new(trip, "a", ["a", "b", "c"], 90, "Hotel");
        ledger.add_expense(hotel.with_category(1)).unwrap();
        let snack = CreateExpenseCommand::new(trip, "b", ["c"], 20, "Snack");
        ledger.add_expense(snack.with_category(2)).unwrap();
        let summary = ledger.summary();
        assert_eq!(summary.expense_count, 2);
        assert_eq!(summary.total_spent.units(), 110);
        assert_eq!(summary.categories[&CategoryId(1)].units(), 90);
        let a = &summary.participants[0];
        assert_eq!((a.paid.units(), a.owed.units(), a.net.units()), (90, 30, 60));
        let c = &summary.participants[2];
        assert_eq!((c.paid.units(), c.owed.units(), c.net.units()), (0, 50, -50));
        for participant in &summary.participants {
            assert_eq!(
                participant.net.units(),
                participant.paid.units() - participant.owed.units()
            );
        }
    }

    #[test]
    fn expense_query_filters_and_orders() {
        let mut ledger = ledger();
        let trip = ledger.trip_id();
        for (payer, title) in [("a", "uno"), ("b", "dos"), ("a", "tres")] {
            ledger
                .add_expense(CreateExpenseCommand::new(trip, payer, ["c"], 10, title))
                .unwrap();
        }
        let by_a = titles(&ledger, ExpenseQuery::default().with_payer("a"));
        assert_eq!(by_a, ["uno", "tres"]);
        let latest = titles(&ledger, ExpenseQuery::default().descending().with_limit(1));
        assert_eq!(latest, ["tres"]);
    }

    #[test]
    fn expense_query_filters_beneficiary_category_and_dates() {
        let mut ledger = ledger();
        record_on(&mut ledger, "a", &["b", "c"], 1, 1, "Hotel");
        record_on(&mut ledger, "c", &["a"], 2, 2, "Taxi");
        record_on(&mut ledger, "a", &["a", "b"], 1, 3, "Museo");
        let bus = record_on(&mut ledger, "b", &["c"], 2, 4, "Bus");
        ledger.remove_expense(bus.id).unwrap();
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d);
        let query = ExpenseQuery::default;

        // paying for an expense does not make "c" one of its beneficiaries
        assert_eq!(titles(&ledger, query().with_beneficiary("c")), ["Hotel"]);
        let for_b = query().with_beneficiary("b");
        assert_eq!(titles(&ledger, for_b), ["Hotel", "Museo"]);
        let first_category = query().with_category(1);
        assert_eq!(titles(&ledger, first_category), ["Hotel", "Museo"]);
        assert_eq!(titles(&ledger, query().with_category(2)), ["Taxi"]);

        let between = query().with_date_range(day(2), day(3));
        assert_eq!(titles(&ledger, between), ["Taxi", "Museo"]);
        let until_first = query().with_date_range(None, day(1));
        assert_eq!(titles(&ledger, until_first), ["Hotel"]);
        let from_last = query().with_date_range(day(4), None);
        assert!(titles(&ledger, from_last).is_empty());

        let voided_too = query().including_voided();
        let paid_for_c = voided_too.clone().with_beneficiary("c");
        assert_eq!(titles(&ledger, paid_for_c), ["Hotel", "Bus"]);
        let second_category = voided_too.clone().with_category(2);
        assert_eq!(titles(&ledger, second_category), ["Taxi", "Bus"]);
        let last_day = voided_too.with_date_range(day(4), day(4));
        assert_eq!(titles(&ledger, last_day), ["Bus"]);
    }

    #[test]
    fn journal_replay_matches_live_balances() {
        let mut ledger = ledger();
        let trip = ledger.trip_id();
        let tour = CreateExpenseCommand::new(trip, "a", ["b", "c"], 75, "Tour");
        let first = ledger.add_expense(tour).unwrap();
        let water = CreateExpenseCommand::new(trip, "c", ["a", "b", "c"], 31, "Agua");
        ledger.add_expense(water).unwrap();
        ledger.remove_expense(first.id).unwrap();
        assert_eq!(ledger.journal().replay().unwrap(), ledger.balances());
    }
}
