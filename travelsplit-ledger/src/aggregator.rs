use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use travelsplit_core::{Expense, LedgerResult, Money, ParticipantId};

use crate::BeneficiaryShare;

/// Canonical (lo, hi) participant pair; `lo < hi` always holds.
type PairKey = (ParticipantId, ParticipantId);

/// Directional debt between two participants.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Debt {
    pub debtor: ParticipantId,
    pub creditor: ParticipantId,
    pub amount: Money,
}

/// Net pairwise balances and per-participant positions for a trip.
///
/// Each unordered pair keeps a single signed value: positive means the
/// higher id owes the lower id. Positions are positive for net creditors.
/// Zero entries are pruned, so two sheets describing the same obligations
/// compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalanceSheet {
    pairs: BTreeMap<PairKey, Money>,
    positions: BTreeMap<ParticipantId, Money>,
}

impl BalanceSheet {
    /// Net amount `debtor` owes `creditor`; negative when the debt runs the other way.
    pub fn owed(&self, debtor: &ParticipantId, creditor: &ParticipantId) -> Money {
        if debtor == creditor {
            return Money::ZERO;
        }
        if debtor > creditor {
            self.pair_value(creditor, debtor)
        } else {
            -self.pair_value(debtor, creditor)
        }
    }

    /// All non-zero debts, ordered by debtor then creditor.
    pub fn debts(&self) -> Vec<Debt> {
        let mut debts: Vec<Debt> = self
            .pairs
            .iter()
            .map(|((lo, hi), value)| {
                if value.is_positive() {
                    Debt {
                        debtor: hi.clone(),
                        creditor: lo.clone(),
                        amount: *value,
                    }
                } else {
                    Debt {
                        debtor: lo.clone(),
                        creditor: hi.clone(),
                        amount: value.abs(),
                    }
                }
            })
            .collect();
        debts.sort_by(|a, b| (&a.debtor, &a.creditor).cmp(&(&b.debtor, &b.creditor)));
        debts
    }

    /// Net position of a participant: positive when others owe them.
    pub fn position(&self, participant: &ParticipantId) -> Money {
        self.positions
            .get(participant)
            .copied()
            .unwrap_or(Money::ZERO)
    }

    /// Non-zero net positions keyed by participant.
    pub fn positions(&self) -> &BTreeMap<ParticipantId, Money> {
        &self.positions
    }

    /// Sum of every signed position; zero for any consistent sheet.
    pub fn net_total(&self) -> i128 {
        self.positions
            .values()
            .map(|money| money.units() as i128)
            .sum()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_settled(&self) -> bool {
        self.pairs.is_empty() && self.positions.is_empty()
    }

    fn pair_value(&self, lo: &ParticipantId, hi: &ParticipantId) -> Money {
        self.pairs
            .get(&(lo.clone(), hi.clone()))
            .copied()
            .unwrap_or(Money::ZERO)
    }
}

/// Folds expense splits into a [`BalanceSheet`] incrementally.
///
/// Applying or reversing an expense touches only the pairs of its
/// beneficiaries. Updates are staged first and committed only when every
/// checked addition succeeded, so a failed update leaves the sheet untouched.
#[derive(Clone, Debug, Default)]
pub struct LedgerAggregator {
    sheet: BalanceSheet,
}

impl LedgerAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sheet from scratch, ignoring voided expenses.
    pub fn aggregate<'a, I>(expenses: I) -> LedgerResult<BalanceSheet>
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        let mut aggregator = Self::new();
        for expense in expenses {
            if expense.is_active() {
                aggregator.apply(expense)?;
            }
        }
        Ok(aggregator.sheet)
    }

    pub fn apply(&mut self, expense: &Expense) -> LedgerResult<()> {
        self.post(&expense.payer_id, expense_shares(expense), Direction::Apply)
    }

    /// Subtract exactly what [`LedgerAggregator::apply`] added for this expense.
    pub fn reverse(&mut self, expense: &Expense) -> LedgerResult<()> {
        self.post(&expense.payer_id, expense_shares(expense), Direction::Reverse)
    }

    pub fn apply_shares(
        &mut self,
        payer: &ParticipantId,
        shares: &[BeneficiaryShare],
    ) -> LedgerResult<()> {
        self.post(
            payer,
            shares.iter().map(|share| (&share.beneficiary, share.amount)),
            Direction::Apply,
        )
    }

    pub fn reverse_shares(
        &mut self,
        payer: &ParticipantId,
        shares: &[BeneficiaryShare],
    ) -> LedgerResult<()> {
        self.post(
            payer,
            shares.iter().map(|share| (&share.beneficiary, share.amount)),
            Direction::Reverse,
        )
    }

    pub fn sheet(&self) -> &BalanceSheet {
        &self.sheet
    }

    pub fn into_sheet(self) -> BalanceSheet {
        self.sheet
    }

    fn post<'a, I>(
        &mut self,
        payer: &ParticipantId,
        shares: I,
        direction: Direction,
    ) -> LedgerResult<()>
    where
        I: IntoIterator<Item = (&'a ParticipantId, Money)>,
    {
        let mut staged_pairs: BTreeMap<PairKey, Money> = BTreeMap::new();
        let mut staged_positions: BTreeMap<ParticipantId, Money> = BTreeMap::new();

        for (beneficiary, owed) in shares {
            if beneficiary == payer || owed.is_zero() {
                continue;
            }
            let owed = match direction {
                Direction::Apply => owed,
                Direction::Reverse => -owed,
            };

            // beneficiary owes payer `owed`
            let (key, delta) = if payer < beneficiary {
                ((payer.clone(), beneficiary.clone()), owed)
            } else {
                ((beneficiary.clone(), payer.clone()), -owed)
            };
            let current = staged_pairs
                .get(&key)
                .copied()
                .unwrap_or_else(|| self.sheet.pair_value(&key.0, &key.1));
            staged_pairs.insert(key, current.checked_add(delta)?);

            let credit = staged_positions
                .get(payer)
                .copied()
                .unwrap_or_else(|| self.sheet.position(payer));
            staged_positions.insert(payer.clone(), credit.checked_add(owed)?);

            let debit = staged_positions
                .get(beneficiary)
                .copied()
                .unwrap_or_else(|| self.sheet.position(beneficiary));
            staged_positions.insert(beneficiary.clone(), debit.checked_sub(owed)?);
        }

        for (key, value) in staged_pairs {
            if value.is_zero() {
                self.sheet.pairs.remove(&key);
            } else {
                self.sheet.pairs.insert(key, value);
            }
        }
        for (participant, value) in staged_positions {
            if value.is_zero() {
                self.sheet.positions.remove(&participant);
            } else {
                self.sheet.positions.insert(participant, value);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
enum Direction {
    Apply,
    Reverse,
}

fn expense_shares(expense: &Expense) -> impl Iterator<Item = (&ParticipantId, Money)> {
    expense
        .splits
        .iter()
        .map(|split| (&split.beneficiary_id, split.amount_owed))
}
