use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use travelsplit_core::{Money, ParticipantId, SettlementTransfer};

use crate::BalanceSheet;

/// Outstanding amount keyed so the heap pops the largest amount first and,
/// among equal amounts, the smallest participant id.
type Outstanding = (Money, Reverse<ParticipantId>);

/// Greedy settlement planner.
///
/// Repeatedly pairs the largest net debtor with the largest net creditor and
/// transfers the smaller of the two amounts. This is a deterministic
/// heuristic that usually yields few transfers; it does not guarantee the
/// minimum transfer count for every distribution of balances.
pub struct SettlementPlanner;

impl SettlementPlanner {
    pub fn plan(sheet: &BalanceSheet) -> Vec<SettlementTransfer> {
        Self::plan_positions(sheet.positions())
    }

    /// Plan transfers for explicit net positions (positive = creditor).
    ///
    /// Positions are expected to sum to zero; any residue left once one side
    /// runs out is not transferred.
    pub fn plan_positions(positions: &BTreeMap<ParticipantId, Money>) -> Vec<SettlementTransfer> {
        let mut debtors: BinaryHeap<Outstanding> = BinaryHeap::new();
        let mut creditors: BinaryHeap<Outstanding> = BinaryHeap::new();
        for (participant, position) in positions {
            if position.is_negative() {
                debtors.push((position.abs(), Reverse(participant.clone())));
            } else if position.is_positive() {
                creditors.push((*position, Reverse(participant.clone())));
            }
        }

        let mut transfers = Vec::with_capacity(debtors.len().max(creditors.len()));
        while let (Some((debt, Reverse(debtor))), Some((credit, Reverse(creditor)))) =
            (debtors.peek().cloned(), creditors.peek().cloned())
        {
            debtors.pop();
            creditors.pop();
            let amount = debt.min(credit);
            let remaining_debt = debt.outstanding_after(amount);
            let remaining_credit = credit.outstanding_after(amount);
            transfers.push(SettlementTransfer {
                from: debtor.clone(),
                to: creditor.clone(),
                amount,
            });
            if !remaining_debt.is_zero() {
                debtors.push((remaining_debt, Reverse(debtor)));
            }
            if !remaining_credit.is_zero() {
                creditors.push((remaining_credit, Reverse(creditor)));
            }
        }
        transfers
    }

    /// Positions left after every transfer has been paid.
    pub fn apply(
        positions: &BTreeMap<ParticipantId, Money>,
        transfers: &[SettlementTransfer],
    ) -> BTreeMap<ParticipantId, i128> {
        let mut remaining: BTreeMap<ParticipantId, i128> = positions
            .iter()
            .map(|(id, money)| (id.clone(), money.units() as i128))
            .collect();
        for transfer in transfers {
            let units = transfer.amount.units() as i128;
            *remaining.entry(transfer.from.clone()).or_default() += units;
            *remaining.entry(transfer.to.clone()).or_default() -= units;
        }
        remaining
    }
}
