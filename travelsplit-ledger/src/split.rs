use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use travelsplit_core::{LedgerError, LedgerResult, Money, ParticipantId};

/// Amount a single beneficiary owes for one expense.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeneficiaryShare {
    pub beneficiary: ParticipantId,
    pub amount: Money,
}

/// Computes per-beneficiary shares with exact remainder distribution.
///
/// Shares are returned in the caller's beneficiary order and always add up to
/// the requested amount.
pub struct SplitCalculator;

impl SplitCalculator {
    /// Equal split: every beneficiary owes `floor(amount / n)` and the first
    /// `amount % n` beneficiaries owe one extra unit.
    pub fn compute_splits(
        amount: Money,
        beneficiaries: &[ParticipantId],
    ) -> LedgerResult<Vec<BeneficiaryShare>> {
        check_amount(amount)?;
        check_beneficiaries(beneficiaries.iter())?;

        let count = beneficiaries.len() as i64;
        let base = amount.units() / count;
        let remainder = (amount.units() - base * count) as usize;
        beneficiaries
            .iter()
            .enumerate()
            .map(|(idx, beneficiary)| {
                let units = if idx < remainder { base + 1 } else { base };
                Ok(BeneficiaryShare {
                    beneficiary: beneficiary.clone(),
                    amount: Money::new(units)?,
                })
            })
            .collect()
    }

    /// Weighted split using [`Money::distribute`].
    pub fn compute_weighted_splits(
        amount: Money,
        weights: &[(ParticipantId, u64)],
    ) -> LedgerResult<Vec<BeneficiaryShare>> {
        check_amount(amount)?;
        check_beneficiaries(weights.iter().map(|(id, _)| id))?;

        let raw: Vec<u64> = weights.iter().map(|(_, weight)| *weight).collect();
        let shares = Money::distribute(amount, &raw)?;
        Ok(weights
            .iter()
            .zip(shares)
            .map(|((beneficiary, _), amount)| BeneficiaryShare {
                beneficiary: beneficiary.clone(),
                amount,
            })
            .collect())
    }
}

fn check_amount(amount: Money) -> LedgerResult<()> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount(amount.units()));
    }
    Ok(())
}

fn check_beneficiaries<'a, I>(beneficiaries: I) -> LedgerResult<()>
where
    I: ExactSizeIterator<Item = &'a ParticipantId>,
{
    if beneficiaries.len() == 0 {
        return Err(LedgerError::EmptyBeneficiarySet);
    }
    let mut seen = HashSet::with_capacity(beneficiaries.len());
    for id in beneficiaries {
        if !seen.insert(id) {
            return Err(LedgerError::DuplicateBeneficiary(id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ParticipantId> {
        names.iter().copied().map(ParticipantId::from).collect()
    }

    fn amounts(shares: &[BeneficiaryShare]) -> Vec<i64> {
        shares.iter().map(|share| share.amount.units()).collect()
    }

    #[test]
    fn remainder_goes_to_leading_beneficiaries() {
        let amount = Money::new(10).unwrap();
        let shares = SplitCalculator::compute_splits(amount, &ids(&["x", "y", "z"])).unwrap();
        assert_eq!(amounts(&shares), [4, 3, 3]);
        assert_eq!(shares[0].beneficiary, ParticipantId::from("x"));
    }

    #[test]
    fn caller_order_decides_who_absorbs_remainder() {
        let amount = Money::new(100).unwrap();
        let shares = SplitCalculator::compute_splits(amount, &ids(&["c", "a", "b"])).unwrap();
        assert_eq!(shares[0].beneficiary, ParticipantId::from("c"));
        assert_eq!(amounts(&shares), [34, 33, 33]);
    }

    #[test]
    fn amount_smaller_than_group_leaves_zero_shares() {
        let amount = Money::new(2).unwrap();
        let beneficiaries = ids(&["a", "b", "c", "d"]);
        let shares = SplitCalculator::compute_splits(amount, &beneficiaries).unwrap();
        assert_eq!(amounts(&shares), [1, 1, 0, 0]);
    }

    #[test]
    fn rejects_malformed_requests() {
        let amount = Money::new(10).unwrap();
        assert_eq!(
            SplitCalculator::compute_splits(amount, &[]),
            Err(LedgerError::EmptyBeneficiarySet)
        );
        assert_eq!(
            SplitCalculator::compute_splits(amount, &ids(&["a", "b", "a"])),
            Err(LedgerError::DuplicateBeneficiary(ParticipantId::from("a")))
        );
        assert_eq!(
            SplitCalculator::compute_splits(Money::ZERO, &ids(&["a"])),
            Err(LedgerError::InvalidAmount(0))
        );
    }

    #[test]
    fn weighted_split_conserves_amount() {
        let weights = vec![
            (ParticipantId::from("a"), 2),
            (ParticipantId::from("b"), 1),
            (ParticipantId::from("c"), 1),
        ];
        let amount = Money::new(101).unwrap();
        let shares = SplitCalculator::compute_weighted_splits(amount, &weights).unwrap();
        assert_eq!(amounts(&shares), [51, 25, 25]);
    }
}
