//! Whole-unit currency amounts.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{LedgerError, LedgerResult};

/// Currency amount in whole units (COP has no subunits).
///
/// Every value stays within `±MAX_SAFE` so amounts survive a round trip
/// through any JSON number representation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub struct Money(i64);

impl Money {
    /// Largest magnitude representable exactly as an IEEE-754 double.
    pub const MAX_SAFE: i64 = (1 << 53) - 1;
    pub const ZERO: Money = Money(0);
    pub const ONE: Money = Money(1);
    pub const MAX: Money = Money(Self::MAX_SAFE);

    /// Build an amount, rejecting values outside the safe range.
    pub fn new(units: i64) -> LedgerResult<Self> {
        if units.unsigned_abs() > Self::MAX_SAFE as u64 {
            return Err(LedgerError::AmountOverflow);
        }
        Ok(Self(units))
    }

    /// Build a strictly positive amount.
    pub fn positive(units: i64) -> LedgerResult<Self> {
        if units <= 0 {
            return Err(LedgerError::InvalidAmount(units));
        }
        Self::new(units)
    }

    /// Convert a boundary float, rejecting NaN, infinities and fractions.
    pub fn try_from_f64(value: f64) -> LedgerResult<Self> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(LedgerError::NonIntegralAmount);
        }
        if value.abs() > Self::MAX_SAFE as f64 {
            return Err(LedgerError::AmountOverflow);
        }
        Self::new(value as i64)
    }

    pub const fn units(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Money {
        Money(self.0.abs())
    }

    pub fn checked_add(self, other: Money) -> LedgerResult<Money> {
        Self::new(self.0 + other.0)
    }

    pub fn checked_sub(self, other: Money) -> LedgerResult<Money> {
        Self::new(self.0 - other.0)
    }

    /// Balance left after paying `paid` towards `self`, floored at zero.
    pub fn outstanding_after(self, paid: Money) -> Money {
        Money((self.0 - paid.0).max(0))
    }

    /// Sum a sequence of amounts, failing once the running total leaves the safe range.
    pub fn checked_sum<I>(amounts: I) -> LedgerResult<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Split `total` proportionally to `weights`.
    ///
    /// Each share starts at `floor(total * w / W)`. The units lost to flooring
    /// go one at a time to the largest fractional remainders, ties resolved by
    /// position, so equal weights hand the extra units to the first entries.
    pub fn distribute(total: Money, weights: &[u64]) -> LedgerResult<Vec<Money>> {
        if weights.is_empty() {
            return Err(LedgerError::EmptyBeneficiarySet);
        }
        if total.is_negative() {
            return Err(LedgerError::invalid(total));
        }
        let weight_sum: u128 = weights.iter().map(|w| *w as u128).sum();
        if weight_sum == 0 {
            return Err(LedgerError::InvalidAmount(0));
        }

        let total_units = total.0 as u128;
        let mut shares = Vec::with_capacity(weights.len());
        let mut remainders = Vec::with_capacity(weights.len());
        let mut allocated: u128 = 0;
        for (idx, weight) in weights.iter().enumerate() {
            let numerator = total_units * (*weight as u128);
            let share = numerator / weight_sum;
            allocated += share;
            shares.push(share);
            remainders.push((numerator % weight_sum, idx));
        }

        // Largest remainder first, earliest position on ties.
        remainders.sort_by(|a, b| match b.0.cmp(&a.0) {
            Ordering::Equal => a.1.cmp(&b.1),
            other => other,
        });
        let leftover = (total_units - allocated) as usize;
        for (_, idx) in remainders.into_iter().take(leftover) {
            shares[idx] += 1;
        }

        shares
            .into_iter()
            .map(|share| Money::new(share as i64))
            .collect()
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl TryFrom<i64> for Money {
    type Error = LedgerError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl fmt::Display for Money {
    /// Renders the COP convention: `$ 25.000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (idx, ch) in digits.chars().enumerate() {
            if idx > 0 && (digits.len() - idx) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        f.pad(&format!("{sign}$ {grouped}"))
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    /// Accepts `25000`, `25.000`, `$ 25.000` and a leading `-`.
    ///
    /// Dots are thousands separators only: every group after the first must
    /// hold exactly three digits, so `12.50` is rejected rather than read as
    /// `1250`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').map_or(rest, str::trim_start);

        let mut groups = rest.split('.');
        let head = groups.next().unwrap_or_default();
        let mut digits = head.to_string();
        let mut grouped = false;
        for group in groups {
            if group.len() != 3 {
                return Err(LedgerError::NonIntegralAmount);
            }
            grouped = true;
            digits.push_str(group);
        }
        let head_ok = !head.is_empty() && (!grouped || head.len() <= 3);
        if !head_ok || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LedgerError::NonIntegralAmount);
        }

        let units: i64 = digits.parse().map_err(|_| LedgerError::AmountOverflow)?;
        Money::new(if negative { -units } else { units })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(values: &[Money]) -> Vec<i64> {
        values.iter().map(|m| m.units()).collect()
    }

    #[test]
    fn rejects_values_outside_safe_range() {
        assert!(Money::new(Money::MAX_SAFE).is_ok());
        let too_large = Money::MAX_SAFE + 1;
        assert_eq!(Money::new(too_large), Err(LedgerError::AmountOverflow));
        assert_eq!(Money::new(-too_large), Err(LedgerError::AmountOverflow));
        assert_eq!(
            Money::MAX.checked_add(Money::ONE),
            Err(LedgerError::AmountOverflow)
        );
    }

    #[test]
    fn positive_rejects_zero_and_negatives() {
        assert_eq!(Money::positive(0), Err(LedgerError::InvalidAmount(0)));
        assert_eq!(Money::positive(-5), Err(LedgerError::InvalidAmount(-5)));
        assert_eq!(Money::positive(25_000).unwrap().units(), 25_000);
    }

    #[test]
    fn float_conversion_requires_whole_finite_values() {
        assert_eq!(Money::try_from_f64(1500.0).unwrap().units(), 1500);
        assert_eq!(
            Money::try_from_f64(10.5),
            Err(LedgerError::NonIntegralAmount)
        );
        assert_eq!(
            Money::try_from_f64(f64::NAN),
            Err(LedgerError::NonIntegralAmount)
        );
        assert_eq!(
            Money::try_from_f64(f64::INFINITY),
            Err(LedgerError::NonIntegralAmount)
        );
        assert_eq!(Money::try_from_f64(1e17), Err(LedgerError::AmountOverflow));
    }

    #[test]
    fn distributes_equal_weights_to_first_entries() {
        let ten = Money::new(10).unwrap();
        let shares = Money::distribute(ten, &[1, 1, 1]).unwrap();
        assert_eq!(units(&shares), [4, 3, 3]);

        let eleven = Money::new(11).unwrap();
        let shares = Money::distribute(eleven, &[1, 1, 1]).unwrap();
        assert_eq!(units(&shares), [4, 4, 3]);
    }

    #[test]
    fn distributes_by_largest_remainder() {
        // 100 * [1, 2] / 3 = 33.33, 66.67 -> the second share takes the spare unit.
        let hundred = Money::new(100).unwrap();
        let shares = Money::distribute(hundred, &[1, 2]).unwrap();
        assert_eq!(units(&shares), [33, 67]);

        let seven = Money::new(7).unwrap();
        let shares = Money::distribute(seven, &[0, 1, 1]).unwrap();
        assert_eq!(units(&shares), [0, 4, 3]);
    }

    #[test]
    fn distribute_rejects_degenerate_weights() {
        let total = Money::new(10).unwrap();
        assert_eq!(
            Money::distribute(total, &[]),
            Err(LedgerError::EmptyBeneficiarySet)
        );
        assert_eq!(
            Money::distribute(total, &[0, 0]),
            Err(LedgerError::InvalidAmount(0))
        );
    }

    #[test]
    fn formats_with_thousands_separator() {
        assert_eq!(Money::new(25_000).unwrap().to_string(), "$ 25.000");
        assert_eq!(Money::new(1_234_567).unwrap().to_string(), "$ 1.234.567");
        assert_eq!(Money::new(999).unwrap().to_string(), "$ 999");
        assert_eq!(Money::ZERO.to_string(), "$ 0");
        assert_eq!(Money::new(-4_500).unwrap().to_string(), "-$ 4.500");
    }

    #[test]
    fn parses_formatted_amounts() {
        assert_eq!("$ 25.000".parse::<Money>().unwrap().units(), 25_000);
        assert_eq!("25000".parse::<Money>().unwrap().units(), 25_000);
        assert_eq!("-$ 4.500".parse::<Money>().unwrap().units(), -4_500);
        assert_eq!("1.234.567".parse::<Money>().unwrap().units(), 1_234_567);
        assert_eq!("12.500".parse::<Money>().unwrap().units(), 12_500);
        assert!("12,50".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
        assert!("$".parse::<Money>().is_err());
    }

    #[test]
    fn parsing_rejects_decimal_looking_input() {
        for input in ["12.50", "1.5", "25000.000", ".500", "1..000", "1.2345"] {
            assert_eq!(
                input.parse::<Money>(),
                Err(LedgerError::NonIntegralAmount),
                "{input}"
            );
        }
    }

    #[test]
    fn serde_enforces_range() {
        let parsed: Money = serde_json::from_str("1500").unwrap();
        assert_eq!(parsed.units(), 1500);
        assert!(serde_json::from_str::<Money>("9007199254740992").is_err());
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "1500");
    }

    #[test]
    fn negation_stays_in_range() {
        assert_eq!((-Money::MAX).units(), -Money::MAX_SAFE);
        assert_eq!(-Money::ONE, Money::new(-1).unwrap());
        assert_eq!(format!("{:>8}", Money::new(1500).unwrap()), " $ 1.500");
    }
}
