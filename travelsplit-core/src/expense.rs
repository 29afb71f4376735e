use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    CategoryId, ExpenseId, LedgerError, LedgerResult, Money, ParticipantId, SplitId, TripId,
};

/// Request to record a new expense on a trip.
///
/// Mirrors the JSON body accepted by the expenses endpoint. Nothing here is
/// trusted until [`CreateExpenseCommand::validate`] succeeds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateExpenseCommand {
    pub trip_id: TripId,
    pub payer_id: ParticipantId,
    pub beneficiary_ids: Vec<ParticipantId>,
    pub amount: i64,
    #[serde(default)]
    pub category_id: CategoryId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_date: Option<NaiveDate>,
}

impl CreateExpenseCommand {
    pub fn new(
        trip_id: TripId,
        payer_id: impl Into<ParticipantId>,
        beneficiary_ids: impl IntoIterator<Item = impl Into<ParticipantId>>,
        amount: i64,
        title: impl Into<String>,
    ) -> Self {
        Self {
            trip_id,
            payer_id: payer_id.into(),
            beneficiary_ids: beneficiary_ids.into_iter().map(Into::into).collect(),
            amount,
            category_id: CategoryId::default(),
            title: title.into(),
            receipt_url: None,
            expense_date: None,
        }
    }

    pub fn with_category(mut self, category_id: impl Into<CategoryId>) -> Self {
        self.category_id = category_id.into();
        self
    }

    pub fn with_expense_date(mut self, date: NaiveDate) -> Self {
        self.expense_date = Some(date);
        self
    }

    pub fn with_receipt_url(mut self, url: impl Into<String>) -> Self {
        self.receipt_url = Some(url.into());
        self
    }

    /// Check the shape of the request without consulting trip membership.
    ///
    /// `max_amount` caps the accepted amount below [`Money::MAX_SAFE`] when a
    /// deployment configures a tighter limit.
    pub fn validate(&self, max_amount: Money) -> LedgerResult<Money> {
        if self.title.trim().is_empty() {
            return Err(LedgerError::MissingTitle);
        }
        let amount = Money::positive(self.amount)?;
        if amount > max_amount {
            return Err(LedgerError::AmountOverflow);
        }
        if self.beneficiary_ids.is_empty() {
            return Err(LedgerError::EmptyBeneficiarySet);
        }
        let mut seen = HashSet::with_capacity(self.beneficiary_ids.len());
        for id in &self.beneficiary_ids {
            if !seen.insert(id) {
                return Err(LedgerError::DuplicateBeneficiary(id.clone()));
            }
        }
        Ok(amount)
    }
}

/// One beneficiary's owed share of an expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSplit {
    pub id: SplitId,
    pub expense_id: ExpenseId,
    pub beneficiary_id: ParticipantId,
    pub amount_owed: Money,
    pub created_at: DateTime<Utc>,
}

/// Recorded expense together with the splits derived for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub trip_id: TripId,
    /// Ledger sequence assigned when the expense was recorded.
    pub sequence: u64,
    pub payer_id: ParticipantId,
    pub category_id: CategoryId,
    pub title: String,
    pub amount: Money,
    pub receipt_url: Option<String>,
    pub expense_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
    pub splits: Vec<ExpenseSplit>,
}

impl Expense {
    /// Whether the expense still contributes to balances.
    pub fn is_active(&self) -> bool {
        self.voided_at.is_none()
    }

    pub fn split_for(&self, beneficiary: &ParticipantId) -> Option<&ExpenseSplit> {
        self.splits
            .iter()
            .find(|split| &split.beneficiary_id == beneficiary)
    }
}
