use chrono::NaiveDate;
use travelsplit_core::{CategoryId, Expense, ParticipantId};

/// Filter describing which expenses to list from a trip ledger.
#[derive(Clone, Debug)]
pub struct ExpenseQuery {
    pub payer: Option<ParticipantId>,
    pub beneficiary: Option<ParticipantId>,
    pub category: Option<CategoryId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub include_voided: bool,
    pub limit: Option<usize>,
    pub ascending: bool,
}

impl Default for ExpenseQuery {
    fn default() -> Self {
        Self {
            payer: None,
            beneficiary: None,
            category: None,
            start_date: None,
            end_date: None,
            include_voided: false,
            limit: None,
            ascending: true,
        }
    }
}

impl ExpenseQuery {
    pub fn with_payer(mut self, payer: impl Into<ParticipantId>) -> Self {
        self.payer = Some(payer.into());
        self
    }

    pub fn with_beneficiary(mut self, beneficiary: impl Into<ParticipantId>) -> Self {
        self.beneficiary = Some(beneficiary.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<CategoryId>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn including_voided(mut self) -> Self {
        self.include_voided = true;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn descending(mut self) -> Self {
        self.ascending = false;
        self
    }

    /// Whether an expense passes every filter (ordering and limit aside).
    pub fn matches(&self, expense: &Expense) -> bool {
        if !self.include_voided && !expense.is_active() {
            return false;
        }
        if let Some(payer) = &self.payer {
            if &expense.payer_id != payer {
                return false;
            }
        }
        if let Some(beneficiary) = &self.beneficiary {
            if expense.split_for(beneficiary).is_none() {
                return false;
            }
        }
        if let Some(category) = self.category {
            if expense.category_id != category {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if expense.expense_date < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if expense.expense_date > end {
                return false;
            }
        }
        true
    }
}
