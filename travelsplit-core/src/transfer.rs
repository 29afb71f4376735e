use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Money, ParticipantId};

/// Suggested payment from a net debtor to a net creditor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementTransfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Money,
}

impl SettlementTransfer {
    pub fn new(
        from: impl Into<ParticipantId>,
        to: impl Into<ParticipantId>,
        amount: Money,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
}

impl fmt::Display for SettlementTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.amount)
    }
}
