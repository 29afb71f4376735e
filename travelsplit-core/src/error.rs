use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ExpenseId, Money, ParticipantId, TripId};

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error type surfaced by ledger operations.
///
/// Variants carry the offending identifiers only. Transport layers map
/// [`LedgerError::kind`] onto their own status codes and messages; the
/// `Display` output is meant for logs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),
    #[error("non-finite or fractional amount")]
    NonIntegralAmount,
    #[error("amount overflow")]
    AmountOverflow,
    #[error("beneficiary set is empty")]
    EmptyBeneficiarySet,
    #[error("duplicate beneficiary {0}")]
    DuplicateBeneficiary(ParticipantId),
    #[error("unknown participant {0}")]
    UnknownParticipant(ParticipantId),
    #[error("expense {0} not found")]
    ExpenseNotFound(ExpenseId),
    #[error("ledger for trip {0} is closed")]
    LedgerClosed(TripId),
    #[error("unknown trip {0}")]
    UnknownTrip(TripId),
    #[error("expense title is required")]
    MissingTitle,
}

impl LedgerError {
    /// Stable, serialisable classification of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount(_) | LedgerError::NonIntegralAmount => {
                ErrorKind::InvalidAmount
            }
            LedgerError::AmountOverflow => ErrorKind::AmountOverflow,
            LedgerError::EmptyBeneficiarySet => ErrorKind::EmptyBeneficiarySet,
            LedgerError::DuplicateBeneficiary(_) => ErrorKind::DuplicateBeneficiary,
            LedgerError::UnknownParticipant(_) => ErrorKind::UnknownParticipant,
            LedgerError::ExpenseNotFound(_) => ErrorKind::ExpenseNotFound,
            LedgerError::LedgerClosed(_) => ErrorKind::LedgerClosed,
            LedgerError::UnknownTrip(_) => ErrorKind::UnknownTrip,
            LedgerError::MissingTitle => ErrorKind::MissingTitle,
        }
    }

    /// Participant named by the error, if any.
    pub fn participant(&self) -> Option<&ParticipantId> {
        match self {
            LedgerError::DuplicateBeneficiary(id) | LedgerError::UnknownParticipant(id) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn invalid(amount: Money) -> Self {
        LedgerError::InvalidAmount(amount.units())
    }
}

/// Error classification exposed to collaborators.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidAmount,
    AmountOverflow,
    EmptyBeneficiarySet,
    DuplicateBeneficiary,
    UnknownParticipant,
    ExpenseNotFound,
    LedgerClosed,
    UnknownTrip,
    MissingTitle,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidAmount => "invalid_amount",
            ErrorKind::AmountOverflow => "amount_overflow",
            ErrorKind::EmptyBeneficiarySet => "empty_beneficiary_set",
            ErrorKind::DuplicateBeneficiary => "duplicate_beneficiary",
            ErrorKind::UnknownParticipant => "unknown_participant",
            ErrorKind::ExpenseNotFound => "expense_not_found",
            ErrorKind::LedgerClosed => "ledger_closed",
            ErrorKind::UnknownTrip => "unknown_trip",
            ErrorKind::MissingTitle => "missing_title",
        }
    }
}
