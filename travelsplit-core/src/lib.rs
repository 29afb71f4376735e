//! Core domain types shared by the TravelSplit ledger crates.

mod error;
mod expense;
mod ids;
mod money;
mod participant;
mod transfer;

pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use expense::{CreateExpenseCommand, Expense, ExpenseSplit};
pub use ids::{CategoryId, ExpenseId, ParticipantId, SplitId, TripId};
pub use money::Money;
pub use participant::{Participant, ParticipantRole};
pub use transfer::SettlementTransfer;
