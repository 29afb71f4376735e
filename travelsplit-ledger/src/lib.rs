//! Expense splitting, balance aggregation and settlement planning for
//! TravelSplit trips.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `split` | Equal and weighted splits with exact remainder handling |
//! | `aggregator` | Incremental net pairwise balances |
//! | `planner` | Greedy debtor/creditor settlement plan |
//! | `trip` | Per-trip ledger facade and lifecycle |
//! | `shared` / `registry` | Thread-safe access and lookup by trip id |
//! | `journal` | Sequenced audit log with replay |

mod aggregator;
mod entry;
mod journal;
mod planner;
mod query;
mod registry;
mod sequencer;
mod shared;
mod split;
mod trip;

pub use aggregator::{BalanceSheet, Debt, LedgerAggregator};
pub use entry::{LedgerEntry, LedgerEntryType, LedgerEvent};
pub use journal::Journal;
pub use planner::SettlementPlanner;
pub use query::ExpenseQuery;
pub use registry::TripRegistry;
pub use sequencer::LedgerSequencer;
pub use shared::{BalanceReport, LedgerSnapshot, SharedTripLedger};
pub use split::{BeneficiaryShare, SplitCalculator};
pub use trip::{LedgerState, ParticipantSummary, TripLedger, TripSummary};
