use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use travelsplit_config::{load_config, AppConfig, OutputFormat};
use travelsplit_core::{LedgerError, Money, ParticipantId};
use travelsplit_ledger::{
    BalanceReport, ExpenseQuery, SettlementPlanner, SharedTripLedger, SplitCalculator,
};

use crate::render;
use crate::scenario::{LoadedTrip, Scenario};
use crate::telemetry::init_tracing;

#[derive(Parser)]
#[command(
    name = "travelsplit",
    version,
    about = "Split shared trip expenses and plan who pays whom"
)]
pub struct Cli {
    /// Directory holding default.toml and per-environment overrides
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,
    /// Environment overlay to load (e.g. `staging` loads staging.toml)
    #[arg(long, global = true)]
    env: Option<String>,
    /// Override the configured output format
    #[arg(long, global = true, value_enum)]
    format: Option<FormatArg>,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show how an amount splits between beneficiaries
    Split {
        /// Whole units, optionally grouped as `25.000` or `$ 25.000`
        #[arg(long, allow_hyphen_values = true)]
        amount: Money,
        #[arg(long = "beneficiary", required = true)]
        beneficiaries: Vec<ParticipantId>,
        /// Relative weights, one per beneficiary, for an unequal split
        #[arg(long = "weight")]
        weights: Vec<u64>,
    },
    /// Net pairwise balances of a trip scenario
    Balances {
        #[arg(long)]
        trip: PathBuf,
    },
    /// Transfers that settle every balance of a trip scenario
    Settle {
        #[arg(long)]
        trip: PathBuf,
    },
    /// Per-participant spending totals
    Summary {
        #[arg(long)]
        trip: PathBuf,
    },
    /// Replay a scenario and verify that its ledger is consistent
    Check {
        #[arg(long)]
        trip: PathBuf,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Table,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config_dir, cli.env.as_deref())?;
    init_tracing(&config.telemetry, cli.verbose);
    debug!(config_dir = %cli.config_dir.display(), env = ?cli.env, "configuration loaded");

    let format = cli
        .format
        .map(OutputFormat::from)
        .unwrap_or(config.output.format);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli.command, &config, format, &mut out)?;
    out.flush()?;
    Ok(())
}

fn execute<W: Write>(
    command: Commands,
    config: &AppConfig,
    format: OutputFormat,
    out: &mut W,
) -> Result<()> {
    let max_amount = config.ledger.max_amount()?;
    match command {
        Commands::Split {
            amount,
            beneficiaries,
            weights,
        } => {
            let amount = Money::positive(amount.units())?;
            if amount > max_amount {
                return Err(LedgerError::AmountOverflow.into());
            }
            let shares = if weights.is_empty() {
                SplitCalculator::compute_splits(amount, &beneficiaries)?
            } else {
                if weights.len() != beneficiaries.len() {
                    bail!(
                        "expected {} weight(s), one per beneficiary, got {}",
                        beneficiaries.len(),
                        weights.len()
                    );
                }
                let weighted: Vec<(ParticipantId, u64)> =
                    beneficiaries.into_iter().zip(weights).collect();
                SplitCalculator::compute_weighted_splits(amount, &weighted)?
            };
            render::split(out, format, amount, &shares)
        }
        Commands::Balances { trip } => {
            let loaded = load_trip(&trip, max_amount)?;
            let shared = SharedTripLedger::new(loaded.ledger);
            let report = BalanceReport::from(&shared.snapshot());
            render::balances(out, format, &loaded.name, &report)
        }
        Commands::Settle { trip } => {
            let loaded = load_trip(&trip, max_amount)?;
            let shared = SharedTripLedger::new(loaded.ledger);
            let report = BalanceReport::from(&shared.snapshot());
            info!(
                trip = %report.trip_id,
                transfers = report.settlement.len(),
                "settlement planned"
            );
            render::settlement(out, format, &loaded.name, &report)
        }
        Commands::Summary { trip } => {
            let loaded = load_trip(&trip, max_amount)?;
            render::summary(
                out,
                format,
                &loaded.name,
                &config.ledger.currency,
                &loaded.ledger.summary(),
            )
        }
        Commands::Check { trip } => {
            let loaded = load_trip(&trip, max_amount)?;
            check(&loaded)?;
            writeln!(
                out,
                "ok: {} ({} expense(s), {} journal entries)",
                loaded.name,
                loaded.ledger.summary().expense_count,
                loaded.ledger.journal().entries().len()
            )?;
            Ok(())
        }
        Commands::Config => {
            write!(out, "{}", config.to_toml_string()?)?;
            Ok(())
        }
    }
}

fn load_trip(path: &Path, max_amount: Money) -> Result<LoadedTrip> {
    Scenario::from_path(path)?.build(max_amount)
}

/// Cross-check split totals against expense amounts, the incremental
/// balances against a journal replay and the settlement plan against the
/// positions it is meant to clear.
fn check(loaded: &LoadedTrip) -> Result<()> {
    let ledger = &loaded.ledger;
    for expense in ledger.expenses(&ExpenseQuery::default()) {
        let owed = expense.splits.iter().map(|split| split.amount_owed);
        let split_total = Money::checked_sum(owed)?;
        if split_total != expense.amount {
            bail!(
                "expense {} splits add up to {split_total}, not {}",
                expense.id,
                expense.amount
            );
        }
    }
    let balances = ledger.balances();
    if balances.net_total() != 0 {
        bail!("positions do not sum to zero: {}", balances.net_total());
    }
    let replayed = ledger.journal().replay().context("journal replay failed")?;
    if replayed != balances {
        bail!("journal replay disagrees with recorded balances");
    }
    let remaining = SettlementPlanner::apply(balances.positions(), &ledger.settlement());
    if let Some((participant, residue)) = remaining.iter().find(|(_, value)| **value != 0) {
        bail!("settlement leaves {participant} with {residue} unsettled");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_string(command: Commands, format: OutputFormat) -> Result<String> {
        let mut out = Vec::new();
        execute(command, &AppConfig::default(), format, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn split_lists_every_share() {
        let text = run_to_string(
            Commands::Split {
                amount: Money::new(10).unwrap(),
                beneficiaries: vec!["x".into(), "y".into(), "z".into()],
                weights: Vec::new(),
            },
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let amounts: Vec<i64> = value["shares"]
            .as_array()
            .unwrap()
            .iter()
            .map(|share| share["amount"].as_i64().unwrap())
            .collect();
        assert_eq!(amounts, [4, 3, 3]);
    }

    #[test]
    fn weighted_split_requires_one_weight_each() {
        let err = run_to_string(
            Commands::Split {
                amount: Money::new(10).unwrap(),
                beneficiaries: vec!["x".into(), "y".into()],
                weights: vec![1],
            },
            OutputFormat::Table,
        )
        .unwrap_err();
        assert!(err.to_string().contains("one per beneficiary"));
    }

    #[test]
    fn split_rejects_non_positive_amount() {
        let err = run_to_string(
            Commands::Split {
                amount: Money::new(-5).unwrap(),
                beneficiaries: vec!["x".into()],
                weights: Vec::new(),
            },
            OutputFormat::Table,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::InvalidAmount(-5))
        );
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
