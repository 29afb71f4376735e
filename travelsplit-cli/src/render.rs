use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use travelsplit_config::OutputFormat;
use travelsplit_core::Money;
use travelsplit_ledger::{BalanceReport, BeneficiaryShare, TripSummary};

#[derive(Serialize)]
struct Named<'a, T> {
    name: &'a str,
    #[serde(flatten)]
    inner: &'a T,
}

impl<'a, T> Named<'a, T> {
    fn new(name: &'a str, inner: &'a T) -> Self {
        Self { name, inner }
    }
}

#[derive(Serialize)]
struct SplitView<'a> {
    amount: Money,
    shares: &'a [BeneficiaryShare],
}

fn json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn split<W: Write>(
    out: &mut W,
    format: OutputFormat,
    amount: Money,
    shares: &[BeneficiaryShare],
) -> Result<()> {
    if format == OutputFormat::Json {
        return json(out, &SplitView { amount, shares });
    }
    writeln!(out, "{:<20} {:>16}", "BENEFICIARY", "OWES")?;
    for share in shares {
        writeln!(out, "{:<20} {:>16}", share.beneficiary, share.amount)?;
    }
    writeln!(out, "{:<20} {:>16}", "TOTAL", amount)?;
    Ok(())
}

pub fn balances<W: Write>(
    out: &mut W,
    format: OutputFormat,
    name: &str,
    report: &BalanceReport,
) -> Result<()> {
    if format == OutputFormat::Json {
        return json(out, &Named::new(name, report));
    }
    writeln!(out, "{name} (version {})", report.version)?;
    if report.debts.is_empty() {
        writeln!(out, "all settled")?;
        return Ok(());
    }
    writeln!(out, "{:<20} {:<20} {:>16}", "DEBTOR", "CREDITOR", "AMOUNT")?;
    for debt in &report.debts {
        writeln!(
            out,
            "{:<20} {:<20} {:>16}",
            debt.debtor, debt.creditor, debt.amount
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{:<20} {:>16}", "PARTICIPANT", "NET")?;
    for (participant, position) in &report.positions {
        writeln!(out, "{participant:<20} {position:>16}")?;
    }
    Ok(())
}

pub fn settlement<W: Write>(
    out: &mut W,
    format: OutputFormat,
    name: &str,
    report: &BalanceReport,
) -> Result<()> {
    if format == OutputFormat::Json {
        return json(out, &Named::new(name, report));
    }
    writeln!(out, "{name}: {} transfer(s)", report.settlement.len())?;
    for transfer in &report.settlement {
        writeln!(out, "  {transfer}")?;
    }
    Ok(())
}

pub fn summary<W: Write>(
    out: &mut W,
    format: OutputFormat,
    name: &str,
    currency: &str,
    summary: &TripSummary,
) -> Result<()> {
    if format == OutputFormat::Json {
        return json(out, &Named::new(name, summary));
    }
    writeln!(
        out,
        "{name} [{:?}] {} expense(s), {} {currency} spent",
        summary.state, summary.expense_count, summary.total_spent
    )?;
    writeln!(
        out,
        "{:<20} {:>16} {:>16} {:>16}",
        "PARTICIPANT", "PAID", "OWED", "NET"
    )?;
    for row in &summary.participants {
        let label = if row.is_active {
            row.name.clone()
        } else {
            format!("{} (left)", row.name)
        };
        writeln!(
            out,
            "{:<20} {:>16} {:>16} {:>16}",
            label, row.paid, row.owed, row.net
        )?;
    }
    Ok(())
}
