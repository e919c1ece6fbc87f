//! Check command - Run compliance rules against a directory.
//!
//! The report is written as pretty JSON to `--output` or stdout. A run with
//! failed or errored rules exits with the compliance failure code.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use secops_compliance::{ComplianceEngine, ComplianceReport, RuleStore};

use super::RuleSelection;

#[derive(Args)]
pub struct CheckArgs {
    /// Path to the project to check
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    #[command(flatten)]
    pub selection: RuleSelection,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Returns `Ok(false)` when the report has failures or errors.
pub fn execute(args: CheckArgs) -> Result<bool> {
    let rules = RuleStore::load(&args.selection.rules);
    if rules.is_empty() {
        warn!("No compliance rules loaded from {:?}", args.selection.rules);
    }

    let engine = ComplianceEngine::new(rules);
    let report = engine
        .check(&args.path, args.selection.framework_filter())
        .context("Failed to run compliance checks")?;

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {:?}", path))?;
            write_report(&report, BufWriter::new(file))?;
            info!("Report written to {:?}", path);
        }
        None => write_report(&report, io::stdout().lock())?,
    }

    Ok(!report.summary.has_findings())
}

/// Serialize the report as pretty JSON into `sink`.
pub fn write_report(report: &ComplianceReport, mut sink: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut sink, report).context("Failed to serialize report")?;
    writeln!(sink)?;
    sink.flush()?;
    Ok(())
}
