//! Rules command - List the rules loaded from a rules directory.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use secops_compliance::{ComplianceEngine, ComplianceRule};

use super::RuleSelection;

#[derive(Args)]
pub struct RulesArgs {
    #[command(flatten)]
    pub selection: RuleSelection,
}

#[derive(Debug, Serialize)]
struct RuleListing<'a> {
    id: &'a str,
    name: &'a str,
    framework: &'a str,
    severity: &'a str,
    check_type: &'a str,
}

impl<'a> From<&'a ComplianceRule> for RuleListing<'a> {
    fn from(rule: &'a ComplianceRule) -> Self {
        Self {
            id: &rule.id,
            name: &rule.name,
            framework: &rule.framework,
            severity: &rule.severity,
            check_type: rule.check.check_type(),
        }
    }
}

pub fn execute(args: RulesArgs) -> Result<bool> {
    let engine = ComplianceEngine::from_directory(&args.selection.rules);

    let listed = write_listing(
        &engine,
        args.selection.framework_filter(),
        io::stdout().lock(),
    )?;

    info!(
        "{} rules listed, frameworks loaded: {}",
        listed,
        engine.rules().frameworks().join(", ")
    );

    Ok(true)
}

/// Write the selected rules as a pretty JSON array into `sink`.
///
/// Returns the number of rules written.
pub fn write_listing(
    engine: &ComplianceEngine,
    frameworks: Option<&[String]>,
    mut sink: impl Write,
) -> Result<usize> {
    let listing: Vec<RuleListing> = engine.select(frameworks).map(RuleListing::from).collect();

    serde_json::to_writer_pretty(&mut sink, &listing).context("Failed to serialize rules")?;
    writeln!(sink)?;
    sink.flush()?;

    Ok(listing.len())
}
