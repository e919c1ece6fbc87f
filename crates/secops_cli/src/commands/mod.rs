//! CLI command definitions.
//!
//! Each subcommand is a thin wrapper around the compliance engine; all
//! decisions live in `secops_compliance`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod check;
pub mod rules;

/// secops - DevSecOps compliance checker
#[derive(Parser)]
#[command(name = "secops")]
#[command(version, about = "secops - DevSecOps compliance checker")]
#[command(long_about = r#"
secops evaluates a directory tree against a declarative corpus of compliance
rules (SOC2, GDPR, ...) and emits a JSON report.

COMMANDS:
  check   → Run compliance rules against a project directory
  rules   → List the rules found in a rules directory

EXIT CODES:
  0 - All evaluated rules passed (or were not applicable)
  1 - General error
  2 - Invalid arguments
  3 - At least one rule failed or could not be evaluated
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run compliance checks against a directory
    Check(check::CheckArgs),

    /// List loaded compliance rules
    Rules(rules::RulesArgs),
}

/// Rule corpus selection shared by all subcommands.
#[derive(Args, Debug, Clone)]
pub struct RuleSelection {
    /// Directory containing rule documents (*.yaml, *.yml, *.json)
    #[arg(long, env = "SECOPS_RULES_DIR", default_value = "rules")]
    pub rules: PathBuf,

    /// Only use rules of these frameworks (repeatable or comma separated)
    #[arg(short, long = "framework", value_name = "TAG", value_delimiter = ',')]
    pub frameworks: Vec<String>,
}

impl RuleSelection {
    /// The framework filter, `None` when no framework was given.
    pub fn framework_filter(&self) -> Option<&[String]> {
        if self.frameworks.is_empty() {
            None
        } else {
            Some(self.frameworks.as_slice())
        }
    }
}
