//! Compliance evaluation engine.
//!
//! The engine walks the loaded rules in order, dispatches each one to its
//! check routine and folds the results into a [`ComplianceReport`]. A rule
//! that hits an unexpected condition produces an `ERROR` result; it never
//! stops the rest of the batch.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::checks;
use crate::error::{ComplianceError, EngineResult};
use crate::report::{ComplianceReport, ComplianceResult, ComplianceStatus};
use crate::rules::{ComplianceRule, RuleCheck, RuleStore};

/// Evaluates a rule set against a target directory.
pub struct ComplianceEngine {
    rules: RuleStore,
}

impl ComplianceEngine {
    pub fn new(rules: RuleStore) -> Self {
        Self { rules }
    }

    /// Create an engine from the rule documents in `rules_dir`.
    pub fn from_directory(rules_dir: &Path) -> Self {
        Self::new(RuleStore::load(rules_dir))
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// Rules selected by an optional framework filter, in rule order.
    pub fn select<'a>(
        &'a self,
        frameworks: Option<&'a [String]>,
    ) -> impl Iterator<Item = &'a ComplianceRule> {
        self.rules.iter().filter(move |rule| match frameworks {
            Some(tags) => tags.iter().any(|t| *t == rule.framework),
            None => true,
        })
    }

    /// Run every selected rule against `target`.
    pub fn check(
        &self,
        target: &Path,
        frameworks: Option<&[String]>,
    ) -> EngineResult<ComplianceReport> {
        if !target.exists() {
            return Err(ComplianceError::InvalidTarget {
                path: target.to_path_buf(),
                reason: "path does not exist".to_string(),
            });
        }
        if !target.is_dir() {
            return Err(ComplianceError::InvalidTarget {
                path: target.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        info!("Running compliance checks on {:?}", target);
        if let Some(tags) = frameworks {
            debug!("Framework filter: {}", tags.join(", "));
        }

        let results: Vec<ComplianceResult> = self
            .select(frameworks)
            .map(|rule| Self::evaluate_rule(rule, target))
            .collect();

        let report = ComplianceReport::build(results, &self.rules);
        info!(
            "Compliance check complete: {}/{} passed, {} failed, {} errors (score {:.1}%)",
            report.summary.passed,
            report.summary.total_checks,
            report.summary.failed,
            report.summary.errors,
            report.summary.compliance_score
        );

        Ok(report)
    }

    /// Evaluate one rule, converting unexpected conditions into an `ERROR`
    /// result.
    pub fn evaluate_rule(rule: &ComplianceRule, target: &Path) -> ComplianceResult {
        debug!("Evaluating rule: {} ({})", rule.id, rule.check.check_type());

        let outcome = match &rule.check {
            RuleCheck::FileExists(params) => checks::file_exists(rule, params, target),
            RuleCheck::FileContent(params) => checks::file_content(rule, params, target),
            RuleCheck::DirectoryStructure(params) => {
                checks::directory_structure(rule, params, target)
            }
            RuleCheck::Configuration(params) => checks::configuration(rule, params, target),
            RuleCheck::SecurityPolicy => checks::security_policy(rule, target),
            RuleCheck::DataGovernance => checks::data_governance(rule, target),
            RuleCheck::Unsupported { check_type } => Ok(ComplianceResult::not_applicable(
                rule,
                format!("Unknown check type: {}", check_type),
            )),
        };

        match outcome {
            Ok(result) => {
                if result.status == ComplianceStatus::Fail {
                    debug!("Rule {} failed: {}", rule.id, result.message);
                }
                result
            }
            Err(e) => {
                warn!("Rule {} could not be evaluated: {}", rule.id, e);
                ComplianceResult::error(rule, format!("Check error: {}", e))
            }
        }
    }
}
