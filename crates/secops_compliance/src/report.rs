//! Per-rule results and the aggregated compliance report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::{ComplianceRule, RuleStore};

/// Outcome of evaluating one rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Pass,
    Fail,
    Warning,
    NotApplicable,
    Error,
}

/// Result of evaluating a single rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceResult {
    /// Id of the rule this result belongs to
    pub rule_id: String,
    pub status: ComplianceStatus,
    pub message: String,
    /// Structured details supporting the verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<serde_json::Value>,
    /// Suggested fixes, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation_steps: Option<Vec<String>>,
}

impl ComplianceResult {
    fn new(rule: &ComplianceRule, status: ComplianceStatus, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule.id.clone(),
            status,
            message: message.into(),
            evidence: None,
            remediation_steps: None,
        }
    }

    pub fn pass(rule: &ComplianceRule, message: impl Into<String>) -> Self {
        Self::new(rule, ComplianceStatus::Pass, message)
    }

    pub fn fail(rule: &ComplianceRule, message: impl Into<String>) -> Self {
        Self::new(rule, ComplianceStatus::Fail, message)
    }

    pub fn not_applicable(rule: &ComplianceRule, message: impl Into<String>) -> Self {
        Self::new(rule, ComplianceStatus::NotApplicable, message)
    }

    pub fn error(rule: &ComplianceRule, message: impl Into<String>) -> Self {
        Self::new(rule, ComplianceStatus::Error, message)
    }

    pub fn with_evidence(mut self, evidence: serde_json::Value) -> Self {
        self.evidence = Some(evidence);
        self
    }

    pub fn with_remediation(mut self, steps: Vec<String>) -> Self {
        if !steps.is_empty() {
            self.remediation_steps = Some(steps);
        }
        self
    }
}

/// Status counts and derived score of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
    pub errors: usize,
    pub not_applicable: usize,
    /// Percentage of evaluated rules that passed, 0 when nothing ran
    pub compliance_score: f64,
}

impl ReportSummary {
    pub fn from_results(results: &[ComplianceResult]) -> Self {
        let count =
            |status: ComplianceStatus| results.iter().filter(|r| r.status == status).count();

        let total_checks = results.len();
        let passed = count(ComplianceStatus::Pass);
        let compliance_score = if total_checks == 0 {
            0.0
        } else {
            passed as f64 / total_checks as f64 * 100.0
        };

        Self {
            total_checks,
            passed,
            failed: count(ComplianceStatus::Fail),
            warnings: count(ComplianceStatus::Warning),
            errors: count(ComplianceStatus::Error),
            not_applicable: count(ComplianceStatus::NotApplicable),
            compliance_score,
        }
    }

    /// Whether the run produced anything a caller should act on.
    pub fn has_findings(&self) -> bool {
        self.failed > 0 || self.errors > 0
    }
}

/// Output of one compliance run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub timestamp: DateTime<Utc>,
    pub summary: ReportSummary,
    /// Results grouped by the framework of their rule
    pub by_framework: BTreeMap<String, Vec<ComplianceResult>>,
    /// All results in rule order
    pub results: Vec<ComplianceResult>,
}

impl ComplianceReport {
    /// Aggregate results produced from rules in `store`.
    pub fn build(results: Vec<ComplianceResult>, store: &RuleStore) -> Self {
        let summary = ReportSummary::from_results(&results);

        let mut by_framework: BTreeMap<String, Vec<ComplianceResult>> = BTreeMap::new();
        for result in &results {
            if let Some(rule) = store.get(&result.rule_id) {
                by_framework
                    .entry(rule.framework.clone())
                    .or_default()
                    .push(result.clone());
            }
        }

        Self {
            timestamp: Utc::now(),
            summary,
            by_framework,
            results,
        }
    }
}
