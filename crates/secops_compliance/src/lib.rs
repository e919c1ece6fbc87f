//! # secops_compliance
//!
//! Compliance rule checking for DevSecOps repositories.
//!
//! This crate provides:
//! - **Rule Store**: Load declarative compliance rules (grouped by framework) from YAML/JSON
//! - **Check Routines**: Read-only checks of files, content, directories, configuration,
//!   the security baseline and data governance
//! - **Compliance Engine**: Evaluate rules against a directory with per-rule failure isolation
//! - **Report**: Status counts, compliance score and per-framework grouping
//!
//! ## Example
//!
//! ```rust,ignore
//! use secops_compliance::{ComplianceEngine, RuleStore};
//! use std::path::Path;
//!
//! let rules = RuleStore::load(Path::new("./rules"));
//! let engine = ComplianceEngine::new(rules);
//!
//! let frameworks = vec!["SOC2".to_string()];
//! let report = engine.check(Path::new("./my-app"), Some(frameworks.as_slice()))?;
//!
//! println!("Compliance score: {:.1}%", report.summary.compliance_score);
//! ```

pub mod checks;
pub mod engine;
pub mod error;
pub mod report;
pub mod rules;

pub use engine::ComplianceEngine;
pub use error::{CheckError, ComplianceError, EngineResult, RuleError};
pub use report::{ComplianceReport, ComplianceResult, ComplianceStatus, ReportSummary};
pub use rules::{
    ComplianceRule, ConfigurationParams, DirectoryStructureParams, FileContentParams,
    FileExistsParams, RuleCheck, RuleStore,
};
