//! Check routines.
//!
//! Every routine only reads the target tree. Expected
//! violations come back as `FAIL` results; anything unexpected (unreadable
//! files, unparsable configuration) is returned as a [`CheckError`] and
//! recorded by the engine as an `ERROR` result.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::CheckError;
use crate::report::ComplianceResult;
use crate::rules::{
    ComplianceRule, ConfigurationParams, DirectoryStructureParams, FileContentParams,
    FileExistsParams,
};

pub type CheckOutcome = Result<ComplianceResult, CheckError>;

/// Documents accepted as a security policy (any one is enough).
pub const SECURITY_POLICY_FILES: &[&str] = &[
    "SECURITY.md",
    ".github/SECURITY.md",
    "docs/SECURITY.md",
    "docs/security-policy.md",
];

/// Entries `.gitignore` must contain so secrets, keys and certs stay out of git.
pub const GITIGNORE_REQUIRED_PATTERNS: &[&str] = &[".env", "*.key", "*.pem", "*.crt", "secrets/"];

pub const PRE_COMMIT_CONFIG: &str = ".pre-commit-config.yaml";

/// Extensions that mark a file as data subject to governance.
pub const DATA_FILE_EXTENSIONS: &[&str] = &[
    "csv", "tsv", "parquet", "avro", "orc", "xlsx", "xls", "jsonl", "sql", "db", "sqlite",
];

pub const DATA_CLASSIFICATION_FILES: &[&str] = &[
    "docs/data-classification.md",
    "DATA_CLASSIFICATION.md",
    "data/classification.yaml",
];

pub const DATA_RETENTION_FILES: &[&str] = &[
    "docs/data-retention.md",
    "DATA_RETENTION.md",
    "data/retention-policy.yaml",
];

/// All listed files must exist.
pub fn file_exists(
    rule: &ComplianceRule,
    params: &FileExistsParams,
    target: &Path,
) -> CheckOutcome {
    let missing: Vec<String> = params
        .files
        .iter()
        .filter(|f| !target.join(f).exists())
        .map(|f| f.display().to_string())
        .collect();

    if missing.is_empty() {
        return Ok(ComplianceResult::pass(rule, "All required files exist"));
    }

    let steps = missing.iter().map(|f| format!("Create file: {}", f)).collect();
    Ok(ComplianceResult::fail(
        rule,
        format!("Missing required files: {}", missing.join(", ")),
    )
    .with_evidence(json!({ "missing_files": missing }))
    .with_remediation(steps))
}

/// The file must exist and contain every pattern as a literal substring.
pub fn file_content(
    rule: &ComplianceRule,
    params: &FileContentParams,
    target: &Path,
) -> CheckOutcome {
    let path = target.join(&params.file);
    let display = params.file.display().to_string();

    if !path.exists() {
        return Ok(ComplianceResult::fail(rule, format!("File not found: {}", display))
            .with_remediation(vec![format!("Create file: {}", display)]));
    }

    let content = fs::read_to_string(&path).map_err(|e| CheckError::read(&path, e))?;
    let missing: Vec<&str> = params
        .patterns
        .iter()
        .map(String::as_str)
        .filter(|p| !content.contains(*p))
        .collect();

    if missing.is_empty() {
        return Ok(ComplianceResult::pass(
            rule,
            format!("{} contains all required content", display),
        ));
    }

    let steps = missing
        .iter()
        .map(|p| format!("Add '{}' to {}", p, display))
        .collect();
    Ok(ComplianceResult::fail(
        rule,
        format!("{} is missing {} required pattern(s)", display, missing.len()),
    )
    .with_evidence(json!({ "file": display, "missing_patterns": missing }))
    .with_remediation(steps))
}

/// All listed paths must exist as directories.
pub fn directory_structure(
    rule: &ComplianceRule,
    params: &DirectoryStructureParams,
    target: &Path,
) -> CheckOutcome {
    let missing: Vec<String> = params
        .directories
        .iter()
        .filter(|d| !target.join(d).is_dir())
        .map(|d| d.display().to_string())
        .collect();

    if missing.is_empty() {
        return Ok(ComplianceResult::pass(rule, "All required directories exist"));
    }

    let steps = missing.iter().map(|d| format!("Create directory: {}", d)).collect();
    Ok(ComplianceResult::fail(
        rule,
        format!("Missing required directories: {}", missing.join(", ")),
    )
    .with_evidence(json!({ "missing_directories": missing }))
    .with_remediation(steps))
}

/// Structured configuration formats understood by [`configuration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    /// Parse into a format-independent value tree.
    pub fn parse(self, content: &str) -> Result<Value, String> {
        match self {
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Resolve a dotted key (`a.b.c`) through nested mappings.
///
/// Returns `None` when a segment is missing or an intermediate value is not
/// a mapping.
pub fn lookup_dotted<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match key.split_once('.') {
        Some((head, rest)) => lookup_dotted(value.as_object()?.get(head)?, rest),
        None => value.as_object()?.get(key),
    }
}

/// Compare a configured value against its expectation.
///
/// Numbers compare by value, so `30`, `30.0` and a TOML float all match.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (a.as_u64(), b.as_u64()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_f64() == b.as_f64(),
            },
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).map_or(false, |other| values_equal(v, other)))
        }
        _ => actual == expected,
    }
}

/// Every configured key must resolve to its expected value.
pub fn configuration(
    rule: &ComplianceRule,
    params: &ConfigurationParams,
    target: &Path,
) -> CheckOutcome {
    let path = target.join(&params.file);
    let display = params.file.display().to_string();

    if !path.exists() {
        return Ok(ComplianceResult::fail(
            rule,
            format!("Configuration file not found: {}", display),
        )
        .with_remediation(vec![format!("Create configuration file: {}", display)]));
    }

    let Some(format) = ConfigFormat::from_path(&params.file) else {
        return Ok(ComplianceResult::not_applicable(
            rule,
            format!("Unsupported configuration format: {}", display),
        ));
    };

    let content = fs::read_to_string(&path).map_err(|e| CheckError::read(&path, e))?;
    let document = format.parse(&content).map_err(|e| CheckError::parse(&path, e))?;

    let mut mismatches = Vec::new();
    let mut steps = Vec::new();
    for (key, expected) in &params.settings {
        let actual = lookup_dotted(&document, key);
        if !actual.map_or(false, |a| values_equal(a, expected)) {
            mismatches.push(json!({
                "key": key,
                "expected": expected,
                "actual": actual.cloned().unwrap_or(Value::Null),
            }));
            steps.push(format!("Set '{}' to {} in {}", key, expected, display));
        }
    }

    if mismatches.is_empty() {
        return Ok(ComplianceResult::pass(
            rule,
            format!("{} matches all required settings", display),
        ));
    }

    Ok(ComplianceResult::fail(
        rule,
        format!("{} has {} non-compliant setting(s)", display, mismatches.len()),
    )
    .with_evidence(json!({ "file": display, "mismatches": mismatches }))
    .with_remediation(steps))
}

/// Fixed security baseline: policy document, hardened `.gitignore` and
/// pre-commit hooks.
pub fn security_policy(rule: &ComplianceRule, target: &Path) -> CheckOutcome {
    let mut issues = Vec::new();

    if !any_exists(target, SECURITY_POLICY_FILES) {
        issues.push("No security policy document found".to_string());
    }

    let gitignore = target.join(".gitignore");
    if gitignore.exists() {
        let content =
            fs::read_to_string(&gitignore).map_err(|e| CheckError::read(&gitignore, e))?;
        let missing: Vec<&str> = GITIGNORE_REQUIRED_PATTERNS
            .iter()
            .copied()
            .filter(|p| !content.contains(*p))
            .collect();
        if !missing.is_empty() {
            issues.push(format!(
                ".gitignore is missing sensitive file patterns: {}",
                missing.join(", ")
            ));
        }
    } else {
        issues.push("No .gitignore file found".to_string());
    }

    if !target.join(PRE_COMMIT_CONFIG).exists() {
        issues.push("Pre-commit hooks not configured".to_string());
    }

    if issues.is_empty() {
        return Ok(ComplianceResult::pass(rule, "Security policy requirements met"));
    }

    Ok(ComplianceResult::fail(rule, issues.join("; "))
        .with_evidence(json!({ "issues": issues }))
        .with_remediation(rule_remediation(rule)))
}

/// Data files in the tree require classification and retention documents.
pub fn data_governance(rule: &ComplianceRule, target: &Path) -> CheckOutcome {
    let data_files = count_data_files(target)?;
    debug!("Found {} data files under {:?}", data_files, target);

    if data_files == 0 {
        return Ok(ComplianceResult::pass(rule, "No data files found, nothing to govern")
            .with_evidence(json!({ "data_files_found": 0 })));
    }

    let mut issues = Vec::new();
    if !any_exists(target, DATA_CLASSIFICATION_FILES) {
        issues.push("No data classification document found".to_string());
    }
    if !any_exists(target, DATA_RETENTION_FILES) {
        issues.push("No data retention policy found".to_string());
    }

    if issues.is_empty() {
        return Ok(ComplianceResult::pass(rule, "Data governance documentation present")
            .with_evidence(json!({ "data_files_found": data_files })));
    }

    Ok(ComplianceResult::fail(rule, issues.join("; "))
        .with_evidence(json!({ "data_files_found": data_files, "issues": issues }))
        .with_remediation(rule_remediation(rule)))
}

fn any_exists(target: &Path, candidates: &[&str]) -> bool {
    candidates.iter().any(|c| target.join(c).exists())
}

fn rule_remediation(rule: &ComplianceRule) -> Vec<String> {
    if rule.remediation.trim().is_empty() {
        Vec::new()
    } else {
        vec![rule.remediation.clone()]
    }
}

fn count_data_files(target: &Path) -> Result<usize, CheckError> {
    let mut count = 0;

    let walker = WalkDir::new(target)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| CheckError::Scan {
            path: e.path().unwrap_or(target).to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_data = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| DATA_FILE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_data {
            count += 1;
        }
    }

    Ok(count)
}
