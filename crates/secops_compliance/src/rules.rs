//! Compliance rules and the rule store.
//!
//! Rules are declared in YAML (or JSON) documents with a top-level `rules`
//! list. Each record names a `check_type` and a free-form `parameters`
//! mapping; both are folded into a typed [`RuleCheck`] while loading so the
//! check routines never see a malformed parameter set.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RuleError;

/// A compliance rule, immutable once loaded.
#[derive(Debug, Clone)]
pub struct ComplianceRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub framework: String,
    pub category: String,
    pub severity: String,
    pub check: RuleCheck,
    pub remediation: String,
}

/// The evaluation routine a rule selects, with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCheck {
    FileExists(FileExistsParams),
    FileContent(FileContentParams),
    DirectoryStructure(DirectoryStructureParams),
    Configuration(ConfigurationParams),
    /// Fixed composite check, takes no parameters.
    SecurityPolicy,
    /// Fixed data-file scan, takes no parameters.
    DataGovernance,
    /// A check kind this engine does not implement.
    Unsupported { check_type: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileExistsParams {
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileContentParams {
    pub file: PathBuf,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryStructureParams {
    pub directories: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationParams {
    pub file: PathBuf,
    /// Dotted key path -> expected value.
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl RuleCheck {
    /// Build a typed check from a `check_type` discriminator and its raw
    /// parameters.
    pub fn from_parts(
        rule_id: &str,
        check_type: &str,
        parameters: serde_json::Value,
    ) -> Result<Self, RuleError> {
        let check = match check_type {
            "file_exists" => Self::FileExists(typed_params(rule_id, check_type, parameters)?),
            "file_content" => Self::FileContent(typed_params(rule_id, check_type, parameters)?),
            "directory_structure" => {
                Self::DirectoryStructure(typed_params(rule_id, check_type, parameters)?)
            }
            "configuration" => Self::Configuration(typed_params(rule_id, check_type, parameters)?),
            "security_policy" => Self::SecurityPolicy,
            "data_governance" => Self::DataGovernance,
            other => {
                debug!("Rule '{}' uses unsupported check type '{}'", rule_id, other);
                Self::Unsupported {
                    check_type: other.to_string(),
                }
            }
        };
        Ok(check)
    }

    /// The `check_type` discriminator this check was built from.
    pub fn check_type(&self) -> &str {
        match self {
            Self::FileExists(_) => "file_exists",
            Self::FileContent(_) => "file_content",
            Self::DirectoryStructure(_) => "directory_structure",
            Self::Configuration(_) => "configuration",
            Self::SecurityPolicy => "security_policy",
            Self::DataGovernance => "data_governance",
            Self::Unsupported { check_type } => check_type,
        }
    }
}

fn typed_params<T: DeserializeOwned>(
    rule_id: &str,
    check_type: &str,
    parameters: serde_json::Value,
) -> Result<T, RuleError> {
    serde_json::from_value(parameters).map_err(|e| RuleError::InvalidParameters {
        rule: rule_id.to_string(),
        check_type: check_type.to_string(),
        message: e.to_string(),
    })
}

impl ComplianceRule {
    /// Create a rule with empty classification metadata.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        framework: impl Into<String>,
        check: RuleCheck,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            framework: framework.into(),
            category: String::new(),
            severity: String::new(),
            check,
            remediation: String::new(),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = severity.into();
        self
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = remediation.into();
        self
    }
}

/// A rule record as written in a rule document.
#[derive(Debug, Deserialize)]
struct RuleRecord {
    id: String,
    name: String,
    description: String,
    framework: String,
    category: String,
    severity: String,
    check_type: String,
    #[serde(default)]
    parameters: serde_json::Value,
    remediation: String,
}

impl TryFrom<RuleRecord> for ComplianceRule {
    type Error = RuleError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        let check = RuleCheck::from_parts(&record.id, &record.check_type, record.parameters)?;
        Ok(Self {
            id: record.id,
            name: record.name,
            description: record.description,
            framework: record.framework,
            category: record.category,
            severity: record.severity,
            check,
            remediation: record.remediation,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RuleDocument {
    rules: Vec<RuleRecord>,
}

impl RuleDocument {
    fn into_rules(self) -> Result<Vec<ComplianceRule>, RuleError> {
        self.rules.into_iter().map(ComplianceRule::try_from).collect()
    }
}

/// Ordered, id-unique collection of loaded rules.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Vec<ComplianceRule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from rules, dropping later duplicates of an id.
    pub fn from_rules(rules: impl IntoIterator<Item = ComplianceRule>) -> Self {
        let mut store = Self::new();
        for rule in rules {
            store.add(rule);
        }
        store
    }

    /// Load every rule document in `path` (non-recursive).
    ///
    /// Never fails: a missing directory yields an empty store and a document
    /// that does not parse or validate is skipped as a whole.
    pub fn load(path: &Path) -> Self {
        let mut store = Self::new();

        if !path.exists() {
            warn!("Rules directory not found: {:?}", path);
            return store;
        }

        let mut documents: Vec<PathBuf> = match std::fs::read_dir(path) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && is_rule_document(p))
                .collect(),
            Err(e) => {
                warn!("Cannot read rules directory {:?}: {}", path, e);
                return store;
            }
        };
        documents.sort();

        for document in documents {
            match Self::load_document(&document) {
                Ok(rules) => {
                    debug!("Loaded {} rules from {:?}", rules.len(), document);
                    for rule in rules {
                        store.add(rule);
                    }
                }
                Err(e) => {
                    warn!("Skipping rule document {:?}: {}", document, e);
                }
            }
        }

        info!("Loaded {} compliance rules from {:?}", store.len(), path);
        store
    }

    /// Parse one rule document, choosing the format from its extension.
    pub fn load_document(path: &Path) -> Result<Vec<ComplianceRule>, RuleError> {
        let content = std::fs::read_to_string(path)?;
        match extension(path).as_deref() {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content),
            Some("json") => Self::parse_json(&content),
            _ => Err(RuleError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Parse the rules of a YAML document.
    pub fn parse_yaml(yaml: &str) -> Result<Vec<ComplianceRule>, RuleError> {
        let document: RuleDocument = serde_yaml::from_str(yaml)?;
        document.into_rules()
    }

    /// Parse the rules of a JSON document.
    pub fn parse_json(json: &str) -> Result<Vec<ComplianceRule>, RuleError> {
        let document: RuleDocument = serde_json::from_str(json)?;
        document.into_rules()
    }

    /// Append a rule. Returns `false` (and keeps the first one) when the id is
    /// already present.
    pub fn add(&mut self, rule: ComplianceRule) -> bool {
        if self.get(&rule.id).is_some() {
            warn!("Duplicate rule id '{}' ignored", rule.id);
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn get(&self, id: &str) -> Option<&ComplianceRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn rules(&self) -> &[ComplianceRule] {
        &self.rules
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComplianceRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Distinct framework tags in first-seen order.
    pub fn frameworks(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .map(|r| r.framework.as_str())
            .filter(|f| seen.insert(*f))
            .collect()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_rule_document(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some("yaml" | "yml" | "json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SOC2_RULES: &str = r#"
rules:
  - id: soc2-readme
    name: README present
    description: Projects document themselves
    framework: SOC2
    category: documentation
    severity: low
    check_type: file_exists
    parameters:
      files: [README.md]
    remediation: Add a README.md
  - id: soc2-security-policy
    name: Security policy
    description: Security baseline
    framework: SOC2
    category: security
    severity: high
    check_type: security_policy
    remediation: Add SECURITY.md, harden .gitignore and configure pre-commit
"#;

    #[test]
    fn test_parse_yaml_document() {
        let rules = RuleStore::parse_yaml(SOC2_RULES).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].id, "soc2-readme");
        assert_eq!(
            rules[0].check,
            RuleCheck::FileExists(FileExistsParams {
                files: vec![PathBuf::from("README.md")]
            })
        );
        assert_eq!(rules[1].check, RuleCheck::SecurityPolicy);
    }

    #[test]
    fn test_unknown_check_type_is_kept() {
        let yaml = r#"
rules:
  - id: future
    name: Future check
    description: ""
    framework: ISO27001
    category: misc
    severity: info
    check_type: sbom_present
    parameters: { format: cyclonedx }
    remediation: ""
"#;
        let rules = RuleStore::parse_yaml(yaml).unwrap();

        assert_eq!(rules[0].check.check_type(), "sbom_present");
        assert!(matches!(rules[0].check, RuleCheck::Unsupported { .. }));
    }

    #[test]
    fn test_missing_field_rejects_document() {
        let yaml = r#"
rules:
  - id: broken
    name: No framework
    description: ""
    category: misc
    severity: low
    check_type: file_exists
    parameters: { files: [a] }
    remediation: ""
"#;
        assert!(RuleStore::parse_yaml(yaml).is_err());
    }

    #[test]
    fn test_invalid_parameters_reject_document() {
        let yaml = r#"
rules:
  - id: bad-params
    name: Wrong shape
    description: ""
    framework: SOC2
    category: misc
    severity: low
    check_type: file_content
    parameters: { files: [a] }
    remediation: ""
"#;
        let err = RuleStore::parse_yaml(yaml).unwrap_err();
        assert!(matches!(err, RuleError::InvalidParameters { .. }));
    }

    #[test]
    fn test_load_missing_directory() {
        let temp = tempdir().unwrap();
        let store = RuleStore::load(&temp.path().join("nope"));

        assert!(store.is_empty());
    }

    #[test]
    fn test_load_skips_malformed_document() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a_soc2.yaml"), SOC2_RULES).unwrap();
        fs::write(temp.path().join("b_broken.yaml"), "rules: [ {id: x").unwrap();
        fs::write(temp.path().join("notes.txt"), "not a rule document").unwrap();

        let store = RuleStore::load(temp.path());

        assert_eq!(store.len(), 2);
        assert_eq!(store.frameworks(), vec!["SOC2"]);
    }

    #[test]
    fn test_load_skips_document_with_missing_field() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a_soc2.yaml"), SOC2_RULES).unwrap();
        fs::write(
            temp.path().join("b_partial.yaml"),
            r#"
rules:
  - id: gdpr-ok
    name: Valid on its own
    description: ""
    framework: GDPR
    category: privacy
    severity: high
    check_type: data_governance
    remediation: ""
  - id: gdpr-no-framework
    name: Missing framework
    description: ""
    category: privacy
    severity: high
    check_type: data_governance
    remediation: ""
"#,
        )
        .unwrap();

        let store = RuleStore::load(temp.path());

        assert_eq!(store.len(), 2);
        assert!(store.get("soc2-readme").is_some());
        assert!(store.get("gdpr-ok").is_none());
        assert_eq!(store.frameworks(), vec!["SOC2"]);
    }

    #[test]
    fn test_load_order_follows_documents() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("b.yaml"), SOC2_RULES).unwrap();
        fs::write(
            temp.path().join("a.json"),
            r#"{"rules": [{"id": "gdpr-dg", "name": "Data governance", "description": "",
                "framework": "GDPR", "category": "privacy", "severity": "high",
                "check_type": "data_governance", "remediation": ""}]}"#,
        )
        .unwrap();

        let store = RuleStore::load(temp.path());
        let ids: Vec<_> = store.iter().map(|r| r.id.as_str()).collect();

        assert_eq!(ids, vec!["gdpr-dg", "soc2-readme", "soc2-security-policy"]);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let rule = ComplianceRule::new("dup", "First", "SOC2", RuleCheck::SecurityPolicy);
        let again = ComplianceRule::new("dup", "Second", "GDPR", RuleCheck::DataGovernance);

        let store = RuleStore::from_rules(vec![rule, again]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("dup").unwrap().name, "First");
    }
}
