//! Integration tests for the compliance engine.

use std::fs;
use std::path::{Path, PathBuf};

use secops_compliance::{ComplianceEngine, ComplianceStatus, RuleStore};
use serde_json::json;
use tempfile::tempdir;

fn get_rules_path() -> PathBuf {
    let candidates = ["rules", "../rules", "../../rules", "../../../rules"];

    for candidate in candidates {
        if Path::new(candidate).join("soc2.yaml").exists() {
            return PathBuf::from(candidate);
        }
    }

    PathBuf::from("rules")
}

const MIXED_RULES: &str = r###"
rules:
  - id: files
    name: Required files
    description: ""
    framework: SOC2
    category: documentation
    severity: low
    check_type: file_exists
    parameters: { files: [a.txt, b.txt] }
    remediation: ""
  - id: readme-license
    name: License section
    description: ""
    framework: SOC2
    category: documentation
    severity: low
    check_type: file_content
    parameters: { file: README.md, patterns: ["## License"] }
    remediation: ""
  - id: config
    name: Config values
    description: ""
    framework: ISO27001
    category: configuration
    severity: high
    check_type: configuration
    parameters:
      file: settings.json
      settings: { a.b: 1 }
    remediation: ""
  - id: governance
    name: Data governance
    description: ""
    framework: GDPR
    category: privacy
    severity: high
    check_type: data_governance
    remediation: ""
"###;

fn project() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    fs::write(dir.path().join("README.md"), "# Demo\n").unwrap();
    fs::write(dir.path().join("settings.json"), r#"{"a": {"b": 1}}"#).unwrap();
    dir
}

fn engine() -> ComplianceEngine {
    ComplianceEngine::new(RuleStore::from_rules(RuleStore::parse_yaml(MIXED_RULES).unwrap()))
}

#[test]
fn test_one_result_per_rule() {
    let dir = project();

    let report = engine().check(dir.path(), None).unwrap();

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.summary.total_checks, 4);
    let ids: Vec<_> = report.results.iter().map(|r| r.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["files", "readme-license", "config", "governance"]);
}

#[test]
fn test_expected_verdicts() {
    let dir = project();

    let report = engine().check(dir.path(), None).unwrap();

    assert_eq!(report.results[0].status, ComplianceStatus::Fail);
    assert_eq!(
        report.results[0].evidence.as_ref().unwrap()["missing_files"],
        json!(["b.txt"])
    );
    assert_eq!(report.results[1].status, ComplianceStatus::Fail);
    assert_eq!(
        report.results[1].evidence.as_ref().unwrap()["missing_patterns"],
        json!(["## License"])
    );
    assert_eq!(report.results[2].status, ComplianceStatus::Pass);
    assert_eq!(report.results[3].status, ComplianceStatus::Pass);
    assert_eq!(report.summary.compliance_score, 50.0);
}

#[test]
fn test_rerun_is_idempotent() {
    let dir = project();
    let engine = engine();

    let first = engine.check(dir.path(), None).unwrap();
    let second = engine.check(dir.path(), None).unwrap();

    for (a, b) in first.results.iter().zip(&second.results) {
        assert_eq!(a.status, b.status);
        assert_eq!(a.message, b.message);
    }
}

#[test]
fn test_framework_filter_limits_grouping() {
    let dir = project();
    let frameworks = vec!["SOC2".to_string()];

    let report = engine().check(dir.path(), Some(frameworks.as_slice())).unwrap();

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.by_framework.len(), 1);
    assert_eq!(report.by_framework["SOC2"].len(), 2);
}

#[test]
fn test_broken_config_is_error_not_fail() {
    let dir = project();
    fs::write(dir.path().join("settings.json"), "{ not json").unwrap();

    let report = engine().check(dir.path(), None).unwrap();

    assert_eq!(report.results[2].status, ComplianceStatus::Error);
    assert_eq!(report.results[3].status, ComplianceStatus::Pass);
    assert_eq!(report.summary.errors, 1);
}

#[test]
fn test_report_json_shape() {
    let dir = project();

    let report = engine().check(dir.path(), None).unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert!(value["timestamp"].is_string());
    for key in ["total_checks", "passed", "failed", "warnings", "errors", "compliance_score"] {
        assert!(value["summary"].get(key).is_some(), "summary.{} missing", key);
    }
    assert!(value["by_framework"]["GDPR"].is_array());
    assert_eq!(value["results"][0]["status"], "FAIL");
    assert!(value["results"][2].get("evidence").is_none());
}

#[test]
fn test_shipped_rule_corpus_loads() {
    let store = RuleStore::load(&get_rules_path());

    assert!(store.len() >= 7);
    assert!(store.frameworks().contains(&"SOC2"));
    assert!(store.frameworks().contains(&"GDPR"));
}

#[test]
fn test_shipped_corpus_against_compliant_project() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join(".github/workflows")).unwrap();
    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::write(root.join("README.md"), "# Platform\n\n## License\nMIT\n").unwrap();
    fs::write(root.join("SECURITY.md"), "# Security").unwrap();
    fs::write(root.join(".gitignore"), ".env\n*.key\n*.pem\n*.crt\nsecrets/\n").unwrap();
    fs::write(root.join(".pre-commit-config.yaml"), "repos: []\n").unwrap();
    fs::write(root.join(".github/CODEOWNERS"), "* @platform").unwrap();
    fs::write(root.join("PRIVACY.md"), "# Privacy").unwrap();
    fs::write(
        root.join("config/monitoring.yaml"),
        "exporter:\n  tls:\n    enabled: true\n  retention_days: 30\n",
    )
    .unwrap();
    fs::write(root.join("export.csv"), "id\n1\n").unwrap();
    fs::write(root.join("docs/data-classification.md"), "# Classes").unwrap();
    fs::write(root.join("docs/data-retention.md"), "# Retention").unwrap();

    let engine = ComplianceEngine::from_directory(&get_rules_path());
    let report = engine.check(root, None).unwrap();

    let not_passing: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.status != ComplianceStatus::Pass)
        .map(|r| (&r.rule_id, &r.message))
        .collect();
    assert!(not_passing.is_empty(), "unexpected findings: {:?}", not_passing);
    assert_eq!(report.summary.compliance_score, 100.0);
}
