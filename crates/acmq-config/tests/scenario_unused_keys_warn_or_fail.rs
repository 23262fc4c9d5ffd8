use acmq_config::{load_layered_yaml_from_strings, report_unused_keys, ConfigConsumer, UnusedKeyPolicy};

const YAML: &str = r#"
artifacts:
  ledger: "hieradata/role/acmq.yaml"
git:
  token_env: "ACMQ_GIT_TOKEN"
legacy:
  jenkins_url: "https://ci.example"
  retries: 3
"#;

#[test]
fn warn_reports_unused_without_error() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report = report_unused_keys(ConfigConsumer::Provision, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();

    assert!(!report.is_clean());
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/legacy/jenkins_url".to_string(), "/legacy/retries".to_string()]
    );
}

#[test]
fn fail_errors_on_unused_keys() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let err = report_unused_keys(ConfigConsumer::Provision, &loaded.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS (consumer=PROVISION)"));
}

#[test]
fn catalog_does_not_consume_git_section() {
    let loaded = load_layered_yaml_from_strings(&[YAML]).unwrap();
    let report = report_unused_keys(ConfigConsumer::Catalog, &loaded.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert!(report.unused_leaf_pointers.contains(&"/git/token_env".to_string()));
    assert!(!report.unused_leaf_pointers.contains(&"/artifacts/ledger".to_string()));
}

#[test]
fn fully_consumed_config_is_clean() {
    let yaml = "artifacts:\n  ledger: a.yaml\nstatus:\n  retention_secs: 60\n";
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let report = report_unused_keys(ConfigConsumer::Provision, &loaded.config_json, UnusedKeyPolicy::Fail).unwrap();
    assert!(report.is_clean());
}
