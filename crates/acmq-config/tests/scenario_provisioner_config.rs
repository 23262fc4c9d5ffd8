use std::path::PathBuf;

use acmq_config::{load_layered_yaml_from_strings, LoadedConfig, ProvisionerConfig};

#[test]
fn empty_config_takes_repository_defaults() {
    let loaded = LoadedConfig::empty().unwrap();
    let cfg = ProvisionerConfig::from_config_json(&loaded.config_json).unwrap();
    assert_eq!(cfg, ProvisionerConfig::default());

    let settings = cfg.reconcile_settings();
    assert_eq!(settings.variables.default_alignment_column, 60);
    assert!(settings.topology.merge_subscriber_into_resource_scope);
    assert_eq!(cfg.artifacts.ledger, PathBuf::from("hieradata/role/acmq.yaml"));
    assert_eq!(cfg.status_retention, chrono::Duration::hours(24));
}

#[test]
fn overrides_flow_into_reconcile_settings() {
    let yaml = r#"
artifacts:
  ledger: "data/acmq.yaml"
ledger:
  users_key: "acmq::users"
variables:
  default_alignment_column: 40
topology:
  merge_subscriber_into_resource_scope: false
status:
  retention_secs: 600
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let cfg = ProvisionerConfig::from_config_json(&loaded.config_json).unwrap();

    assert_eq!(cfg.artifacts.ledger, PathBuf::from("data/acmq.yaml"));
    assert_eq!(cfg.ledger_keys.users_key, "acmq::users");
    assert_eq!(
        cfg.ledger_keys.roles_key,
        "icc_artemis_broker::artemis_roles_properties_roles"
    );
    assert_eq!(cfg.status_retention, chrono::Duration::minutes(10));

    let settings = cfg.reconcile_settings();
    assert_eq!(settings.variables.default_alignment_column, 40);
    assert!(!settings.topology.merge_subscriber_into_resource_scope);
}

#[test]
fn invalid_values_are_rejected() {
    for yaml in [
        "status:\n  retention_secs: 0\n",
        "variables:\n  default_alignment_column: 0\n",
        "artifacts:\n  ledger: \"  \"\n",
        "topology:\n  merge_subscriber_into_resource_scope: \"yes\"\n",
    ] {
        let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
        assert!(
            ProvisionerConfig::from_config_json(&loaded.config_json).is_err(),
            "expected rejection for {yaml:?}"
        );
    }
}
