use acmq_config::{load_layered_yaml_from_strings, ProvisionerConfig};
use acmq_provision::Workspace;
use acmq_reconcile::Artifact;
use acmq_testkit::{fixtures, write_artifacts, RequestBuilder};

#[test]
fn config_paths_and_options_drive_the_workspace() {
    let yaml = r#"
artifacts:
  ledger: "hiera/acmq.yaml"
  variables: "puppet/init.pp"
  topology: "puppet/broker.xml.erb"
topology:
  merge_subscriber_into_resource_scope: false
"#;
    let loaded = load_layered_yaml_from_strings(&[yaml]).unwrap();
    let cfg = ProvisionerConfig::from_config_json(&loaded.config_json).unwrap();

    let dir = tempfile::tempdir().unwrap();
    write_artifacts(dir.path(), &cfg.artifacts, &fixtures::populated()).unwrap();
    let workspace = Workspace::new(dir.path(), cfg.artifacts.clone(), cfg.reconcile_settings());

    let req = RequestBuilder::update_topic("team.topic.events")
        .subscription("audit-sub", "svcD", true)
        .build()
        .unwrap();
    let outcome = workspace.provision(&req, false).unwrap();

    assert!(outcome.written.iter().any(|p| p.ends_with("puppet/broker.xml.erb")));
    let topology = std::fs::read_to_string(workspace.path(Artifact::Topology)).unwrap();
    // Topic scope keeps its consumers; only the subscription scope grants svcD.
    assert!(topology.contains("<permission type=\"consume\" roles=\"team-admin,svcE\"/>"));
    assert!(topology.contains("<permission type=\"consume\" roles=\"team-admin,svcD\"/>"));
}
