use acmq_provision::{provision, ChangeKind, ReconcileSettings};
use acmq_reconcile::Artifact;
use acmq_testkit::{fixtures, RequestBuilder};

fn param(name: &str, value: &str) -> String {
    format!("{:<47}= '{value}',", format!("  ${name}"))
}

#[test]
fn new_queue_touches_all_three_artifacts() {
    let req = RequestBuilder::new_queue("team.queue.orders")
        .producers(&["svcA"])
        .consumers(&["svcB"])
        .build()
        .unwrap();

    let plan = provision(&req, &fixtures::bare(), &ReconcileSettings::default()).unwrap();
    assert!(!plan.is_noop());
    assert_eq!(plan.changed().count(), 3);
    assert_eq!(plan.warnings().count(), 0);

    let ledger = &plan.change(Artifact::Ledger).unwrap().text;
    let expected_ledger = r#"---
icc_artemis_broker::artemis_users_properties_users:
  - 'admin'
  - 'svcA'
  - 'svcB'

icc_artemis_broker::artemis_roles_properties_roles:
  - group: 'admin'
    users: 'admin'
  - group: 'svcA'
    users: 'svcA'
  - group: 'svcB'
    users: 'svcB'
  - group: 'team-admin'
    users: 'admin'
  - group: 'team-read'
    users: 'svcB'
  - group: 'team-write'
    users: 'svcA'
"#;
    assert_eq!(ledger, expected_ledger);

    let variables = &plan.change(Artifact::Variables).unwrap().text;
    let expected_variables = format!(
        "class icc_artemis_broker (\n{}\n\n{}\n{}\n) {{\n\n  # VALIDATES\n  validate_string($broker_name)\n  validate_string($address_team_queue_orders)\n  validate_string($anycast_team_queue_orders)\n\n  # REPOS\n  include icc_artemis_broker::repos\n}}\n",
        param("broker_name", "acmq01"),
        param("address_team_queue_orders", "team.queue.orders"),
        param("anycast_team_queue_orders", "team.queue.orders"),
    );
    assert_eq!(variables, &expected_variables);

    let topology = &plan.change(Artifact::Topology).unwrap().text;
    assert!(topology.contains("         <security-setting match=\"team.#\">\n"));
    assert!(topology.contains(
        "         <security-setting match=\"<%= @address_team_queue_orders %>.#\">
            <permission type=\"send\" roles=\"team-admin,svcA\"/>
            <permission type=\"consume\" roles=\"team-admin,svcB\"/>
            <permission type=\"browse\" roles=\"team-admin,svcB\"/>
         </security-setting>
      </security-settings>
"
    ));
    assert!(topology.contains(
        "         <address name=\"<%= @address_team_queue_orders %>\">
            <anycast>
               <queue name=\"<%= @anycast_team_queue_orders %>\"/>
            </anycast>
         </address>
      </addresses>
"
    ));
    let namespace = topology.find("match=\"team.#\"").unwrap();
    let resource = topology.find("match=\"<%= @address_team_queue_orders %>.#\"").unwrap();
    assert!(namespace < resource);

    assert!(plan.topology.namespace_scope_created);
    assert_eq!(plan.summary.kind, ChangeKind::NewResource);
    assert_eq!(plan.summary.title(), "[OPS-1] New queue: team.queue.orders");
}

#[test]
fn second_pass_is_a_noop() {
    let req = RequestBuilder::new_queue("team.queue.orders")
        .producers(&["svcA"])
        .consumers(&["svcB"])
        .build()
        .unwrap();
    let settings = ReconcileSettings::default();

    let first = provision(&req, &fixtures::bare(), &settings).unwrap();
    let patched = acmq_provision::ArtifactTexts {
        ledger: first.change(Artifact::Ledger).unwrap().text.clone(),
        variables: first.change(Artifact::Variables).unwrap().text.clone(),
        topology: first.change(Artifact::Topology).unwrap().text.clone(),
    };

    let second = provision(&req, &patched, &settings).unwrap();
    assert!(second.is_noop());
    for change in &second.changes {
        assert_eq!(change.text, patched.get(change.artifact));
    }
    assert_eq!(second.summary.kind, acmq_provision::ChangeKind::ResourceUpdate);
}

#[test]
fn admin_in_request_is_dropped() {
    let req = RequestBuilder::new_queue("team.queue.orders")
        .producers(&["ADMIN", "svcA"])
        .consumers(&["admin"])
        .build()
        .unwrap();

    let plan = provision(&req, &fixtures::bare(), &ReconcileSettings::default()).unwrap();
    let ledger = &plan.change(Artifact::Ledger).unwrap().text;
    assert!(!ledger.contains("ADMIN"));
    assert!(!ledger.contains("team-read"));
    assert!(ledger.contains("  - group: 'team-write'\n    users: 'svcA'\n"));
    assert_eq!(plan.summary.consumers, Vec::<String>::new());

    let topology = &plan.change(Artifact::Topology).unwrap().text;
    assert!(topology.contains("<permission type=\"consume\" roles=\"team-admin\"/>"));
}
