use acmq_reconcile::*;
use acmq_schemas::{ChangeRequest, RequestKind, ResourceKind, SubscriptionSpec};

const LEDGER: &str = r#"---
icc_artemis_broker::artemis_users_properties_users:
  - 'admin'
  - 'svcX'

icc_artemis_broker::artemis_roles_properties_roles:
  - group: 'admin'
    users: 'admin'
  - group: 'svcX'
    users: 'svcX'
  - group: 'other-read'
    users: 'svcX'

icc_artemis_broker::artemis_broker_name: 'broker01'
"#;

fn request(kind: ResourceKind, name: &str) -> ChangeRequest {
    ChangeRequest {
        kind: RequestKind::New,
        resource_kind: kind,
        name: name.to_string(),
        producers: None,
        consumers: None,
        subscriptions: Vec::new(),
        description: None,
        team: "team".to_string(),
        requester: "jane".to_string(),
        ticket: "OPS-1".to_string(),
    }
}

fn strings(items: &[&str]) -> Option<Vec<String>> {
    Some(items.iter().map(|s| s.to_string()).collect())
}

#[test]
fn scenario_new_queue_adds_users_personal_and_namespace_groups() {
    let mut req = request(ResourceKind::Queue, "team.queue.orders");
    req.producers = strings(&["svcA"]);
    req.consumers = strings(&["svcB"]);

    let out = reconcile_ledger(LEDGER, &req, &LedgerKeys::default()).unwrap();
    assert!(out.changed);
    assert!(out.warnings.is_empty());

    let expected = r#"---
icc_artemis_broker::artemis_users_properties_users:
  - 'admin'
  - 'svcX'
  - 'svcA'
  - 'svcB'

icc_artemis_broker::artemis_roles_properties_roles:
  - group: 'admin'
    users: 'admin'
  - group: 'svcX'
    users: 'svcX'
  - group: 'other-read'
    users: 'svcX'
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

icc_artemis_broker::artemis_broker_name: 'broker01'
"#;
    assert_eq!(out.text, expected);
    assert_eq!(out.report.users_added, vec!["svcA", "svcB"]);
    assert_eq!(
        out.report.groups_created,
        vec!["svcA", "svcB", "team-admin", "team-read", "team-write"]
    );
}

#[test]
fn scenario_reconciling_twice_is_a_noop() {
    let mut req = request(ResourceKind::Queue, "team.queue.orders");
    req.producers = strings(&["svcA"]);
    req.consumers = strings(&["svcB"]);

    let first = reconcile_ledger(LEDGER, &req, &LedgerKeys::default()).unwrap();
    let second = reconcile_ledger(&first.text, &req, &LedgerKeys::default()).unwrap();
    assert!(!second.changed);
    assert_eq!(second.text, first.text);
}

#[test]
fn scenario_existing_group_members_stay_first() {
    let ledger = LEDGER.replace(
        "  - group: 'other-read'\n    users: 'svcX'\n",
        "  - group: 'team-read'\n    users: 'old1'\n  - group: 'team-admin'\n    users: 'admin'\n",
    );
    let mut req = request(ResourceKind::Queue, "team.queue.orders");
    req.producers = strings(&["p1", "p2"]);
    req.consumers = strings(&["c1"]);

    let out = reconcile_ledger(&ledger, &req, &LedgerKeys::default()).unwrap();
    let parsed = RoleLedger::parse(&out.text, &LedgerKeys::default());

    assert_eq!(parsed.group("team-read").unwrap().members.render(), "old1,c1");
    assert_eq!(parsed.group("team-write").unwrap().members.render(), "p1,p2");
    assert_eq!(out.report.groups_updated, vec!["team-read"]);
    // team-admin already had admin: its line is untouched.
    assert!(!out.report.groups_updated.contains(&"team-admin".to_string()));
}

#[test]
fn scenario_known_user_gets_no_new_personal_group() {
    let mut req = request(ResourceKind::Queue, "other.queue.x");
    req.consumers = strings(&["svcX"]);

    let out = reconcile_ledger(LEDGER, &req, &LedgerKeys::default()).unwrap();
    assert!(out.report.users_added.is_empty());
    // other-read already lists svcX, so only the admin group is new.
    assert_eq!(out.report.groups_created, vec!["other-admin"]);
    assert!(out.report.groups_updated.is_empty());
    assert_eq!(out.text.matches("group: 'svcX'").count(), 1);
}

#[test]
fn scenario_subscribers_join_read_group_and_write_group_is_skipped() {
    let mut req = request(ResourceKind::Topic, "team.topic.events");
    req.subscriptions = vec![
        SubscriptionSpec::new("audit-sub", "svcD", true),
        SubscriptionSpec::new("old-sub", "svcOld", false),
    ];

    let out = reconcile_ledger(LEDGER, &req, &LedgerKeys::default()).unwrap();
    let parsed = RoleLedger::parse(&out.text, &LedgerKeys::default());

    assert!(parsed.has_user("svcD"));
    assert!(!parsed.has_user("svcOld"));
    assert_eq!(parsed.group("team-read").unwrap().members.render(), "svcD");
    assert!(parsed.group("team-write").is_none());
}

#[test]
fn scenario_missing_sections_are_appended_with_warning() {
    let ledger = "---\nsome::other_key: 1\n";
    let mut req = request(ResourceKind::Queue, "team.queue.orders");
    req.producers = strings(&["svcA"]);

    let out = reconcile_ledger(ledger, &req, &LedgerKeys::default()).unwrap();
    assert!(out.changed);
    assert_eq!(out.warnings.len(), 2);
    assert!(out.text.starts_with(ledger));
    assert!(out.text.contains("# artemis-broker users\nicc_artemis_broker::artemis_users_properties_users:\n  - 'svcA'\n"));
    assert!(out.text.contains("  - group: 'team-write'\n    users: 'svcA'\n"));

    let again = reconcile_ledger(&out.text, &req, &LedgerKeys::default()).unwrap();
    assert!(!again.changed);
    assert!(again.warnings.is_empty());
}

#[test]
fn scenario_double_quoted_ledger_keeps_its_quote_style() {
    let ledger = "icc_artemis_broker::artemis_users_properties_users:\n    - \"admin\"\nicc_artemis_broker::artemis_roles_properties_roles:\n    - group: \"admin\"\n      users: \"admin\"\n";
    let mut req = request(ResourceKind::Queue, "team.q");
    req.producers = strings(&["svcA"]);

    let out = reconcile_ledger(ledger, &req, &LedgerKeys::default()).unwrap();
    assert!(out.text.contains("    - \"admin\"\n    - \"svcA\"\n"));
    assert!(out.text.contains("    - group: \"svcA\"\n      users: \"svcA\"\n"));
}

#[test]
fn scenario_unsafe_identity_is_refused() {
    let mut req = request(ResourceKind::Queue, "team.q");
    req.producers = strings(&["svc'A"]);

    let err = reconcile_ledger(LEDGER, &req, &LedgerKeys::default()).unwrap_err();
    assert_eq!(
        err,
        ReconcileError::UnsafeToken {
            artifact: Artifact::Ledger,
            token: "svc'A".to_string()
        }
    );
}

#[test]
fn scenario_comments_and_blank_lines_inside_users_do_not_hide_entries() {
    let ledger = "\
icc_artemis_broker::artemis_users_properties_users:
  - 'admin'
  # team users

  - 'svcB'

icc_artemis_broker::artemis_roles_properties_roles:
  - group: 'admin'
    users: 'admin'
";
    let mut req = request(ResourceKind::Queue, "team.queue.orders");
    req.consumers = strings(&["svcB", "svcC"]);

    let out = reconcile_ledger(ledger, &req, &LedgerKeys::default()).unwrap();

    assert_eq!(out.report.users_added, vec!["svcC"]);
    assert_eq!(out.text.matches("- 'svcB'").count(), 1);
    // New users go after the last real entry, not after the comment.
    assert!(out.text.contains("  - 'svcB'\n  - 'svcC'\n"));
    assert!(out.text.contains("  # team users\n\n  - 'svcB'\n"));
}

#[test]
fn scenario_blank_lines_between_groups_do_not_hide_entries() {
    let ledger = "\
icc_artemis_broker::artemis_users_properties_users:
  - 'admin'
  - 'svcB'

icc_artemis_broker::artemis_roles_properties_roles:
  - group: 'admin'
    users: 'admin'

  - group: 'team-read'
    # consumers of team queues
    users: 'svcB'

  - group: 'team-admin'
    users: 'admin'
";
    let parsed = RoleLedger::parse(ledger, &LedgerKeys::default());
    assert_eq!(parsed.groups.len(), 3);
    assert_eq!(parsed.group("team-read").unwrap().members.render(), "svcB");

    let mut req = request(ResourceKind::Queue, "team.queue.orders");
    req.consumers = strings(&["svcB"]);

    let out = reconcile_ledger(ledger, &req, &LedgerKeys::default()).unwrap();
    assert!(!out.changed);
    assert_eq!(out.text, ledger);
}

#[test]
fn scenario_group_after_blank_line_is_updated_in_place() {
    let ledger = "\
icc_artemis_broker::artemis_users_properties_users:
  - 'admin'

icc_artemis_broker::artemis_roles_properties_roles:
  - group: 'admin'
    users: 'admin'

  - group: 'team-read'
    users: 'old1'

icc_artemis_broker::artemis_broker_name: 'broker01'
";
    let mut req = request(ResourceKind::Queue, "team.queue.orders");
    req.consumers = strings(&["c1"]);

    let out = reconcile_ledger(ledger, &req, &LedgerKeys::default()).unwrap();
    assert_eq!(out.text.matches("group: 'team-read'").count(), 1);
    assert!(out.text.contains("  - group: 'team-read'\n    users: 'old1,c1'\n"));
    assert_eq!(out.report.groups_updated, vec!["team-read"]);
    // Created groups land after the last entry, before the next top-level key.
    let admin_at = out.text.find("group: 'team-admin'").unwrap();
    assert!(admin_at < out.text.find("artemis_broker_name").unwrap());
    assert!(admin_at > out.text.find("group: 'team-read'").unwrap());
}
