use acmq_testkit::{fixtures, seed_workspace};
use predicates::prelude::*;

#[allow(deprecated)]
fn acmq() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("acmq-cli").unwrap()
}

#[test]
fn catalog_prints_json() {
    let seeded = seed_workspace(&fixtures::populated()).unwrap();

    let out = acmq()
        .args(["catalog", "--workspace"])
        .arg(seeded.dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["queues"][0]["name"], "team.queue.payments");
    assert_eq!(json["topics"][0]["subscriptions"]["existing-sub"], "svcE");
    assert_eq!(json["users"].as_array().map(Vec::len), Some(4));
}

#[test]
fn config_hash_is_stable_across_key_order() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.yaml");
    let b = dir.path().join("b.yaml");
    std::fs::write(&a, "status:\n  retention_secs: 60\ngit:\n  token_env: ACMQ_GIT_TOKEN\n").unwrap();
    std::fs::write(&b, "git:\n  token_env: ACMQ_GIT_TOKEN\nstatus:\n  retention_secs: 60\n").unwrap();

    let hash = |path: &std::path::Path| {
        let out = acmq().arg("config-hash").arg(path).assert().success().get_output().stdout.clone();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .next()
            .unwrap()
            .to_string()
    };
    let ha = hash(&a);
    assert!(ha.starts_with("config_hash="));
    assert_eq!(ha, hash(&b));
}

#[test]
fn config_hash_refuses_literal_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("bad.yaml");
    std::fs::write(&cfg, "git:\n  token_env: glpat-abcdefghijklmnop\n").unwrap();

    acmq()
        .arg("config-hash")
        .arg(&cfg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"))
        .stderr(predicate::str::contains("glpat-abcdefghijklmnop").not());
}

#[test]
fn validate_name_prints_derived_identifiers() {
    acmq()
        .args(["validate-name", "team.queue.order-events"])
        .assert()
        .success()
        .stdout(predicate::str::contains("identifier=team_queue_order_events\n"))
        .stdout(predicate::str::contains("namespace=team\n"))
        .stdout(predicate::str::contains("admin_group=team-admin\n"))
        .stdout(predicate::str::contains("read_group=team-read\n"))
        .stdout(predicate::str::contains("write_group=team-write\n"));
}

#[test]
fn validate_name_rejects_markup() {
    acmq()
        .args(["validate-name", "team.<queue>"])
        .assert()
        .failure();
}
