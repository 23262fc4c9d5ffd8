use acmq_schemas::*;

fn payload(body: &str) -> String {
    format!(
        r#"{{"requestType":"new","name":"team.queue.orders","team":"team","requester":"jane","ticketNumber":"OPS-12",{body}}}"#
    )
}

#[test]
fn scenario_queue_payload_parses_into_typed_request() {
    let req = ChangeRequest::from_json(&payload(
        r#""resourceType":"queue","producers":["svcA"],"consumers":[" svcB "]"#,
    ))
    .expect("valid payload");

    assert_eq!(req.kind, RequestKind::New);
    assert_eq!(req.resource_kind, ResourceKind::Queue);
    assert_eq!(req.producers(), ["svcA".to_string()]);
    assert_eq!(req.consumers(), ["svcB".to_string()]);
    assert_eq!(req.ticket, "OPS-12");
}

#[test]
fn scenario_absent_and_empty_lists_stay_distinct() {
    let req = ChangeRequest::from_json(&payload(
        r#""resourceType":"queue","producers":[],"consumers":["svcC"]"#,
    ))
    .expect("valid payload");

    assert_eq!(req.producers, Some(vec![]));

    let req = ChangeRequest::from_json(&payload(r#""resourceType":"queue","consumers":["svcC"]"#))
        .expect("valid payload");
    assert_eq!(req.producers, None);
    assert!(req.producers().is_empty());
}

#[test]
fn scenario_unknown_resource_kind_is_a_validation_error() {
    let err = ChangeRequest::from_json(&payload(r#""resourceType":"exchange","producers":["svcA"]"#))
        .unwrap_err();
    assert_eq!(err, ValidationError::UnsupportedResourceKind("exchange".to_string()));
}

#[test]
fn scenario_only_informational_subscription_is_nothing_to_provision() {
    let err = ChangeRequest::from_json(&payload(
        r#""resourceType":"topic","subscriptions":[{"subscriptionName":"audit-sub","subscriber":"svcD","isNew":false}]"#,
    ))
    .unwrap_err();
    assert_eq!(err, ValidationError::NothingToProvision);
}

#[test]
fn scenario_new_subscription_alone_is_enough_for_a_topic() {
    let req = ChangeRequest::from_json(&payload(
        r#""resourceType":"topic","subscriptions":[{"subscriptionName":"audit-sub","subscriber":"svcD","isNew":true}]"#,
    ))
    .expect("valid payload");
    assert!(req.has_new_subscriptions());
    assert!(!req.has_producers_or_consumers());
}

#[test]
fn scenario_new_subscription_on_queue_is_rejected() {
    let err = ChangeRequest::from_json(&payload(
        r#""resourceType":"queue","subscriptions":[{"subscriptionName":"s","subscriber":"svcD","isNew":true}]"#,
    ))
    .unwrap_err();
    assert_eq!(err, ValidationError::SubscriptionsOnQueue);
}

#[test]
fn scenario_names_with_markup_characters_are_rejected() {
    assert!(validate_resource_name("team.queue.orders").is_ok());
    assert!(validate_resource_name("team queue").is_err());
    assert!(validate_resource_name("team'queue").is_err());
    assert!(validate_resource_name("").is_err());
    assert!(validate_resource_name(&"a".repeat(MAX_NAME_LEN + 1)).is_err());

    let err = ChangeRequest::from_json(&payload(r#""resourceType":"queue","producers":["svc<A>"]"#))
        .unwrap_err();
    assert_eq!(err, ValidationError::InvalidIdentity("svc<A>".to_string()));
}

#[test]
fn scenario_ticket_rules_are_enforced() {
    let body = r#"{"requestType":"new","resourceType":"queue","name":"team.q","team":"t","requester":"r","ticketNumber":"OPS 1","producers":["a"]}"#;
    assert_eq!(
        ChangeRequest::from_json(body).unwrap_err(),
        ValidationError::InvalidTicket("OPS 1".to_string())
    );

    let body = r#"{"requestType":"new","resourceType":"queue","name":"team.q","team":"t","requester":"r","producers":["a"]}"#;
    assert_eq!(
        ChangeRequest::from_json(body).unwrap_err(),
        ValidationError::MissingField("ticketNumber")
    );
}

#[test]
fn scenario_malformed_json_is_reported() {
    let err = ChangeRequest::from_json("{not json").unwrap_err();
    assert!(matches!(err, ValidationError::Malformed(_)));
}
