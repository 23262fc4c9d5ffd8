use acmq_schemas::{
    ChangeRequest, RawChangeRequest, RawSubscription, RequestKind, ResourceKind, SubscriptionSpec, ValidationError,
};
use anyhow::{Context, Result};

/// Fluent builder for change requests. Defaults: team `team`, requester `jane`,
/// ticket `OPS-1`, producers and consumers absent.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    req: ChangeRequest,
}

impl RequestBuilder {
    fn new(kind: RequestKind, resource_kind: ResourceKind, name: &str) -> Self {
        Self {
            req: ChangeRequest {
                kind,
                resource_kind,
                name: name.to_string(),
                producers: None,
                consumers: None,
                subscriptions: Vec::new(),
                description: None,
                team: "team".to_string(),
                requester: "jane".to_string(),
                ticket: "OPS-1".to_string(),
            },
        }
    }

    pub fn new_queue(name: &str) -> Self {
        Self::new(RequestKind::New, ResourceKind::Queue, name)
    }

    pub fn new_topic(name: &str) -> Self {
        Self::new(RequestKind::New, ResourceKind::Topic, name)
    }

    pub fn update_queue(name: &str) -> Self {
        Self::new(RequestKind::Update, ResourceKind::Queue, name)
    }

    pub fn update_topic(name: &str) -> Self {
        Self::new(RequestKind::Update, ResourceKind::Topic, name)
    }

    pub fn producers(mut self, ids: &[&str]) -> Self {
        self.req.producers = Some(ids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn consumers(mut self, ids: &[&str]) -> Self {
        self.req.consumers = Some(ids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn subscription(mut self, name: &str, subscriber: &str, is_new: bool) -> Self {
        self.req.subscriptions.push(SubscriptionSpec::new(name, subscriber, is_new));
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.req.description = Some(text.to_string());
        self
    }

    pub fn ticket(mut self, ticket: &str) -> Self {
        self.req.ticket = ticket.to_string();
        self
    }

    pub fn requester(mut self, requester: &str) -> Self {
        self.req.requester = requester.to_string();
        self
    }

    /// Validated request.
    pub fn build(self) -> Result<ChangeRequest, ValidationError> {
        self.req.validate()?;
        Ok(self.req)
    }

    /// Request as-is, for exercising validation downstream.
    pub fn unchecked(self) -> ChangeRequest {
        self.req
    }

    pub fn raw(self) -> RawChangeRequest {
        let req = self.req;
        RawChangeRequest {
            request_type: req.kind.as_str().to_string(),
            resource_type: req.resource_kind.as_str().to_string(),
            name: req.name,
            producers: req.producers,
            consumers: req.consumers,
            subscriptions: req
                .subscriptions
                .into_iter()
                .map(|s| RawSubscription {
                    subscription_name: s.subscription_name,
                    subscriber: s.subscriber,
                    is_new: s.is_new,
                })
                .collect(),
            description: req.description,
            team: req.team,
            requester: req.requester,
            ticket_number: req.ticket,
        }
    }

    /// JSON payload as the front end would post it.
    pub fn json(self) -> Result<String> {
        serde_json::to_string_pretty(&self.raw()).context("serialize request")
    }
}
