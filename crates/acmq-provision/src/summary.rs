//! Human-readable change description used as commit message and pull-request body.
//!
//! Output is deterministic for a given request and pre-change ledger so reviewers
//! can diff two summaries of the same request.

use std::fmt::Write as _;

use acmq_reconcile::{RoleLedger, TopologyReport};
use acmq_schemas::{ChangeRequest, ResourceKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    NewResource,
    ResourceUpdate,
    NewSubscription,
}

impl ChangeKind {
    pub fn label(&self, resource: ResourceKind) -> String {
        match self {
            ChangeKind::NewResource => format!("New {}", resource.as_str()),
            ChangeKind::ResourceUpdate => format!("Update of {}", resource.as_str()),
            ChangeKind::NewSubscription => "New subscription on existing topic".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriberNote {
    pub subscription: String,
    pub subscriber: String,
    /// Subscriber was not in the ledger before this request.
    pub new_identity: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub kind: ChangeKind,
    pub resource_kind: ResourceKind,
    pub name: String,
    pub requester: String,
    pub team: String,
    pub ticket: String,
    pub description: Option<String>,
    pub producers: Vec<String>,
    pub consumers: Vec<String>,
    pub subscriptions: Vec<SubscriberNote>,
}

impl ChangeSummary {
    /// `known` is the ledger as it was before this request was applied.
    pub fn build(req: &ChangeRequest, known: &RoleLedger, topology: &TopologyReport) -> Self {
        let kind = if topology.resource_scope_created {
            ChangeKind::NewResource
        } else if req.resource_kind == ResourceKind::Topic && req.has_new_subscriptions() {
            ChangeKind::NewSubscription
        } else {
            ChangeKind::ResourceUpdate
        };

        ChangeSummary {
            kind,
            resource_kind: req.resource_kind,
            name: req.name.clone(),
            requester: req.requester.clone(),
            team: req.team.clone(),
            ticket: req.ticket.clone(),
            description: req.description.clone(),
            producers: req.producers().to_vec(),
            consumers: req.consumers().to_vec(),
            subscriptions: req
                .new_subscriptions()
                .map(|s| SubscriberNote {
                    subscription: s.subscription_name.clone(),
                    subscriber: s.subscriber.clone(),
                    new_identity: !known.has_user(&s.subscriber),
                })
                .collect(),
        }
    }

    pub fn title(&self) -> String {
        format!("[{}] {}: {}", self.ticket, self.kind.label(self.resource_kind), self.name)
    }

    pub fn branch_name(&self) -> String {
        format!("feature/{}", self.ticket)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Requester: {}", self.requester);
        let _ = writeln!(out, "Team: {}", self.team);
        let _ = writeln!(out, "Ticket: {}", self.ticket);
        out.push('\n');

        let _ = writeln!(out, "Request concerns:");
        let _ = writeln!(out, " - {}", self.kind.label(self.resource_kind));
        out.push('\n');

        let heading = match self.resource_kind {
            ResourceKind::Queue => "Queue",
            ResourceKind::Topic => "Topic",
        };
        let _ = writeln!(out, "{heading}:");
        let _ = writeln!(out, " - {}", self.name);

        if self.kind != ChangeKind::NewSubscription || !self.producers.is_empty() || !self.consumers.is_empty() {
            list_section(&mut out, "Producers", &self.producers);
            list_section(&mut out, "Consumers", &self.consumers);
        }

        if !self.subscriptions.is_empty() {
            out.push('\n');
            let _ = writeln!(out, "Subscriptions:");
            for s in &self.subscriptions {
                let who = if s.new_identity { "new user" } else { "existing user" };
                let _ = writeln!(out, " - {} (subscriber: {}, {who})", s.subscription, s.subscriber);
            }
        }

        if let Some(desc) = &self.description {
            out.push('\n');
            let _ = writeln!(out, "Description:");
            let _ = writeln!(out, "{}", desc.trim_end());
        }
        out
    }
}

fn list_section(out: &mut String, title: &str, items: &[String]) {
    out.push('\n');
    let _ = writeln!(out, "{title}:");
    if items.is_empty() {
        let _ = writeln!(out, " - (none)");
    }
    for item in items {
        let _ = writeln!(out, " - {item}");
    }
}
