//! acmq-catalog
//!
//! Read-only view of what the broker artifacts currently grant: every ledger user with
//! the queues and topics it can produce to, consume from or subscribe to, and every
//! queue and topic with its producers and consumers.
//!
//! Role names found in permissions are expanded through the ledger's groups. A role
//! with no matching group is listed as-is.

use std::collections::{BTreeMap, HashMap};

use acmq_reconcile::topology::{MatchPattern, RoutingMode, SecurityScope};
use acmq_reconcile::{display_name, LedgerKeys, OrderedSet, RoleLedger, TopologyDocument};
use serde::Serialize;
use tracing::{debug, info};

const SUBSCRIPTION_MARKER: &str = "_subscription_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Queue,
    Topic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleItem {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserRoles {
    pub producer: Vec<RoleItem>,
    pub consumer: Vec<RoleItem>,
    pub subscription: Vec<RoleItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserEntry {
    pub id: String,
    pub name: String,
    pub team: String,
    pub roles: UserRoles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    pub id: String,
    pub name: String,
    pub team: String,
    pub producers: Vec<String>,
    pub consumers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicEntry {
    pub id: String,
    pub name: String,
    pub team: String,
    pub producers: Vec<String>,
    /// Subscription name => subscriber.
    pub subscriptions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub users: Vec<UserEntry>,
    pub queues: Vec<QueueEntry>,
    pub topics: Vec<TopicEntry>,
}

impl Catalog {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn queue(&self, name: &str) -> Option<&QueueEntry> {
        self.queues.iter().find(|q| q.name == name)
    }

    pub fn topic(&self, name: &str) -> Option<&TopicEntry> {
        self.topics.iter().find(|t| t.name == name)
    }

    pub fn user(&self, name: &str) -> Option<&UserEntry> {
        self.users.iter().find(|u| u.name == name)
    }
}

/// `Team <Prefix>` from the text before the first `_` or `.`.
fn team_of(name: &str) -> String {
    let prefix = name.split(['_', '.']).next().unwrap_or_default();
    let mut chars = prefix.chars();
    match chars.next() {
        Some(first) => format!("Team {}{}", first.to_uppercase(), chars.as_str()),
        None => "Team Unknown".to_string(),
    }
}

fn expand(ledger: &RoleLedger, roles: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
    let mut out: OrderedSet<String> = OrderedSet::new();
    for role in roles {
        let role = role.as_ref();
        match ledger.group(role) {
            Some(group) => {
                out.extend_from(group.members.roles().map(str::to_string));
            }
            None => {
                out.insert(role.to_string());
            }
        }
    }
    out.into_vec()
}

fn granted(ledger: &RoleLedger, scope: &SecurityScope, kind: &str) -> Vec<String> {
    scope
        .permission(kind)
        .map(|p| expand(ledger, p.roles.roles()))
        .unwrap_or_default()
}

fn classify(doc: &TopologyDocument, var: &str) -> Option<ResourceType> {
    match doc.address(var).and_then(|a| a.mode) {
        Some(RoutingMode::Anycast) => Some(ResourceType::Queue),
        Some(RoutingMode::Multicast) => Some(ResourceType::Topic),
        None if var.contains("_queue_") => Some(ResourceType::Queue),
        None if var.contains("_topic_") => Some(ResourceType::Topic),
        None => None,
    }
}

/// Subscriber of a subscription scope: its first non-pinned `consume` role. Scopes
/// without one fall back to the text after `_subscription_` in the variable, or the
/// whole variable.
fn subscriber_of(scope: &SecurityScope, subscription_var: &str) -> String {
    if let Some(role) = scope.permission("consume").and_then(|p| p.roles.rest().iter().next()) {
        return role.clone();
    }
    let raw = subscription_var
        .find(SUBSCRIPTION_MARKER)
        .map(|i| &subscription_var[i + SUBSCRIPTION_MARKER.len()..])
        .unwrap_or(subscription_var);
    raw.replace('_', "-")
}

#[derive(Default)]
struct Grants {
    producer: Vec<RoleItem>,
    consumer: Vec<RoleItem>,
    subscription: Vec<RoleItem>,
}

pub fn build_catalog(ledger_text: &str, topology_text: &str, keys: &LedgerKeys) -> Catalog {
    let ledger = RoleLedger::parse(ledger_text, keys);
    let doc = TopologyDocument::parse(topology_text);

    let mut catalog = Catalog::default();
    let mut grants: HashMap<String, Grants> = HashMap::new();

    for scope in &doc.scopes {
        let MatchPattern::Resource(var) = &scope.pattern else {
            continue;
        };
        let name = display_name(var);
        match classify(&doc, var) {
            Some(ResourceType::Queue) => {
                let producers = granted(&ledger, scope, "send");
                let consumers = granted(&ledger, scope, "consume");
                for p in &producers {
                    grants.entry(p.clone()).or_default().producer.push(RoleItem {
                        resource_type: ResourceType::Queue,
                        name: name.clone(),
                        subscription: None,
                    });
                }
                for c in &consumers {
                    grants.entry(c.clone()).or_default().consumer.push(RoleItem {
                        resource_type: ResourceType::Queue,
                        name: name.clone(),
                        subscription: None,
                    });
                }
                catalog.queues.push(QueueEntry {
                    id: format!("queue-{}", catalog.queues.len() + 1),
                    team: team_of(var),
                    name,
                    producers,
                    consumers,
                });
            }
            Some(ResourceType::Topic) => {
                let producers = granted(&ledger, scope, "send");
                for p in &producers {
                    grants.entry(p.clone()).or_default().producer.push(RoleItem {
                        resource_type: ResourceType::Topic,
                        name: name.clone(),
                        subscription: None,
                    });
                }
                let mut subscriptions = BTreeMap::new();
                for (sub_var, sub_scope) in doc.subscription_scopes(var) {
                    let subscription = sub_var.replace('_', "-");
                    let subscriber = subscriber_of(sub_scope, sub_var);
                    grants.entry(subscriber.clone()).or_default().subscription.push(RoleItem {
                        resource_type: ResourceType::Topic,
                        name: name.clone(),
                        subscription: Some(subscription.clone()),
                    });
                    subscriptions.insert(subscription, subscriber);
                }
                catalog.topics.push(TopicEntry {
                    id: format!("topic-{}", catalog.topics.len() + 1),
                    team: team_of(var),
                    name,
                    producers,
                    subscriptions,
                });
            }
            None => debug!(resource = %var, "resource scope is neither queue nor topic; skipped"),
        }
    }

    for (i, user) in ledger.users.iter().enumerate() {
        let g = grants.remove(user).unwrap_or_default();
        catalog.users.push(UserEntry {
            id: format!("user-{}", i + 1),
            name: user.clone(),
            team: team_of(user),
            roles: UserRoles {
                producer: g.producer,
                consumer: g.consumer,
                subscription: g.subscription,
            },
        });
    }

    info!(
        users = catalog.users.len(),
        queues = catalog.queues.len(),
        topics = catalog.topics.len(),
        "catalog built"
    );
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_from_prefix() {
        assert_eq!(team_of("paypay_queue_orders"), "Team Paypay");
        assert_eq!(team_of("svc.billing"), "Team Svc");
        assert_eq!(team_of("svcA"), "Team SvcA");
        assert_eq!(team_of(""), "Team Unknown");
    }
}
