use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationError};

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

/// Request payload exactly as the provisioning front end posts it.
///
/// Kinds are plain strings here so that an unknown `resourceType` surfaces as a
/// `ValidationError` instead of an opaque deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChangeRequest {
    pub request_type: String,
    pub resource_type: String,
    pub name: String,
    #[serde(default)]
    pub producers: Option<Vec<String>>,
    #[serde(default)]
    pub consumers: Option<Vec<String>>,
    #[serde(default)]
    pub subscriptions: Vec<RawSubscription>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub requester: String,
    #[serde(default)]
    pub ticket_number: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubscription {
    pub subscription_name: String,
    pub subscriber: String,
    #[serde(default, rename = "isNew")]
    pub is_new: bool,
}

// ---------------------------------------------------------------------------
// Typed request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    New,
    Update,
}

impl RequestKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" => Some(RequestKind::New),
            "update" => Some(RequestKind::Update),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::New => "new",
            RequestKind::Update => "update",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Queue,
    Topic,
}

impl ResourceKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queue" => Some(ResourceKind::Queue),
            "topic" => Some(ResourceKind::Topic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Queue => "queue",
            ResourceKind::Topic => "topic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    pub subscription_name: String,
    pub subscriber: String,
    #[serde(rename = "isNew")]
    pub is_new: bool,
}

impl SubscriptionSpec {
    pub fn new(subscription_name: impl Into<String>, subscriber: impl Into<String>, is_new: bool) -> Self {
        Self {
            subscription_name: subscription_name.into(),
            subscriber: subscriber.into(),
            is_new,
        }
    }
}

/// A validated provisioning request.
///
/// `producers` / `consumers` keep the absent-vs-empty distinction of the payload:
/// `None` means "field not provided" and leaves existing grants alone, while
/// `Some(vec![])` means "provided, and empty".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub kind: RequestKind,
    pub resource_kind: ResourceKind,
    pub name: String,
    pub producers: Option<Vec<String>>,
    pub consumers: Option<Vec<String>>,
    pub subscriptions: Vec<SubscriptionSpec>,
    pub description: Option<String>,
    pub team: String,
    pub requester: String,
    pub ticket: String,
}

impl ChangeRequest {
    /// Parse and validate a JSON payload.
    pub fn from_json(raw: &str) -> Result<Self, ValidationError> {
        let wire: RawChangeRequest =
            serde_json::from_str(raw).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::try_from(wire)
    }

    /// Producers, treating an absent field as empty.
    pub fn producers(&self) -> &[String] {
        self.producers.as_deref().unwrap_or(&[])
    }

    /// Consumers, treating an absent field as empty.
    pub fn consumers(&self) -> &[String] {
        self.consumers.as_deref().unwrap_or(&[])
    }

    /// Subscriptions that must be provisioned. `isNew=false` entries are informational.
    pub fn new_subscriptions(&self) -> impl Iterator<Item = &SubscriptionSpec> {
        self.subscriptions.iter().filter(|s| s.is_new)
    }

    pub fn has_new_subscriptions(&self) -> bool {
        self.new_subscriptions().next().is_some()
    }

    pub fn has_producers_or_consumers(&self) -> bool {
        !self.producers().is_empty() || !self.consumers().is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_request(self)
    }
}

impl TryFrom<RawChangeRequest> for ChangeRequest {
    type Error = ValidationError;

    fn try_from(raw: RawChangeRequest) -> Result<Self, Self::Error> {
        let kind = RequestKind::parse(&raw.request_type)
            .ok_or_else(|| ValidationError::UnsupportedRequestKind(raw.request_type.clone()))?;
        let resource_kind = ResourceKind::parse(&raw.resource_type)
            .ok_or_else(|| ValidationError::UnsupportedResourceKind(raw.resource_type.clone()))?;

        let request = ChangeRequest {
            kind,
            resource_kind,
            name: raw.name.trim().to_string(),
            producers: raw.producers.map(trim_all),
            consumers: raw.consumers.map(trim_all),
            subscriptions: raw
                .subscriptions
                .into_iter()
                .map(|s| SubscriptionSpec {
                    subscription_name: s.subscription_name.trim().to_string(),
                    subscriber: s.subscriber.trim().to_string(),
                    is_new: s.is_new,
                })
                .collect(),
            description: raw.description.filter(|d| !d.trim().is_empty()),
            team: raw.team.trim().to_string(),
            requester: raw.requester.trim().to_string(),
            ticket: raw.ticket_number.trim().to_string(),
        };
        request.validate()?;
        Ok(request)
    }
}

fn trim_all(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
