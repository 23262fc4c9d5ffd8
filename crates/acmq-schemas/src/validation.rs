use crate::request::{ChangeRequest, ResourceKind};

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_TICKET_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Payload is not a valid JSON request.
    Malformed(String),
    UnsupportedRequestKind(String),
    UnsupportedResourceKind(String),
    InvalidName(String),
    InvalidTicket(String),
    MissingField(&'static str),
    /// A producer, consumer or subscriber contains characters the artifacts cannot hold.
    InvalidIdentity(String),
    InvalidSubscriptionName(String),
    SubscriptionsOnQueue,
    /// No producers, no consumers and no new subscriptions.
    NothingToProvision,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Malformed(e) => write!(f, "malformed request: {e}"),
            ValidationError::UnsupportedRequestKind(k) => {
                write!(f, "request type must be 'new' or 'update', got '{k}'")
            }
            ValidationError::UnsupportedResourceKind(k) => {
                write!(f, "resource type must be 'queue' or 'topic', got '{k}'")
            }
            ValidationError::InvalidName(n) => write!(
                f,
                "invalid resource name '{n}': only letters, digits, '.', '_' and '-' are allowed (max {MAX_NAME_LEN})"
            ),
            ValidationError::InvalidTicket(t) => write!(
                f,
                "invalid ticket '{t}': only letters, digits, '_' and '-' are allowed (max {MAX_TICKET_LEN})"
            ),
            ValidationError::MissingField(field) => write!(f, "missing required field '{field}'"),
            ValidationError::InvalidIdentity(id) => write!(f, "invalid identity '{id}'"),
            ValidationError::InvalidSubscriptionName(n) => write!(f, "invalid subscription name '{n}'"),
            ValidationError::SubscriptionsOnQueue => {
                write!(f, "new subscriptions can only be requested for a topic")
            }
            ValidationError::NothingToProvision => write!(
                f,
                "at least one producer, consumer or new subscription must be specified"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'
}

fn is_ticket_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Check a queue/topic name against the accepted character set and length.
pub fn validate_resource_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.len() > MAX_NAME_LEN || !name.chars().all(is_name_char) {
        return Err(ValidationError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_identity(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_NAME_LEN || !id.chars().all(is_name_char) {
        return Err(ValidationError::InvalidIdentity(id.to_string()));
    }
    Ok(())
}

pub(crate) fn validate_request(req: &ChangeRequest) -> Result<(), ValidationError> {
    validate_resource_name(&req.name)?;

    if req.team.is_empty() {
        return Err(ValidationError::MissingField("team"));
    }
    if req.requester.is_empty() {
        return Err(ValidationError::MissingField("requester"));
    }
    if req.ticket.is_empty() {
        return Err(ValidationError::MissingField("ticketNumber"));
    }
    if req.ticket.len() > MAX_TICKET_LEN || !req.ticket.chars().all(is_ticket_char) {
        return Err(ValidationError::InvalidTicket(req.ticket.clone()));
    }

    for id in req.producers().iter().chain(req.consumers()) {
        validate_identity(id)?;
    }

    for sub in &req.subscriptions {
        let name = &sub.subscription_name;
        if name.is_empty() || name.len() > MAX_NAME_LEN || !name.chars().all(is_name_char) {
            return Err(ValidationError::InvalidSubscriptionName(name.clone()));
        }
        validate_identity(&sub.subscriber)?;
    }

    if req.resource_kind == ResourceKind::Queue && req.has_new_subscriptions() {
        return Err(ValidationError::SubscriptionsOnQueue);
    }

    if !req.has_producers_or_consumers() && !req.has_new_subscriptions() {
        return Err(ValidationError::NothingToProvision);
    }

    Ok(())
}
