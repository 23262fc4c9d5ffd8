//! acmq-schemas
//!
//! Wire and domain types shared by every provisioning crate:
//! - `RawChangeRequest`: the JSON payload as submitted by the provisioning front end
//! - `ChangeRequest`: the validated, typed request the reconcilers consume
//! - `ProvisionStatus`: the per-request outcome record kept by the status store
//!
//! Validation lives next to the types so every entry point (CLI, tests, any future
//! HTTP layer) rejects the same malformed requests with the same messages.

mod request;
mod status;
mod validation;

pub use request::{ChangeRequest, RawChangeRequest, RawSubscription, RequestKind, ResourceKind, SubscriptionSpec};
pub use status::{ProvisionState, ProvisionStatus};
pub use validation::{validate_resource_name, ValidationError, MAX_NAME_LEN, MAX_TICKET_LEN};
