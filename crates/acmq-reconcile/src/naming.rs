//! Identifier normalization.
//!
//! Resource and subscription names such as `team.queue.orders` or `audit-sub` map to
//! the variable identifiers used in the Puppet and ERB artifacts (`team_queue_orders`,
//! `audit_sub`). The mapping is not injective: `a.b`, `a-b` and `a_b` all normalize to
//! `a_b`, and `display_name` can only guess the original separators.

/// Identity that always holds admin rights and is never taken from a request.
pub const ADMIN_IDENTITY: &str = "admin";

/// Replace `.` and `-` with `_`.
pub fn normalize(name: &str) -> String {
    name.chars()
        .map(|c| if c == '.' || c == '-' { '_' } else { c })
        .collect()
}

/// Text before the first `.`, or the whole name.
pub fn namespace_prefix(name: &str) -> &str {
    match name.split_once('.') {
        Some((prefix, _)) => prefix,
        None => name,
    }
}

/// Best-effort reverse of `normalize` for display.
pub fn display_name(identifier: &str) -> String {
    identifier.replace('_', ".")
}

/// The three conventional groups derived from a namespace prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceGroups {
    pub prefix: String,
    pub admin: String,
    pub read: String,
    pub write: String,
}

impl NamespaceGroups {
    pub fn for_resource(name: &str) -> Self {
        let prefix = namespace_prefix(name);
        Self {
            prefix: prefix.to_string(),
            admin: format!("{prefix}-admin"),
            read: format!("{prefix}-read"),
            write: format!("{prefix}-write"),
        }
    }
}

/// Variable names a resource contributes to the artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceVars {
    /// Normalized resource name, e.g. `team_queue_orders`.
    pub var: String,
    pub address: String,
    pub anycast: String,
}

impl ResourceVars {
    pub fn for_resource(name: &str) -> Self {
        let var = normalize(name);
        Self {
            address: format!("address_{var}"),
            anycast: format!("anycast_{var}"),
            var,
        }
    }

    pub fn multicast(subscription_name: &str) -> String {
        format!("multicast_{}", normalize(subscription_name))
    }
}
