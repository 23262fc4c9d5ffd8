//! Line scanner for the broker.xml ERB template.
//!
//! Recognizes just enough structure to reconcile against: `<security-setting>` blocks
//! with their `<permission>` children, `<address>` entries with their routing element
//! and `<queue>` children, the two section closing tags, and the indentation and ERB
//! spacing conventions the file already uses.

use serde::Serialize;

use crate::roles::RoleList;
use crate::text::{attr, is_identifier_char, leading_ws, SourceLines};

/// `<%= @address_foo %>` with `kind = "address_"` => `foo`. Tolerates any spacing.
pub(crate) fn erb_var<'a>(raw: &'a str, kind: &str) -> Option<&'a str> {
    let inner = raw.trim().strip_prefix("<%=")?.strip_suffix("%>")?.trim();
    let var = inner.strip_prefix('@')?.strip_prefix(kind)?;
    (!var.is_empty() && var.chars().all(is_identifier_char)).then_some(var)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MatchPattern {
    /// `team.#`
    Namespace(String),
    /// `<%= @address_<var> %>.#`, holding `<var>`.
    Resource(String),
    /// `<%= @address_<var> %>::<%= @multicast_<sub> %>`, holding `<var>` and `<sub>`.
    Subscription { resource: String, subscription: String },
    Other(String),
}

impl MatchPattern {
    pub fn parse(raw: &str) -> Self {
        if let Some((left, right)) = raw.split_once("::") {
            if let (Some(resource), Some(subscription)) = (erb_var(left, "address_"), erb_var(right, "multicast_")) {
                return MatchPattern::Subscription {
                    resource: resource.to_string(),
                    subscription: subscription.to_string(),
                };
            }
        }
        if let Some(head) = raw.strip_suffix(".#") {
            if let Some(var) = erb_var(head, "address_") {
                return MatchPattern::Resource(var.to_string());
            }
            if !head.is_empty() && !head.contains(['<', '%', '#', '*', ':']) {
                return MatchPattern::Namespace(head.to_string());
            }
        }
        MatchPattern::Other(raw.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Permission {
    pub kind: String,
    pub roles: RoleList,
    pub(crate) line: usize,
}

#[derive(Debug, Clone)]
pub struct SecurityScope {
    pub pattern: MatchPattern,
    pub permissions: Vec<Permission>,
    pub(crate) close: usize,
}

impl SecurityScope {
    pub fn permission(&self, kind: &str) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    Anycast,
    Multicast,
}

impl RoutingMode {
    pub fn tag(&self) -> &'static str {
        match self {
            RoutingMode::Anycast => "anycast",
            RoutingMode::Multicast => "multicast",
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueueRef {
    /// Raw `name` attribute.
    pub name: String,
    /// ERB variable the name refers to, e.g. `multicast_audit_sub`.
    pub var: Option<String>,
    pub(crate) line: usize,
}

#[derive(Debug, Clone)]
pub struct AddressEntry {
    pub name: String,
    /// Resource variable when the name is `<%= @address_<var> %>`.
    pub resource: Option<String>,
    pub mode: Option<RoutingMode>,
    pub queues: Vec<QueueRef>,
    pub(crate) open: usize,
    pub(crate) close: usize,
    pub(crate) routing_open: Option<usize>,
    pub(crate) routing_close: Option<usize>,
}

impl AddressEntry {
    pub fn has_queue_var(&self, var: &str) -> bool {
        self.queues.iter().any(|q| q.var.as_deref() == Some(var))
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Layout {
    pub(crate) scope_indent: Option<String>,
    pub(crate) scope_unit: Option<String>,
    pub(crate) address_indent: Option<String>,
    pub(crate) address_unit: Option<String>,
    pub(crate) settings_close_indent: Option<String>,
    pub(crate) addresses_close_indent: Option<String>,
    /// `<%= @x %>` rather than `<%= @x%>`.
    pub(crate) erb_spaced: bool,
}

/// Security scopes and address entries of a broker template, in file order.
#[derive(Debug, Clone)]
pub struct TopologyDocument {
    pub scopes: Vec<SecurityScope>,
    pub addresses: Vec<AddressEntry>,
    pub(crate) settings_close: Option<usize>,
    pub(crate) addresses_close: Option<usize>,
    pub(crate) layout: Layout,
}

fn relative_unit(outer: &str, inner: &str) -> Option<String> {
    inner
        .strip_prefix(outer)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// Spacing of ERB references in `match="…"` / `name="…"` attributes, which is what
/// inserted blocks sit next to. Other references (e.g. `<name><%= @broker_name %>`)
/// are only consulted when no attribute carries one.
fn detect_erb_spacing(text: &str) -> bool {
    let attribute = ["match=\"<%=", "name=\"<%="]
        .iter()
        .filter_map(|pat| text.find(pat).map(|at| at + pat.len() - "<%=".len()))
        .min();
    attribute
        .or_else(|| text.find("<%="))
        .and_then(|start| text[start..].find("%>").map(|end| &text[start..start + end]))
        .map(|tag| tag.ends_with(' '))
        .unwrap_or(true)
}

fn find_close(src: &SourceLines<'_>, from: usize, tag: &str) -> Option<usize> {
    (from..src.len()).find(|&i| src.get(i).contains(tag))
}

impl TopologyDocument {
    pub fn parse(text: &str) -> Self {
        Self::scan(&SourceLines::new(text), text)
    }

    pub(crate) fn scan(src: &SourceLines<'_>, text: &str) -> Self {
        let mut doc = TopologyDocument {
            scopes: Vec::new(),
            addresses: Vec::new(),
            settings_close: None,
            addresses_close: None,
            layout: Layout {
                erb_spaced: detect_erb_spacing(text),
                ..Layout::default()
            },
        };

        let mut i = 0;
        while i < src.len() {
            let line = src.get(i);
            let t = line.trim_start();

            if t.starts_with("<security-setting ") || t.starts_with("<security-setting\t") {
                let close = if t.contains("</security-setting>") || t.trim_end().ends_with("/>") {
                    i
                } else {
                    find_close(src, i + 1, "</security-setting>").unwrap_or(i)
                };
                let scope = doc.scan_scope(src, i, close);
                doc.scopes.push(scope);
                i = close + 1;
                continue;
            }

            if t.starts_with("<address ") || t.starts_with("<address\t") {
                let close = if t.contains("</address>") || t.trim_end().ends_with("/>") {
                    i
                } else {
                    find_close(src, i + 1, "</address>").unwrap_or(i)
                };
                let entry = doc.scan_address(src, i, close);
                doc.addresses.push(entry);
                i = close + 1;
                continue;
            }

            if t.contains("</security-settings>") {
                doc.settings_close = Some(i);
                doc.layout.settings_close_indent = Some(leading_ws(line).to_string());
            }
            if t.contains("</addresses>") {
                doc.addresses_close = Some(i);
                doc.layout.addresses_close_indent = Some(leading_ws(line).to_string());
            }
            i += 1;
        }
        doc
    }

    fn scan_scope(&mut self, src: &SourceLines<'_>, open: usize, close: usize) -> SecurityScope {
        let line = src.get(open);
        let indent = leading_ws(line);
        if self.layout.scope_indent.is_none() {
            self.layout.scope_indent = Some(indent.to_string());
        }

        let mut permissions = Vec::new();
        for j in open + 1..close {
            let p = src.get(j);
            if !p.trim_start().starts_with("<permission") {
                continue;
            }
            if self.layout.scope_unit.is_none() {
                self.layout.scope_unit = relative_unit(indent, leading_ws(p));
            }
            if let Some(kind) = attr(p, "type") {
                permissions.push(Permission {
                    kind: kind.to_string(),
                    roles: RoleList::parse(attr(p, "roles").unwrap_or("")),
                    line: j,
                });
            }
        }

        SecurityScope {
            pattern: MatchPattern::parse(attr(line, "match").unwrap_or("")),
            permissions,
            close,
        }
    }

    fn scan_address(&mut self, src: &SourceLines<'_>, open: usize, close: usize) -> AddressEntry {
        let line = src.get(open);
        let indent = leading_ws(line);
        if self.layout.address_indent.is_none() {
            self.layout.address_indent = Some(indent.to_string());
        }

        let name = attr(line, "name").unwrap_or("").to_string();
        let mut entry = AddressEntry {
            resource: erb_var(&name, "address_").map(str::to_string),
            name,
            mode: None,
            queues: Vec::new(),
            open,
            close,
            routing_open: None,
            routing_close: None,
        };

        for j in open + 1..close {
            let l = src.get(j);
            let t = l.trim_start();
            for mode in [RoutingMode::Anycast, RoutingMode::Multicast] {
                let tag = mode.tag();
                if t.starts_with(&format!("<{tag}")) && entry.routing_open.is_none() {
                    if self.layout.address_unit.is_none() {
                        self.layout.address_unit = relative_unit(indent, leading_ws(l));
                    }
                    entry.mode = Some(mode);
                    entry.routing_open = Some(j);
                    entry.routing_close = if t.trim_end().ends_with("/>") {
                        Some(j)
                    } else {
                        find_close(src, j + 1, &format!("</{tag}>")).filter(|&c| c < close)
                    };
                }
            }
            if t.starts_with("<queue") {
                if let Some(qname) = attr(l, "name") {
                    entry.queues.push(QueueRef {
                        name: qname.to_string(),
                        var: erb_var(qname, "").map(str::to_string),
                        line: j,
                    });
                }
            }
        }
        if entry.mode.is_none() && open == close {
            if line.contains("<multicast") {
                entry.mode = Some(RoutingMode::Multicast);
            } else if line.contains("<anycast") {
                entry.mode = Some(RoutingMode::Anycast);
            }
        }
        entry
    }

    pub fn namespace_scope(&self, prefix: &str) -> Option<&SecurityScope> {
        self.scopes
            .iter()
            .find(|s| matches!(&s.pattern, MatchPattern::Namespace(p) if p == prefix))
    }

    pub fn resource_scope(&self, var: &str) -> Option<&SecurityScope> {
        self.scopes
            .iter()
            .find(|s| matches!(&s.pattern, MatchPattern::Resource(v) if v == var))
    }

    pub fn subscription_scope(&self, var: &str, subscription: &str) -> Option<&SecurityScope> {
        self.scopes.iter().find(|s| {
            matches!(&s.pattern, MatchPattern::Subscription { resource, subscription: sub }
                if resource == var && sub == subscription)
        })
    }

    /// Subscription scopes hanging off a resource.
    pub fn subscription_scopes<'a>(&'a self, var: &'a str) -> impl Iterator<Item = (&'a str, &'a SecurityScope)> + 'a {
        self.scopes.iter().filter_map(move |s| match &s.pattern {
            MatchPattern::Subscription { resource, subscription } if resource == var => {
                Some((subscription.as_str(), s))
            }
            _ => None,
        })
    }

    pub fn address(&self, var: &str) -> Option<&AddressEntry> {
        self.addresses.iter().find(|a| a.resource.as_deref() == Some(var))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erb_references_tolerate_spacing() {
        assert_eq!(erb_var("<%= @address_foo %>", "address_"), Some("foo"));
        assert_eq!(erb_var("<%=@address_foo%>", "address_"), Some("foo"));
        assert_eq!(erb_var("<%= @multicast_foo %>", "address_"), None);
        assert_eq!(erb_var("foo", "address_"), None);
    }

    #[test]
    fn match_patterns_are_classified() {
        assert_eq!(MatchPattern::parse("team.#"), MatchPattern::Namespace("team".into()));
        assert_eq!(
            MatchPattern::parse("<%= @address_team_queue_orders%>.#"),
            MatchPattern::Resource("team_queue_orders".into())
        );
        assert_eq!(
            MatchPattern::parse("<%= @address_t %>::<%= @multicast_audit_sub %>"),
            MatchPattern::Subscription {
                resource: "t".into(),
                subscription: "audit_sub".into()
            }
        );
        assert_eq!(MatchPattern::parse("#"), MatchPattern::Other("#".into()));
    }

    #[test]
    fn erb_spacing_follows_first_reference() {
        assert!(detect_erb_spacing("<a b=\"<%= @x %>\"/>"));
        assert!(!detect_erb_spacing("<a b=\"<%= @x%>\"/>"));
        assert!(detect_erb_spacing("<a/>"));
    }

    #[test]
    fn erb_spacing_prefers_attribute_references() {
        let text = "<name><%= @broker_name %></name>\n<security-setting match=\"<%= @address_x%>\">\n";
        assert!(!detect_erb_spacing(text));
        let text = "<name><%=@broker_name%></name>\n<address name=\"<%= @address_x %>\">\n";
        assert!(detect_erb_spacing(text));
    }
}
