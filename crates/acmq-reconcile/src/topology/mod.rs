//! Topology reconciler for `broker.xml.erb`.
//!
//! Steps, in order:
//! 1. namespace scope `<prefix>.#`, created when missing
//! 2. resource scope `<%= @address_<var> %>.#`, created when missing, otherwise its
//!    `send` / `consume` / `browse` role lists are patched in place
//! 3. one subscription scope per new subscription, placed right after the resource scope
//! 4. the `<address>` entry, or the missing multicast queues of an existing one
//!
//! Role lists keep the namespace admin role first. A `send` list is only replaced
//! when the request carries a `producers` field, `consume`/`browse` only when it
//! carries `consumers`; absent fields leave existing grants alone.

mod render;
mod scan;

use acmq_schemas::{ChangeRequest, ResourceKind, SubscriptionSpec};
use tracing::{debug, info};

use crate::naming::{NamespaceGroups, ResourceVars};
use crate::ordered::OrderedSet;
use crate::outcome::{check_tokens, request_tokens, Artifact, ReconcileError, ReconcileWarning, Reconciled};
use crate::roles::RoleList;
use crate::text::{leading_ws, with_attr, SourceLines, TextPatch};

use render::{Indent, ResourceGrants};
pub use scan::{AddressEntry, MatchPattern, Permission, QueueRef, RoutingMode, SecurityScope, TopologyDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyOptions {
    /// Also grant a new subscriber `consume`/`browse` on the topic's resource scope.
    pub merge_subscriber_into_resource_scope: bool,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            merge_subscriber_into_resource_scope: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyReport {
    pub namespace_scope_created: bool,
    pub resource_scope_created: bool,
    /// Permission types whose role list was rewritten in an existing resource scope.
    pub permissions_patched: Vec<String>,
    /// Subscription variables (`audit_sub`) that got a new scope.
    pub subscription_scopes_created: Vec<String>,
    pub address_created: bool,
    /// Queue variables added to an existing address entry.
    pub queues_added: Vec<String>,
}

struct NewSubscription<'a> {
    spec: &'a SubscriptionSpec,
    /// `audit_sub`
    var: String,
}

/// Merge the request's security scopes and address entry into the template.
pub fn reconcile_topology(
    text: &str,
    req: &ChangeRequest,
    opts: &TopologyOptions,
) -> Result<Reconciled<TopologyReport>, ReconcileError> {
    check_tokens(Artifact::Topology, request_tokens(req))?;

    let src = SourceLines::new(text);
    let doc = TopologyDocument::scan(&src, text);
    let groups = NamespaceGroups::for_resource(&req.name);
    let vars = ResourceVars::for_resource(&req.name);
    let spaced = doc.layout.erb_spaced;
    let is_topic = req.resource_kind == ResourceKind::Topic;

    let producers: OrderedSet<String> = req.producers().iter().cloned().collect();
    let consumers: OrderedSet<String> = req.consumers().iter().cloned().collect();

    let mut subs: Vec<NewSubscription<'_>> = Vec::new();
    if is_topic {
        for spec in req.new_subscriptions() {
            let var = crate::naming::normalize(&spec.subscription_name);
            if !subs.iter().any(|s| s.var == var) {
                subs.push(NewSubscription { spec, var });
            }
        }
    }
    let merged_subscribers: OrderedSet<String> = if opts.merge_subscriber_into_resource_scope {
        subs.iter().map(|s| s.spec.subscriber.clone()).collect()
    } else {
        OrderedSet::new()
    };

    let layout = &doc.layout;
    let scope_ind = Indent::scope(
        layout.scope_indent.as_deref(),
        layout.settings_close_indent.as_deref(),
        layout.scope_unit.as_deref().or(layout.address_unit.as_deref()),
    );
    let address_ind = Indent::address(
        layout.address_indent.as_deref(),
        layout.addresses_close_indent.as_deref(),
        layout.address_unit.as_deref().or(layout.scope_unit.as_deref()),
    );

    let mut report = TopologyReport::default();
    let mut warnings = Vec::new();
    let mut patch = TextPatch::default();
    let mut settings_tail: Vec<String> = Vec::new();

    let address_ref = render::erb(&vars.address, spaced);
    let subscription_match =
        |var: &str| format!("{address_ref}::{}", render::erb(&format!("multicast_{var}"), spaced));

    // 1. namespace scope
    if doc.namespace_scope(&groups.prefix).is_none() {
        debug!(prefix = %groups.prefix, "creating namespace scope");
        settings_tail.extend(render::namespace_scope(&scope_ind, &groups));
        report.namespace_scope_created = true;
    }

    // 2 + 3. resource scope and subscription scopes
    match doc.resource_scope(&vars.var) {
        None => {
            debug!(resource = %vars.var, "creating resource scope");
            let mut read = RoleList::with_admin(&groups.admin, &consumers);
            read.merge(&merged_subscribers);
            let mut create = RoleList::with_admin(&groups.admin, &consumers);
            create.merge(&producers);
            let grants = ResourceGrants {
                send: RoleList::with_admin(&groups.admin, &producers),
                read,
                create,
                admin_only: RoleList::with_admin(&groups.admin, std::iter::empty::<&str>()),
            };
            let match_attr = format!("{address_ref}.#");
            settings_tail.extend(if is_topic {
                render::topic_scope(&scope_ind, &match_attr, &grants)
            } else {
                render::queue_scope(&scope_ind, &match_attr, &grants)
            });
            report.resource_scope_created = true;

            for sub in subs.iter().filter(|s| doc.subscription_scope(&vars.var, &s.var).is_none()) {
                settings_tail.extend(render::subscription_scope(
                    &scope_ind,
                    &subscription_match(&sub.var),
                    &groups.admin,
                    &sub.spec.subscriber,
                ));
                report.subscription_scopes_created.push(sub.var.clone());
            }
        }
        Some(scope) => {
            for perm in &scope.permissions {
                let mut roles = perm.roles.clone();
                match perm.kind.as_str() {
                    "send" => {
                        if req.producers.is_some() {
                            roles.ensure_pinned(&groups.admin);
                            roles.replace_rest(&producers);
                        }
                    }
                    "consume" | "browse" => {
                        if req.consumers.is_some() {
                            roles.ensure_pinned(&groups.admin);
                            roles.replace_rest(&consumers);
                        }
                        roles.merge(&merged_subscribers);
                    }
                    _ => continue,
                }
                if roles != perm.roles {
                    let line = src.get(perm.line);
                    if let Some(updated) = with_attr(line, "roles", &roles.render()) {
                        debug!(permission = %perm.kind, roles = %roles.render(), "patching resource scope");
                        patch.replace(perm.line, updated);
                        report.permissions_patched.push(perm.kind.clone());
                    }
                }
            }

            let mut blocks = Vec::new();
            for sub in subs.iter().filter(|s| doc.subscription_scope(&vars.var, &s.var).is_none()) {
                blocks.extend(render::subscription_scope(
                    &scope_ind,
                    &subscription_match(&sub.var),
                    &groups.admin,
                    &sub.spec.subscriber,
                ));
                report.subscription_scopes_created.push(sub.var.clone());
            }
            patch.insert_after(scope.close, blocks);
        }
    }

    if !settings_tail.is_empty() {
        match doc.settings_close {
            Some(close) => patch.insert_before(close, settings_tail),
            None => {
                warnings.push(ReconcileWarning::marker_not_found(Artifact::Topology, "</security-settings>"));
                patch.append(settings_tail);
            }
        }
    }

    // 4. address entry
    match doc.address(&vars.var) {
        None => {
            let (mode, queues) = if is_topic {
                let queues = subs
                    .iter()
                    .map(|s| render::erb(&format!("multicast_{}", s.var), spaced))
                    .collect::<Vec<_>>();
                (RoutingMode::Multicast, queues)
            } else {
                (RoutingMode::Anycast, vec![render::erb(&vars.anycast, spaced)])
            };
            let lines = render::address_entry(&address_ind, &address_ref, mode, &queues);
            match doc.addresses_close {
                Some(close) => patch.insert_before(close, lines),
                None => {
                    warnings.push(ReconcileWarning::marker_not_found(Artifact::Topology, "</addresses>"));
                    patch.append(lines);
                }
            }
            report.address_created = true;
        }
        Some(entry) if is_topic => {
            let missing: Vec<String> = subs
                .iter()
                .map(|s| format!("multicast_{}", s.var))
                .filter(|qvar| !entry.has_queue_var(qvar))
                .collect();
            if !missing.is_empty() {
                add_multicast_queues(&src, entry, &address_ind, spaced, &missing, &mut patch, &mut warnings);
                report.queues_added = missing;
            }
        }
        Some(_) => {}
    }

    let out = if patch.is_empty() { text.to_string() } else { patch.apply(&src) };
    let changed = out != text;
    if changed {
        info!(
            namespace_scope_created = report.namespace_scope_created,
            resource_scope_created = report.resource_scope_created,
            permissions_patched = report.permissions_patched.len(),
            subscription_scopes = report.subscription_scopes_created.len(),
            address_created = report.address_created,
            queues_added = report.queues_added.len(),
            "topology reconciled"
        );
    }
    Ok(Reconciled {
        text: out,
        changed,
        report,
        warnings,
    })
}

fn add_multicast_queues(
    src: &SourceLines<'_>,
    entry: &AddressEntry,
    address_ind: &Indent,
    spaced: bool,
    queue_vars: &[String],
    patch: &mut TextPatch,
    warnings: &mut Vec<ReconcileWarning>,
) {
    let queue_attrs: Vec<String> = queue_vars.iter().map(|v| render::erb(v, spaced)).collect();
    let entry_indent = leading_ws(src.get(entry.open)).to_string();
    let unit = address_ind.unit.clone();

    match (entry.mode, entry.routing_open, entry.routing_close) {
        (Some(RoutingMode::Multicast), Some(open), Some(close)) if open != close => {
            let queue_indent = entry
                .queues
                .first()
                .map(|q| leading_ws(src.get(q.line)).to_string())
                .unwrap_or_else(|| format!("{}{unit}", leading_ws(src.get(open))));
            patch.insert_before(
                close,
                queue_attrs.iter().map(|q| format!("{queue_indent}{}", render::queue_line(q))),
            );
        }
        (Some(RoutingMode::Multicast), Some(open), Some(_)) => {
            // `<multicast/>`: expand into an open/close pair.
            let routing_indent = leading_ws(src.get(open)).to_string();
            patch.replace(open, format!("{routing_indent}<multicast>"));
            let mut lines: Vec<String> = queue_attrs
                .iter()
                .map(|q| format!("{routing_indent}{unit}{}", render::queue_line(q)))
                .collect();
            lines.push(format!("{routing_indent}</multicast>"));
            patch.insert_after(open, lines);
        }
        _ if entry.open != entry.close => {
            let ind = Indent {
                base: entry_indent,
                unit,
            };
            let mut lines = vec![ind.at(1, "<multicast>")];
            lines.extend(queue_attrs.iter().map(|q| ind.at(2, &render::queue_line(q))));
            lines.push(ind.at(1, "</multicast>"));
            patch.insert_before(entry.close, lines);
        }
        _ => {
            warnings.push(ReconcileWarning::marker_not_found(Artifact::Topology, "</multicast>"));
        }
    }
}
