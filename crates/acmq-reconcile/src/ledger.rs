//! Role ledger reconciler.
//!
//! The ledger is a hieradata YAML file with two top-level keys this module owns:
//!
//! ```yaml
//! icc_artemis_broker::artemis_users_properties_users:
//!   - 'admin'
//!   - 'svcA'
//!
//! icc_artemis_broker::artemis_roles_properties_roles:
//!   - group: 'team-admin'
//!     users: 'admin'
//! ```
//!
//! Everything else in the file is passed through. New users and groups are appended
//! after the last entry of their section; an existing group is touched only when its
//! member list actually grows, and then only its `users:` line is rewritten.

use acmq_schemas::ChangeRequest;
use tracing::{debug, info};

use crate::naming::{NamespaceGroups, ADMIN_IDENTITY};
use crate::ordered::OrderedSet;
use crate::outcome::{check_tokens, request_tokens, Artifact, ReconcileError, ReconcileWarning, Reconciled};
use crate::roles::RoleList;
use crate::text::{leading_ws, unquote, SourceLines, TextPatch};

pub const DEFAULT_USERS_KEY: &str = "icc_artemis_broker::artemis_users_properties_users";
pub const DEFAULT_ROLES_KEY: &str = "icc_artemis_broker::artemis_roles_properties_roles";

const DEFAULT_ITEM_INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerKeys {
    pub users_key: String,
    pub roles_key: String,
}

impl Default for LedgerKeys {
    fn default() -> Self {
        Self {
            users_key: DEFAULT_USERS_KEY.to_string(),
            roles_key: DEFAULT_ROLES_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGroup {
    pub name: String,
    pub members: RoleList,
}

/// Users and groups as they appear in the ledger, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleLedger {
    pub users: OrderedSet<String>,
    pub groups: Vec<RoleGroup>,
}

impl RoleLedger {
    pub fn parse(text: &str, keys: &LedgerKeys) -> Self {
        let src = SourceLines::new(text);
        let scan = LedgerScan::new(&src, keys);
        RoleLedger {
            users: scan.users.as_ref().map(|u| u.users.clone()).unwrap_or_default(),
            groups: scan
                .roles
                .map(|r| r.entries.into_iter().map(|e| e.group).collect())
                .unwrap_or_default(),
        }
    }

    pub fn group(&self, name: &str) -> Option<&RoleGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.users.contains(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerReport {
    pub users_added: Vec<String>,
    pub groups_created: Vec<String>,
    pub groups_updated: Vec<String>,
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

struct UsersSection {
    /// Last line of the section (header when empty).
    last_line: usize,
    indent: String,
    quote: char,
    users: OrderedSet<String>,
}

struct GroupEntry {
    group: RoleGroup,
    group_line: usize,
    users_line: Option<usize>,
    quote: char,
}

struct RolesSection {
    last_line: usize,
    item_indent: String,
    field_indent: String,
    quote: char,
    entries: Vec<GroupEntry>,
}

struct LedgerScan {
    users: Option<UsersSection>,
    roles: Option<RolesSection>,
}

fn is_header(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .and_then(|rest| rest.strip_prefix(':'))
        .map(|rest| rest.trim().is_empty())
        .unwrap_or(false)
}

/// `  - 'value'` => (indent, value, quote)
fn list_item(line: &str) -> Option<(&str, &str, Option<char>)> {
    let rest = line.trim_start().strip_prefix('-')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let (value, quote) = unquote(rest);
    Some((leading_ws(line), value, quote))
}

/// `key: 'value'` => (value, quote)
fn field<'a>(line: &'a str, key: &str) -> Option<(&'a str, Option<char>)> {
    let rest = line.trim_start().strip_prefix(key)?.strip_prefix(':')?;
    Some(unquote(rest))
}

/// Blank and comment lines never end a section.
fn is_filler(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with('#')
}

/// The next top-level key. Unindented `- item` lines still belong to the list.
fn ends_section(line: &str) -> bool {
    !line.starts_with(char::is_whitespace) && list_item(line).is_none()
}

impl LedgerScan {
    fn new(src: &SourceLines<'_>, keys: &LedgerKeys) -> Self {
        let mut scan = LedgerScan { users: None, roles: None };
        for (idx, line) in src.iter() {
            if scan.users.is_none() && is_header(line, &keys.users_key) {
                scan.users = Some(Self::users_section(src, idx));
            } else if scan.roles.is_none() && is_header(line, &keys.roles_key) {
                scan.roles = Some(Self::roles_section(src, idx));
            }
        }
        scan
    }

    fn users_section(src: &SourceLines<'_>, header: usize) -> UsersSection {
        let mut section = UsersSection {
            last_line: header,
            indent: DEFAULT_ITEM_INDENT.to_string(),
            quote: '\'',
            users: OrderedSet::new(),
        };
        for idx in header + 1..src.len() {
            let line = src.get(idx);
            if is_filler(line) {
                continue;
            }
            if ends_section(line) {
                break;
            }
            let Some((indent, value, quote)) = list_item(line) else {
                continue;
            };
            if section.users.is_empty() {
                section.indent = indent.to_string();
                section.quote = quote.unwrap_or('\'');
            }
            section.users.insert(value.to_string());
            section.last_line = idx;
        }
        section
    }

    fn roles_section(src: &SourceLines<'_>, header: usize) -> RolesSection {
        let mut section = RolesSection {
            last_line: header,
            item_indent: DEFAULT_ITEM_INDENT.to_string(),
            field_indent: format!("{DEFAULT_ITEM_INDENT}  "),
            quote: '\'',
            entries: Vec::new(),
        };
        let mut current: Option<GroupEntry> = None;
        for idx in header + 1..src.len() {
            let line = src.get(idx);
            if is_filler(line) {
                continue;
            }
            if ends_section(line) {
                break;
            }
            if let Some((indent, item, _)) = list_item(line) {
                section.entries.extend(current.take());
                // A list item without `group:` belongs to no group we manage.
                let Some((name, quote)) = field(item, "group") else {
                    continue;
                };
                let entry = GroupEntry {
                    group: RoleGroup {
                        name: name.to_string(),
                        members: RoleList::default(),
                    },
                    group_line: idx,
                    users_line: None,
                    quote: quote.unwrap_or('\''),
                };
                if section.entries.is_empty() {
                    section.item_indent = indent.to_string();
                    section.field_indent = format!("{indent}  ");
                    section.quote = entry.quote;
                }
                section.last_line = idx;
                current = Some(entry);
                continue;
            }
            let Some(entry) = current.as_mut() else {
                continue;
            };
            section.last_line = idx;
            if entry.users_line.is_some() {
                continue;
            }
            if let Some((members, quote)) = field(line, "users") {
                if section.entries.is_empty() {
                    section.field_indent = leading_ws(line).to_string();
                }
                entry.group.members = RoleList::parse(members);
                entry.users_line = Some(idx);
                entry.quote = quote.unwrap_or(entry.quote);
            }
        }
        section.entries.extend(current);
        section
    }
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

struct GroupEdit {
    /// Index into the scanned entries, or `None` for a group created by this call.
    existing: Option<usize>,
    group: RoleGroup,
    dirty: bool,
}

fn upsert_group(edits: &mut Vec<GroupEdit>, name: &str, members: &OrderedSet<String>) {
    match edits.iter_mut().find(|e| e.group.name == name) {
        Some(edit) => {
            if edit.group.members.merge(members) {
                edit.dirty = true;
            }
        }
        None => {
            edits.push(GroupEdit {
                existing: None,
                group: RoleGroup {
                    name: name.to_string(),
                    members: RoleList::parse(&members.join(",")),
                },
                dirty: true,
            });
        }
    }
}

fn user_line(indent: &str, quote: char, user: &str) -> String {
    format!("{indent}- {quote}{user}{quote}")
}

fn group_lines(item_indent: &str, field_indent: &str, quote: char, group: &RoleGroup) -> [String; 2] {
    [
        format!("{item_indent}- group: {quote}{}{quote}", group.name),
        format!("{field_indent}users: {quote}{}{quote}", group.members.render()),
    ]
}

/// Merge the request's producers, consumers and new subscribers into the ledger.
pub fn reconcile_ledger(
    text: &str,
    req: &ChangeRequest,
    keys: &LedgerKeys,
) -> Result<Reconciled<LedgerReport>, ReconcileError> {
    check_tokens(Artifact::Ledger, request_tokens(req))?;

    let src = SourceLines::new(text);
    let scan = LedgerScan::new(&src, keys);
    let groups = NamespaceGroups::for_resource(&req.name);

    let producers: OrderedSet<String> = req.producers().iter().cloned().collect();
    let consumers: OrderedSet<String> = req.consumers().iter().cloned().collect();
    let subscribers: OrderedSet<String> = req.new_subscriptions().map(|s| s.subscriber.clone()).collect();

    let mut actors = producers.clone();
    actors.extend_from(consumers.iter().cloned());
    actors.extend_from(subscribers.iter().cloned());

    let mut users = scan.users.as_ref().map(|u| u.users.clone()).unwrap_or_default();
    let mut edits: Vec<GroupEdit> = scan
        .roles
        .iter()
        .flat_map(|r| r.entries.iter().enumerate())
        .map(|(i, e)| GroupEdit {
            existing: Some(i),
            group: e.group.clone(),
            dirty: false,
        })
        .collect();

    let mut report = LedgerReport::default();
    for actor in &actors {
        if !users.insert(actor.clone()) {
            continue;
        }
        debug!(user = %actor, "adding user to ledger");
        report.users_added.push(actor.clone());
        if !edits.iter().any(|e| e.group.name == *actor) {
            upsert_group(&mut edits, actor, &std::iter::once(actor.clone()).collect());
        }
    }

    upsert_group(&mut edits, &groups.admin, &std::iter::once(ADMIN_IDENTITY.to_string()).collect());

    let mut readers = consumers.clone();
    readers.extend_from(subscribers.iter().cloned());
    if !readers.is_empty() {
        upsert_group(&mut edits, &groups.read, &readers);
    }
    if !producers.is_empty() {
        upsert_group(&mut edits, &groups.write, &producers);
    }

    // Serialize.
    let mut patch = TextPatch::default();
    let mut warnings = Vec::new();
    let nl_section = |title: &str, key: &str| vec![String::new(), format!("# {title}"), format!("{key}:")];

    let new_users = &report.users_added;
    match &scan.users {
        Some(section) => {
            patch.insert_after(
                section.last_line,
                new_users.iter().map(|u| user_line(&section.indent, section.quote, u)),
            );
        }
        None => {
            warnings.push(ReconcileWarning::marker_not_found(Artifact::Ledger, keys.users_key.as_str()));
            let mut lines = nl_section("artemis-broker users", &keys.users_key);
            lines.extend(users.iter().map(|u| user_line(DEFAULT_ITEM_INDENT, '\'', u)));
            patch.append(lines);
        }
    }

    match &scan.roles {
        Some(section) => {
            let mut tail = Vec::new();
            for edit in edits.iter().filter(|e| e.dirty) {
                match edit.existing {
                    Some(i) => {
                        let entry = &section.entries[i];
                        let q = entry.quote;
                        let members = edit.group.members.render();
                        match entry.users_line {
                            Some(line) => {
                                let indent = leading_ws(src.get(line));
                                patch.replace(line, format!("{indent}users: {q}{members}{q}"));
                            }
                            None => patch.insert_after(
                                entry.group_line,
                                [format!("{}users: {q}{members}{q}", section.field_indent)],
                            ),
                        }
                        report.groups_updated.push(edit.group.name.clone());
                    }
                    None => {
                        tail.extend(group_lines(&section.item_indent, &section.field_indent, section.quote, &edit.group));
                        report.groups_created.push(edit.group.name.clone());
                    }
                }
            }
            patch.insert_after(section.last_line, tail);
        }
        None => {
            warnings.push(ReconcileWarning::marker_not_found(Artifact::Ledger, keys.roles_key.as_str()));
            let mut lines = nl_section("artemis-broker roles", &keys.roles_key);
            let field_indent = format!("{DEFAULT_ITEM_INDENT}  ");
            for edit in &edits {
                lines.extend(group_lines(DEFAULT_ITEM_INDENT, &field_indent, '\'', &edit.group));
                report.groups_created.push(edit.group.name.clone());
            }
            patch.append(lines);
        }
    }

    let out = if patch.is_empty() { text.to_string() } else { patch.apply(&src) };
    let changed = out != text;
    if changed {
        info!(
            users_added = report.users_added.len(),
            groups_created = report.groups_created.len(),
            groups_updated = report.groups_updated.len(),
            "ledger reconciled"
        );
    }
    Ok(Reconciled {
        text: out,
        changed,
        report,
        warnings,
    })
}
