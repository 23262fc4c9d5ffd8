//! Generated XML blocks, indented to match the surrounding template.

use super::scan::RoutingMode;
use crate::naming::NamespaceGroups;
use crate::roles::RoleList;

const DEFAULT_SCOPE_INDENT: usize = 8;
const DEFAULT_ADDRESS_INDENT: usize = 12;
const DEFAULT_UNIT: &str = "  ";

const IMPORT_NOTE: &str = "<!-- we need this otherwise ./artemis data imp wouldn't work -->";

#[derive(Debug, Clone)]
pub(crate) struct Indent {
    pub(crate) base: String,
    pub(crate) unit: String,
}

impl Indent {
    /// Sibling indentation if known, else one unit inside the closing tag, else `fallback` spaces.
    pub(crate) fn resolve(
        sibling: Option<&str>,
        closing: Option<&str>,
        unit: Option<&str>,
        fallback: usize,
    ) -> Self {
        let unit = unit.unwrap_or(DEFAULT_UNIT).to_string();
        let base = match (sibling, closing) {
            (Some(s), _) => s.to_string(),
            (None, Some(c)) => format!("{c}{unit}"),
            (None, None) => " ".repeat(fallback),
        };
        Indent { base, unit }
    }

    pub(crate) fn scope(sibling: Option<&str>, closing: Option<&str>, unit: Option<&str>) -> Self {
        Self::resolve(sibling, closing, unit, DEFAULT_SCOPE_INDENT)
    }

    pub(crate) fn address(sibling: Option<&str>, closing: Option<&str>, unit: Option<&str>) -> Self {
        Self::resolve(sibling, closing, unit, DEFAULT_ADDRESS_INDENT)
    }

    pub(crate) fn at(&self, depth: usize, content: &str) -> String {
        format!("{}{}{}", self.base, self.unit.repeat(depth), content)
    }
}

pub(crate) fn erb(var: &str, spaced: bool) -> String {
    if spaced {
        format!("<%= @{var} %>")
    } else {
        format!("<%= @{var}%>")
    }
}

pub(crate) fn permission(kind: &str, roles: &RoleList) -> String {
    format!("<permission type=\"{kind}\" roles=\"{}\"/>", roles.render())
}

fn scope_block(ind: &Indent, match_attr: &str, body: Vec<String>) -> Vec<String> {
    let mut lines = Vec::with_capacity(body.len() + 2);
    lines.push(ind.at(0, &format!("<security-setting match=\"{match_attr}\">")));
    lines.extend(body.iter().map(|b| ind.at(1, b)));
    lines.push(ind.at(0, "</security-setting>"));
    lines
}

/// Namespace-wide scope: create/delete for admin, read/write split for the rest.
pub(crate) fn namespace_scope(ind: &Indent, groups: &NamespaceGroups) -> Vec<String> {
    let admin = || RoleList::with_admin(&groups.admin, std::iter::empty::<&str>());
    let all = RoleList::with_admin(&groups.admin, [&groups.write, &groups.read]);
    let read = RoleList::with_admin(&groups.admin, [&groups.read]);
    let write = RoleList::with_admin(&groups.admin, [&groups.write]);

    let body = vec![
        permission("createNonDurableQueue", &all),
        permission("deleteNonDurableQueue", &admin()),
        permission("createDurableQueue", &all),
        permission("deleteDurableQueue", &admin()),
        permission("createAddress", &all),
        permission("deleteAddress", &admin()),
        permission("consume", &read),
        permission("browse", &read),
        permission("send", &write),
        IMPORT_NOTE.to_string(),
        permission("manage", &admin()),
    ];
    scope_block(ind, &format!("{}.#", groups.prefix), body)
}

/// Role lists of a freshly created resource scope, in render order.
pub(crate) struct ResourceGrants {
    pub(crate) send: RoleList,
    pub(crate) read: RoleList,
    /// Topic-only create permissions: admin + consumers + producers.
    pub(crate) create: RoleList,
    pub(crate) admin_only: RoleList,
}

pub(crate) fn queue_scope(ind: &Indent, match_attr: &str, g: &ResourceGrants) -> Vec<String> {
    let body = vec![
        permission("send", &g.send),
        permission("consume", &g.read),
        permission("browse", &g.read),
    ];
    scope_block(ind, match_attr, body)
}

pub(crate) fn topic_scope(ind: &Indent, match_attr: &str, g: &ResourceGrants) -> Vec<String> {
    let body = vec![
        permission("send", &g.send),
        permission("consume", &g.read),
        permission("browse", &g.read),
        permission("createNonDurableQueue", &g.create),
        permission("deleteNonDurableQueue", &g.admin_only),
        permission("createDurableQueue", &g.create),
        permission("deleteDurableQueue", &g.admin_only),
        permission("createAddress", &g.create),
        permission("deleteAddress", &g.admin_only),
    ];
    scope_block(ind, match_attr, body)
}

pub(crate) fn subscription_scope(ind: &Indent, match_attr: &str, admin: &str, subscriber: &str) -> Vec<String> {
    let roles = RoleList::with_admin(admin, [subscriber]);
    scope_block(
        ind,
        match_attr,
        vec![permission("consume", &roles), permission("browse", &roles)],
    )
}

pub(crate) fn queue_line(name_attr: &str) -> String {
    format!("<queue name=\"{name_attr}\"/>")
}

pub(crate) fn address_entry(ind: &Indent, name_attr: &str, mode: RoutingMode, queues: &[String]) -> Vec<String> {
    let tag = mode.tag();
    let mut lines = vec![
        ind.at(0, &format!("<address name=\"{name_attr}\">")),
        ind.at(1, &format!("<{tag}>")),
    ];
    lines.extend(queues.iter().map(|q| ind.at(2, &queue_line(q))));
    lines.push(ind.at(1, &format!("</{tag}>")));
    lines.push(ind.at(0, "</address>"));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_prefers_sibling_then_closing_tag() {
        assert_eq!(Indent::scope(Some("    "), Some("  "), None).base, "    ");
        assert_eq!(Indent::scope(None, Some("      "), Some("   ")).base, "         ");
        assert_eq!(Indent::scope(None, None, None).base.len(), 8);
        assert_eq!(Indent::address(None, None, None).base.len(), 12);
    }

    #[test]
    fn namespace_scope_grants_full_permission_set() {
        let ind = Indent::scope(Some("        "), None, Some("  "));
        let lines = namespace_scope(&ind, &NamespaceGroups::for_resource("team.queue.orders"));
        assert_eq!(lines[0], "        <security-setting match=\"team.#\">");
        assert!(lines.contains(&"          <permission type=\"send\" roles=\"team-admin,team-write\"/>".to_string()));
        assert!(lines.contains(
            &"          <permission type=\"createAddress\" roles=\"team-admin,team-write,team-read\"/>".to_string()
        ));
        assert!(lines.contains(&"          <permission type=\"manage\" roles=\"team-admin\"/>".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("        </security-setting>"));
    }
}
