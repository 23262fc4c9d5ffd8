use crate::ordered::OrderedSet;

const ADMIN_SUFFIX: &str = "-admin";

/// Comma-joined role list with the namespace admin role pinned to the front.
///
/// The pinned role is the first entry ending in `-admin`. Every rewrite renders it
/// first, followed by the remaining roles in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleList {
    pinned: Option<String>,
    rest: OrderedSet<String>,
}

impl RoleList {
    pub fn parse(raw: &str) -> Self {
        let mut list = RoleList::default();
        for role in OrderedSet::from_comma_list(raw).into_vec() {
            if list.pinned.is_none() && role.ends_with(ADMIN_SUFFIX) {
                list.pinned = Some(role);
            } else {
                list.rest.insert(role);
            }
        }
        list
    }

    /// `admin` first, then `members`.
    pub fn with_admin<I, S>(admin: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = RoleList {
            pinned: Some(admin.to_string()),
            rest: OrderedSet::new(),
        };
        list.merge(members);
        list
    }

    pub fn pinned(&self) -> Option<&str> {
        self.pinned.as_deref()
    }

    pub fn rest(&self) -> &OrderedSet<String> {
        &self.rest
    }

    /// All roles in render order.
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.pinned.as_deref().into_iter().chain(self.rest.iter().map(String::as_str))
    }

    pub fn contains(&self, role: &str) -> bool {
        self.pinned.as_deref() == Some(role) || self.rest.contains(role)
    }

    /// Pin `admin` if no admin role is present yet.
    pub fn ensure_pinned(&mut self, admin: &str) {
        if self.pinned.is_none() {
            self.rest.remove(admin);
            self.pinned = Some(admin.to_string());
        }
    }

    /// Keep the pinned role and supersede everything else with `members`.
    pub fn replace_rest<I, S>(&mut self, members: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rest = OrderedSet::new();
        self.merge(members);
    }

    /// Union `members` into the list. Returns true if anything was added.
    pub fn merge<I, S>(&mut self, members: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = false;
        for m in members {
            let m = m.as_ref().trim();
            if m.is_empty() || self.pinned.as_deref() == Some(m) {
                continue;
            }
            added |= self.rest.insert(m.to_string());
        }
        added
    }

    pub fn render(&self) -> String {
        self.roles().collect::<Vec<_>>().join(",")
    }
}
