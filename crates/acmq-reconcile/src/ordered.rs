use std::borrow::Borrow;
use std::collections::HashSet;
use std::hash::Hash;

/// Insertion-ordered set: a sequence plus a membership index.
#[derive(Debug, Clone)]
pub struct OrderedSet<T> {
    items: Vec<T>,
    index: HashSet<T>,
}

impl<T> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` unless already present. Returns true if it was added.
    pub fn insert(&mut self, item: T) -> bool {
        if self.index.contains(&item) {
            return false;
        }
        self.index.insert(item.clone());
        self.items.push(item);
        true
    }

    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains(item)
    }

    pub fn remove<Q>(&mut self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.index.remove(item) {
            return false;
        }
        self.items.retain(|x| x.borrow() != item);
        true
    }

    /// Append every item not yet present, in iteration order. Returns the number added.
    pub fn extend_from<I: IntoIterator<Item = T>>(&mut self, items: I) -> usize {
        items.into_iter().filter(|x| self.insert(x.clone())).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl OrderedSet<String> {
    /// Parse a comma-joined list, trimming entries and dropping blanks and repeats.
    pub fn from_comma_list(raw: &str) -> Self {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn join(&self, sep: &str) -> String {
        self.items.join(sep)
    }
}

impl<T: Eq + Hash + Clone> PartialEq for OrderedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Eq + Hash + Clone> Eq for OrderedSet<T> {}

impl<T: Eq + Hash + Clone> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend_from(iter);
        set
    }
}

impl<'a, T> IntoIterator for &'a OrderedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_seen_order() {
        let set: OrderedSet<&str> = ["b", "a", "b", "c", "a"].into_iter().collect();
        assert_eq!(set.as_slice(), &["b", "a", "c"]);
    }

    #[test]
    fn comma_list_trims_and_dedupes() {
        let set = OrderedSet::from_comma_list(" x, y ,,x,z ");
        assert_eq!(set.join(","), "x,y,z");
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut set = OrderedSet::from_comma_list("a,b,c");
        assert!(set.remove("b"));
        assert!(!set.remove("b"));
        assert_eq!(set.join(","), "a,c");
        assert!(set.insert("b".to_string()));
        assert_eq!(set.join(","), "a,c,b");
    }
}
