use std::collections::btree_map;
use std::collections::BTreeMap;

use tracing::warn;

/// One node of a persisted tree.
///
/// Holds text scalars, named child nodes and an unkeyed array of nodes.
/// Children and array elements are owned exclusively, so the structure is
/// always a strict tree: a node cannot be attached beneath itself.
///
/// Scalar and child maps are ordered by key, which makes encoding
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Storage {
    /// Free-form text saved ahead of the records. Only meaningful on a root.
    pub header: String,
    /// Unkeyed ordered elements.
    pub array: Vec<Storage>,
    scalars: BTreeMap<String, String>,
    children: BTreeMap<String, Storage>,
    dirty: bool,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty root carrying the given header.
    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    /// True when there are no scalars, children or array elements.
    pub fn is_empty(&self) -> bool {
        self.scalars.is_empty() && self.children.is_empty() && self.array.is_empty()
    }

    /// Drop all scalars, children and array elements.
    ///
    /// The header and the dirty flag are left alone.
    pub fn clear(&mut self) {
        self.array.clear();
        self.children.clear();
        self.scalars.clear();
    }

    /// Caller-maintained "needs saving" marker. The engine never reads it.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    // ---- Children ----

    pub fn child(&self, key: &str) -> Option<&Storage> {
        self.children.get(key)
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut Storage> {
        self.children.get_mut(key)
    }

    /// Get the named child, creating an empty one if absent.
    pub fn child_or_insert(&mut self, key: &str) -> &mut Storage {
        self.children.entry(key.to_owned()).or_default()
    }

    /// Attach `node` under `key`.
    ///
    /// A previous occupant of `key` is dropped immediately. Returns `true`
    /// when that happened.
    pub fn set_child(&mut self, key: impl Into<String>, node: Storage) -> bool {
        let key = key.into();
        match self.children.insert(key, node) {
            Some(previous) => {
                warn!(
                    replaced_empty = previous.is_empty(),
                    "overwriting storage object"
                );
                drop(previous);
                true
            }
            None => false,
        }
    }

    /// Detach a child, handing ownership back to the caller.
    pub fn remove_child(&mut self, key: &str) -> Option<Storage> {
        self.children.remove(key)
    }

    pub fn has_child(&self, key: &str) -> bool {
        self.children.contains_key(key)
    }

    /// Children in key order.
    pub fn children(&self) -> btree_map::Iter<'_, String, Storage> {
        self.children.iter()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    // ---- Array ----

    /// Append an element to the array.
    pub fn push(&mut self, node: Storage) {
        self.array.push(node);
    }

    /// Append an empty element and return it for filling in.
    pub fn push_new(&mut self) -> &mut Storage {
        self.array.push(Storage::new());
        let last = self.array.len() - 1;
        &mut self.array[last]
    }

    // ---- Scalars ----

    /// Scalars in key order.
    pub fn scalars(&self) -> btree_map::Iter<'_, String, String> {
        self.scalars.iter()
    }

    pub fn scalar_count(&self) -> usize {
        self.scalars.len()
    }

    pub(crate) fn scalar(&self, key: &str) -> Option<&String> {
        self.scalars.get(key)
    }

    pub(crate) fn insert_scalar(&mut self, key: String, value: String) {
        self.scalars.insert(key, value);
    }

    pub(crate) fn remove_scalar(&mut self, key: &str) -> bool {
        self.scalars.remove(key).is_some()
    }

    /// Fold decoded content into this node.
    ///
    /// Scalars and children from `other` win on key collisions; array
    /// elements are appended; the header is taken from `other`.
    pub(crate) fn merge_from(&mut self, other: Storage) {
        let Storage {
            header,
            array,
            scalars,
            children,
            dirty: _,
        } = other;
        self.header = header;
        self.scalars.extend(scalars);
        self.children.extend(children);
        self.array.extend(array);
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(Storage::node_count).sum::<usize>()
            + self.array.iter().map(Storage::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_node_is_empty() {
        let s = Storage::new();
        assert!(s.is_empty());
        assert!(!s.is_dirty());
        assert!(s.header.is_empty());
    }

    #[test]
    fn scalar_makes_non_empty() {
        let mut s = Storage::new();
        s.set_string("k", "v");
        assert!(!s.is_empty());
    }

    #[test]
    fn child_makes_non_empty() {
        let mut s = Storage::new();
        s.set_child("c", Storage::new());
        assert!(!s.is_empty());
    }

    #[test]
    fn array_makes_non_empty() {
        let mut s = Storage::new();
        s.push(Storage::new());
        assert!(!s.is_empty());
    }

    #[test]
    fn child_or_insert_creates_once() {
        let mut s = Storage::new();
        s.child_or_insert("settings").set_int("volume", 7);
        s.child_or_insert("settings").set_int("brightness", 3);
        assert_eq!(s.child_count(), 1);
        let settings = s.child("settings").unwrap();
        assert_eq!(settings.get_int("volume", 0), 7);
        assert_eq!(settings.get_int("brightness", 0), 3);
    }

    #[test]
    fn missing_child_is_none() {
        let s = Storage::new();
        assert!(s.child("nope").is_none());
        assert!(!s.has_child("nope"));
    }

    #[test]
    fn overwrite_drops_previous_child() {
        let mut s = Storage::new();
        let mut first = Storage::new();
        first.set_string("gen", "1");
        let mut second = Storage::new();
        second.set_string("gen", "2");

        assert!(!s.set_child("slot", first));
        assert!(s.set_child("slot", second));
        assert_eq!(s.child_count(), 1);
        assert_eq!(s.child("slot").unwrap().get_string("gen", ""), "2");
        assert_eq!(s.node_count(), 2);
    }

    #[test]
    fn scalar_and_child_keys_coexist() {
        let mut s = Storage::new();
        s.set_string("player", "alice");
        s.child_or_insert("player").set_int("level", 4);
        assert_eq!(s.get_string("player", ""), "alice");
        assert_eq!(s.child("player").unwrap().get_int("level", 0), 4);
    }

    #[test]
    fn remove_child_detaches() {
        let mut s = Storage::new();
        s.child_or_insert("a").set_bool("on", true);
        let detached = s.remove_child("a").unwrap();
        assert!(detached.get_bool("on", false));
        assert!(s.is_empty());
        assert!(s.remove_child("a").is_none());
    }

    #[test]
    fn clear_keeps_header_and_dirty() {
        let mut s = Storage::with_header("v2");
        s.set_dirty(true);
        s.set_string("a", "b");
        s.push_new().set_int("i", 1);
        s.child_or_insert("c");
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.header, "v2");
        assert!(s.is_dirty());
    }

    #[test]
    fn iteration_is_key_ordered() {
        let mut s = Storage::new();
        s.set_string("zeta", "3");
        s.set_string("alpha", "1");
        s.set_string("mid", "2");
        let keys: Vec<&str> = s.scalars().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn merge_overwrites_and_appends() {
        let mut target = Storage::with_header("old");
        target.set_string("keep", "1");
        target.set_string("shared", "old");
        target.child_or_insert("c").set_string("x", "old");
        target.push_new().set_string("id", "0");

        let mut incoming = Storage::with_header("new");
        incoming.set_string("shared", "new");
        incoming.child_or_insert("c").set_string("y", "new");
        incoming.push_new().set_string("id", "1");

        target.merge_from(incoming);
        assert_eq!(target.header, "new");
        assert_eq!(target.get_string("keep", ""), "1");
        assert_eq!(target.get_string("shared", ""), "new");
        let c = target.child("c").unwrap();
        assert!(!c.has_key("x"));
        assert_eq!(c.get_string("y", ""), "new");
        assert_eq!(target.array.len(), 2);
    }
}
