//! Unguarded ordered hash map.
//!
//! This module provides [`LinkedHashMap`], a hash table whose entries are
//! threaded onto a doubly-linked list. Both structures live in one value and
//! are updated together, so the table and the order always agree. The list
//! links are [`Ptr`] handles into a slot arena rather than references.
//!
//! Nothing here locks. [`OMap`](crate::OMap) wraps this type in a read-write
//! lock and calls these methods while holding it.
//!
//! # Examples
//!
//! ```
//! use omap::linked_hash_map::LinkedHashMap;
//!
//! let mut map: LinkedHashMap<_, _> = LinkedHashMap::default();
//! map.insert_tail("first", 1);
//! map.insert_tail("second", 2);
//!
//! // Iteration preserves insertion order
//! let entries: Vec<_> = map.iter().collect();
//! assert_eq!(entries, [(&"first", &1), (&"second", &2)]);
//! ```

mod iter;

use core::borrow::Borrow;
use core::hash::BuildHasher;
use core::hash::Hash;

use hashbrown::HashTable;
use hashbrown::hash_table;

use crate::Ptr;
use crate::RandomState;
use crate::arena::Arena;
use crate::arena::Node;

pub use iter::IntoIter;
pub use iter::Iter;

/// A hash map that maintains the relative order of its keys.
///
/// Membership, insertion at either end, removal, and relocation of an
/// existing key are all O(1). Insertion is first-write-wins: pushing a key
/// that is already present leaves the stored value and its position alone.
///
/// The generic parameters are:
/// - `K`: Key type, must implement `Hash + Eq` for keyed operations
/// - `V`: Value type, unconstrained
/// - `S`: Hash builder type, defaults to `hashbrown`'s default hasher
///
/// # Examples
///
/// ```
/// use omap::LinkedHashMap;
///
/// let mut map = LinkedHashMap::new();
/// map.insert_tail("apple", 5);
/// map.insert_tail("banana", 3);
/// map.insert_head("cherry", 8);
///
/// let keys: Vec<_> = map.keys().copied().collect();
/// assert_eq!(keys, ["cherry", "apple", "banana"]);
/// ```
#[derive(Clone)]
pub struct LinkedHashMap<K, V, S = RandomState> {
    head: Option<Ptr>,
    tail: Option<Ptr>,
    nodes: Arena<K, V>,
    table: HashTable<Ptr>,
    hasher: S,
}

impl<K: core::fmt::Debug, V: core::fmt::Debug, S> core::fmt::Debug for LinkedHashMap<K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S: Default> Default for LinkedHashMap<K, V, S> {
    fn default() -> Self {
        LinkedHashMap::with_capacity_and_hasher(0, S::default())
    }
}

impl<K, V> LinkedHashMap<K, V> {
    /// Creates a new, empty map. It will not allocate until the first
    /// insertion.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a map able to hold at least `capacity` entries without
    /// reallocating.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::LinkedHashMap;
    ///
    /// let map: LinkedHashMap<&str, i32> = LinkedHashMap::with_capacity(10);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::default())
    }
}

impl<K, V, S> LinkedHashMap<K, V, S> {
    /// Creates an empty map which will use the given hash builder.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    /// Creates a map with the specified capacity and hash builder.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hashbrown::DefaultHashBuilder as RandomState;
    /// use omap::linked_hash_map::LinkedHashMap;
    ///
    /// let hasher = RandomState::default();
    /// let mut map: LinkedHashMap<&str, i32, _> = LinkedHashMap::with_capacity_and_hasher(10, hasher);
    /// map.insert_tail("key", 42);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        LinkedHashMap {
            head: None,
            tail: None,
            nodes: Arena::with_capacity(capacity),
            table: HashTable::with_capacity(capacity),
            hasher,
        }
    }

    /// Returns a reference to the map's hash builder.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry, keeping the allocated memory for reuse.
    pub fn clear(&mut self) {
        self.table.clear();
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Returns the handle of the first entry.
    pub fn head_ptr(&self) -> Option<Ptr> {
        self.head
    }

    /// Returns the handle of the last entry.
    pub fn tail_ptr(&self) -> Option<Ptr> {
        self.tail
    }

    /// Returns the handle following `ptr`, or `None` if `ptr` is the tail or
    /// not a live entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::LinkedHashMap;
    ///
    /// let mut map = LinkedHashMap::new();
    /// let a = map.insert_tail("a", 1).unwrap();
    /// let b = map.insert_tail("b", 2).unwrap();
    ///
    /// assert_eq!(map.next_ptr(a), Some(b));
    /// assert_eq!(map.next_ptr(b), None);
    /// ```
    pub fn next_ptr(&self, ptr: Ptr) -> Option<Ptr> {
        self.nodes.get(ptr)?.next
    }

    /// Returns the handle preceding `ptr`, or `None` if `ptr` is the head or
    /// not a live entry.
    pub fn prev_ptr(&self, ptr: Ptr) -> Option<Ptr> {
        self.nodes.get(ptr)?.prev
    }

    /// Returns `true` if `ptr` refers to a live entry.
    pub fn contains_ptr(&self, ptr: Ptr) -> bool {
        self.nodes.is_occupied(ptr)
    }

    /// Returns the value stored at `ptr`.
    pub fn ptr_get(&self, ptr: Ptr) -> Option<&V> {
        self.nodes.get(ptr).map(|node| &node.value)
    }

    /// Returns the key stored at `ptr`.
    pub fn ptr_get_key(&self, ptr: Ptr) -> Option<&K> {
        self.nodes.get(ptr).map(|node| &node.key)
    }

    /// Returns the key-value pair stored at `ptr`.
    pub fn ptr_get_entry(&self, ptr: Ptr) -> Option<(&K, &V)> {
        self.nodes.get(ptr).map(|node| (&node.key, &node.value))
    }

    /// Returns an iterator over the entries in order, head to tail.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            front: self.head,
            back: self.tail,
            remaining: self.len(),
            nodes: &self.nodes,
        }
    }

    /// Returns an iterator over the keys in order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.iter().map(|(_, value)| value)
    }

    /// Moves the entry at `moved` to sit immediately after `after`.
    ///
    /// Returns `None` if either handle is not a live entry. Moving an entry
    /// after itself, or after the entry it already follows, changes nothing
    /// and returns `Some(())`.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::LinkedHashMap;
    ///
    /// let mut map = LinkedHashMap::new();
    /// let a = map.insert_tail("a", 1).unwrap();
    /// map.insert_tail("b", 2);
    /// let c = map.insert_tail("c", 3).unwrap();
    ///
    /// map.move_after(c, a);
    ///
    /// let keys: Vec<_> = map.keys().copied().collect();
    /// assert_eq!(keys, ["a", "c", "b"]);
    /// ```
    pub fn move_after(&mut self, moved: Ptr, after: Ptr) -> Option<()> {
        if !self.contains_ptr(moved) || !self.contains_ptr(after) {
            return None;
        }
        if moved == after || self.nodes[after].next == Some(moved) {
            return Some(());
        }

        self.unlink(moved);
        self.link_after(moved, after);
        Some(())
    }

    /// Moves the entry at `moved` to sit immediately before `before`.
    ///
    /// Returns `None` if either handle is not a live entry. Moving an entry
    /// before itself, or before the entry it already precedes, changes nothing
    /// and returns `Some(())`.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::LinkedHashMap;
    ///
    /// let mut map = LinkedHashMap::new();
    /// let a = map.insert_tail("a", 1).unwrap();
    /// map.insert_tail("b", 2);
    /// let c = map.insert_tail("c", 3).unwrap();
    ///
    /// map.move_before(a, c);
    ///
    /// let keys: Vec<_> = map.keys().copied().collect();
    /// assert_eq!(keys, ["b", "a", "c"]);
    /// ```
    pub fn move_before(&mut self, moved: Ptr, before: Ptr) -> Option<()> {
        if !self.contains_ptr(moved) || !self.contains_ptr(before) {
            return None;
        }
        if moved == before || self.nodes[before].prev == Some(moved) {
            return Some(());
        }

        self.unlink(moved);
        self.link_before(moved, before);
        Some(())
    }

    /// Moves the entry at `moved` to the head of the list.
    ///
    /// Returns `None` if `moved` is not a live entry.
    pub fn move_to_head(&mut self, moved: Ptr) -> Option<()> {
        if !self.contains_ptr(moved) {
            return None;
        }
        if self.head != Some(moved) {
            self.unlink(moved);
            self.link_as_head(moved);
        }
        Some(())
    }

    /// Moves the entry at `moved` to the tail of the list.
    ///
    /// Returns `None` if `moved` is not a live entry.
    pub fn move_to_tail(&mut self, moved: Ptr) -> Option<()> {
        if !self.contains_ptr(moved) {
            return None;
        }
        if self.tail != Some(moved) {
            self.unlink(moved);
            self.link_as_tail(moved);
        }
        Some(())
    }

    /// Detaches `ptr` from its neighbours, patching head/tail. The slot stays
    /// occupied and in the table.
    fn unlink(&mut self, ptr: Ptr) {
        let node = &mut self.nodes[ptr];
        let prev = node.prev.take();
        let next = node.next.take();

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
    }

    fn link_after(&mut self, ptr: Ptr, after: Ptr) {
        let next = self.nodes[after].next;
        {
            let node = &mut self.nodes[ptr];
            node.prev = Some(after);
            node.next = next;
        }
        self.nodes[after].next = Some(ptr);

        match next {
            Some(next) => self.nodes[next].prev = Some(ptr),
            None => self.tail = Some(ptr),
        }
    }

    fn link_before(&mut self, ptr: Ptr, before: Ptr) {
        let prev = self.nodes[before].prev;
        {
            let node = &mut self.nodes[ptr];
            node.prev = prev;
            node.next = Some(before);
        }
        self.nodes[before].prev = Some(ptr);

        match prev {
            Some(prev) => self.nodes[prev].next = Some(ptr),
            None => self.head = Some(ptr),
        }
    }

    fn link_as_head(&mut self, ptr: Ptr) {
        match self.head {
            Some(head) => self.link_before(ptr, head),
            None => {
                self.head = Some(ptr);
                self.tail = Some(ptr);
            }
        }
    }

    fn link_as_tail(&mut self, ptr: Ptr) {
        match self.tail {
            Some(tail) => self.link_after(ptr, tail),
            None => {
                self.head = Some(ptr);
                self.tail = Some(ptr);
            }
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> LinkedHashMap<K, V, S> {
    /// Shrinks the capacity of the map as much as possible.
    pub fn shrink_to_fit(&mut self) {
        let nodes = &self.nodes;
        self.table.shrink_to_fit(|&ptr| nodes[ptr].hash);
        self.nodes.shrink_to_fit();
    }

    /// Appends an entry at the tail, returning its handle.
    ///
    /// If `key` is already present nothing changes and `None` is returned:
    /// the existing value and position win.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::LinkedHashMap;
    ///
    /// let mut map = LinkedHashMap::new();
    /// assert!(map.insert_tail("first", 1).is_some());
    /// assert!(map.insert_tail("second", 2).is_some());
    /// assert!(map.insert_tail("first", 3).is_none());
    ///
    /// let entries: Vec<_> = map.iter().collect();
    /// assert_eq!(entries, [(&"first", &1), (&"second", &2)]);
    /// ```
    pub fn insert_tail(&mut self, key: K, value: V) -> Option<Ptr> {
        let ptr = self.insert_unlinked(key, value)?;
        self.link_as_tail(ptr);
        Some(ptr)
    }

    /// Prepends an entry at the head, returning its handle.
    ///
    /// If `key` is already present nothing changes and `None` is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::LinkedHashMap;
    ///
    /// let mut map = LinkedHashMap::new();
    /// map.insert_head("first", 1);
    /// map.insert_head("second", 2);
    ///
    /// let keys: Vec<_> = map.keys().copied().collect();
    /// assert_eq!(keys, ["second", "first"]);
    /// ```
    pub fn insert_head(&mut self, key: K, value: V) -> Option<Ptr> {
        let ptr = self.insert_unlinked(key, value)?;
        self.link_as_head(ptr);
        Some(ptr)
    }

    /// Stores the entry in the table and arena without linking it into the
    /// order. Callers must link the returned handle before returning.
    fn insert_unlinked(&mut self, key: K, value: V) -> Option<Ptr> {
        let hash = self.hasher.hash_one(&key);
        let Self { table, nodes, .. } = self;
        match table.entry(hash, |&ptr| nodes[ptr].key == key, |&ptr| nodes[ptr].hash) {
            hash_table::Entry::Occupied(_) => None,
            hash_table::Entry::Vacant(vacant) => {
                let ptr = nodes.alloc(Node::unlinked(hash, key, value));
                vacant.insert(ptr);
                Some(ptr)
            }
        }
    }

    /// Returns the handle of the entry for `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::LinkedHashMap;
    ///
    /// let mut map = LinkedHashMap::new();
    /// let inserted = map.insert_tail("key", 42).unwrap();
    ///
    /// assert_eq!(map.get_ptr(&"key"), Some(inserted));
    /// assert_eq!(map.get_ptr(&"missing"), None);
    /// ```
    pub fn get_ptr<Q>(&self, key: &Q) -> Option<Ptr>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        self.table
            .find(hash, |&ptr| Borrow::<Q>::borrow(&self.nodes[ptr].key) == key)
            .copied()
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// The key may be any borrowed form of the map's key type, but `Hash`
    /// and `Eq` on the borrowed form must match those for the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::LinkedHashMap;
    ///
    /// let mut map = LinkedHashMap::new();
    /// map.insert_tail("a".to_string(), 1);
    /// assert_eq!(map.get("a"), Some(&1));
    /// assert_eq!(map.get("b"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_ptr(key).map(|ptr| &self.nodes[ptr].value)
    }

    /// Returns `true` if the map contains an entry for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_ptr(key).is_some()
    }

    /// Returns the 0-based position of `key` counted from the head.
    ///
    /// This walks the list, so it is O(n).
    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let target = self.get_ptr(key)?;
        let mut cursor = self.head;
        let mut index = 0;
        while let Some(ptr) = cursor {
            if ptr == target {
                return Some(index);
            }
            cursor = self.nodes[ptr].next;
            index += 1;
        }
        None
    }

    /// Removes the entry for `key`, returning the stored key and value.
    ///
    /// The table slot and the list node go away together.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::LinkedHashMap;
    ///
    /// let mut map = LinkedHashMap::new();
    /// map.insert_tail(1, "a");
    /// assert_eq!(map.remove(&1), Some((1, "a")));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        let nodes = &self.nodes;
        let ptr = match self
            .table
            .find_entry(hash, |&ptr| Borrow::<Q>::borrow(&nodes[ptr].key) == key)
        {
            Ok(occupied) => occupied.remove().0,
            Err(_) => return None,
        };

        self.unlink(ptr);
        let node = self.nodes.free(ptr);
        Some((node.key, node.value))
    }

    /// Copies the entries whose positions fall in the inclusive range
    /// `start..=end` into a new map, in order.
    ///
    /// Negative endpoints count back from the end (`-1` is the last entry).
    /// Endpoints are validated before that wrap-around, and a range is
    /// rejected with `None` when:
    ///
    /// - `end == 0` (so `between(0, 0)` never selects the head),
    /// - `start` is negative while `end` is positive,
    /// - both share a sign and `start > end`.
    ///
    /// A valid range that covers no positions yields an empty map. The copy
    /// uses a clone of this map's hasher.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::LinkedHashMap;
    ///
    /// let map: LinkedHashMap<i32, i32> = (0..10).map(|i| (i, i)).collect();
    ///
    /// let tail = map.between(-4, -1).unwrap();
    /// assert_eq!(tail.keys().copied().collect::<Vec<_>>(), [6, 7, 8, 9]);
    ///
    /// let head = map.between(0, 2).unwrap();
    /// assert_eq!(head.keys().copied().collect::<Vec<_>>(), [0, 1, 2]);
    ///
    /// assert!(map.between(0, 0).is_none());
    /// assert!(map.between(-3, 2).is_none());
    /// ```
    pub fn between(&self, start: isize, end: isize) -> Option<Self>
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        let (start, end) = normalize_range(start, end, self.len())?;

        let mut slice = Self::with_hasher(self.hasher.clone());
        for (index, (key, value)) in self.iter().enumerate() {
            let index = index as isize;
            if index > end {
                break;
            }
            if index >= start {
                slice.insert_tail(key.clone(), value.clone());
            }
        }
        Some(slice)
    }
}

/// Validates raw `between` endpoints, then resolves negative ones against
/// `len`. Returns `None` for rejected combinations.
pub(crate) fn normalize_range(start: isize, end: isize, len: usize) -> Option<(isize, isize)> {
    let signs = start.signum() * end.signum();
    if end == 0 || (signs < 0 && start < end) || (signs > 0 && start > end) {
        return None;
    }

    // Arena handles are u32, so a live length always fits.
    let len = len as isize;
    let start = if start < 0 { start + len } else { start };
    let end = if end < 0 { end + len } else { end };
    Some((start, end))
}

impl<K: PartialEq, V: PartialEq, S> PartialEq for LinkedHashMap<K, V, S> {
    /// Two maps are equal when they hold the same entries in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, S> Eq for LinkedHashMap<K, V, S> {}

impl<K, V, S> FromIterator<(K, V)> for LinkedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = LinkedHashMap::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for LinkedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Appends each pair at the tail. Keys already present keep their
    /// original value and position.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert_tail(key, value);
        }
    }
}

impl<K, V, S> IntoIterator for LinkedHashMap<K, V, S> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            front: self.head,
            back: self.tail,
            remaining: self.table.len(),
            nodes: self.nodes,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a LinkedHashMap<K, V, S> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
