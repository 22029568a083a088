//! Thread-safe ordered hash map.
//!
//! [`OMap`] puts a [`LinkedHashMap`] behind a single `parking_lot` read-write
//! lock. Structural changes take the write lock for their whole duration;
//! lookups, walks, and range copies share the read lock, so they always see
//! the table and the order in agreement.
//!
//! Every method takes the lock exactly once and then works through the
//! unguarded core, so no method re-enters the lock it already holds. Read
//! methods take the lock recursively: a reader never queues behind a waiting
//! writer, so a walk's visitor may call them on the same map.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use omap::OMap;
//!
//! let map = Arc::new(OMap::new());
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let map = Arc::clone(&map);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 map.rpush(t * 100 + i, i);
//!             }
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(map.size(), 400);
//! ```

use core::borrow::Borrow;
use core::hash::BuildHasher;
use core::hash::Hash;

use parking_lot::RwLock;
use tracing::debug;
use tracing::trace;

use crate::Ptr;
use crate::RandomState;
use crate::error::Error;
use crate::error::Operand;
use crate::error::Result;
use crate::linked_hash_map::LinkedHashMap;

/// A concurrent map that keeps its keys in a caller-controlled order.
///
/// Keys are unique and the first push of a key wins. Entries can be added at
/// either end, repositioned relative to the ends or to another key, walked in
/// either direction, and copied out by position range.
///
/// All methods take `&self`; share the map across threads with an `Arc`.
///
/// # Examples
///
/// ```
/// use omap::OMap;
///
/// let map = OMap::new();
/// map.rpush("b", 2);
/// map.rpush("c", 3);
/// map.lpush("a", 1);
///
/// map.move_to_back(&"a").unwrap();
/// assert_eq!(map.keys(), ["b", "c", "a"]);
///
/// map.move_before(&"a", &"b").unwrap();
/// assert_eq!(map.keys(), ["a", "b", "c"]);
/// ```
pub struct OMap<K, V, S = RandomState> {
    inner: RwLock<LinkedHashMap<K, V, S>>,
}

impl<K, V> OMap<K, V> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty map able to hold at least `capacity` entries without
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::default())
    }
}

impl<K, V, S> OMap<K, V, S> {
    /// Creates an empty map which will use the given hash builder.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    /// Creates an empty map with the given capacity and hash builder.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        OMap {
            inner: RwLock::new(LinkedHashMap::with_capacity_and_hasher(capacity, hasher)),
        }
    }

    /// Returns the number of entries.
    pub fn size(&self) -> usize {
        self.inner.read_recursive().len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read_recursive().is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.inner.write().clear();
        trace!("clear");
    }

    /// Calls `visit` on every entry from front to back.
    ///
    /// The read lock is held for the whole walk, so writers wait until it
    /// finishes. `visit` may call read methods such as [`get`](Self::get) or
    /// [`exists`](Self::exists) on this map, even while a writer is waiting.
    /// Calling a writing method from `visit` deadlocks.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::OMap;
    ///
    /// let map: OMap<_, _> = [(1, "a"), (2, "b")].into_iter().collect();
    /// let mut seen = Vec::new();
    /// map.lwalk(|key, value| seen.push((*key, *value)));
    /// assert_eq!(seen, [(1, "a"), (2, "b")]);
    /// ```
    pub fn lwalk<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V),
    {
        let map = self.inner.read_recursive();
        for (key, value) in map.iter() {
            visit(key, value);
        }
    }

    /// Calls `visit` on every entry from back to front.
    ///
    /// Locking is the same as [`lwalk`](Self::lwalk).
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::OMap;
    ///
    /// let map: OMap<_, _> = [(1, "a"), (2, "b"), (3, "c")].into_iter().collect();
    /// let mut seen = Vec::new();
    /// map.rwalk(|key, _| seen.push(*key));
    /// assert_eq!(seen, [3, 2, 1]);
    /// ```
    pub fn rwalk<F>(&self, mut visit: F)
    where
        F: FnMut(&K, &V),
    {
        let map = self.inner.read_recursive();
        for (key, value) in map.iter().rev() {
            visit(key, value);
        }
    }

    /// Returns a point-in-time copy of the keys, front to back.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.inner.read_recursive().keys().cloned().collect()
    }

    /// Returns a point-in-time copy of the entries, front to back.
    pub fn to_vec(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.inner
            .read_recursive()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Returns a copy of the first entry.
    pub fn front(&self) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let map = self.inner.read_recursive();
        let (key, value) = map.ptr_get_entry(map.head_ptr()?)?;
        Some((key.clone(), value.clone()))
    }

    /// Returns a copy of the last entry.
    pub fn back(&self) -> Option<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        let map = self.inner.read_recursive();
        let (key, value) = map.ptr_get_entry(map.tail_ptr()?)?;
        Some((key.clone(), value.clone()))
    }

    /// Consumes the lock and returns the unguarded map.
    pub fn into_inner(self) -> LinkedHashMap<K, V, S> {
        self.inner.into_inner()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> OMap<K, V, S> {
    /// Returns `true` if `key` is present.
    ///
    /// Takes the read lock, so it never observes a half-applied write.
    pub fn exists<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read_recursive().contains_key(key)
    }

    /// Appends `key` at the back.
    ///
    /// Returns `false` and changes nothing if `key` is already present.
    pub fn rpush(&self, key: K, value: V) -> bool {
        let mut map = self.inner.write();
        let inserted = map.insert_tail(key, value).is_some();
        trace!(inserted, len = map.len(), "rpush");
        inserted
    }

    /// Prepends `key` at the front.
    ///
    /// Returns `false` and changes nothing if `key` is already present.
    pub fn lpush(&self, key: K, value: V) -> bool {
        let mut map = self.inner.write();
        let inserted = map.insert_head(key, value).is_some();
        trace!(inserted, len = map.len(), "lpush");
        inserted
    }

    /// Removes `key` and its value. Removing an absent key does nothing.
    pub fn remove<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.take(key);
    }

    /// Removes `key`, returning its value if it was present.
    pub fn take<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut map = self.inner.write();
        let removed = map.remove(key).map(|(_, value)| value);
        trace!(removed = removed.is_some(), len = map.len(), "remove");
        removed
    }

    /// Returns a copy of the value stored for `key`.
    ///
    /// `None` always means absent; a stored `Option` comes back wrapped.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::OMap;
    ///
    /// let map = OMap::new();
    /// map.rpush("set", None::<u8>);
    ///
    /// assert_eq!(map.get(&"set"), Some(None));
    /// assert_eq!(map.get(&"unset"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.read_recursive().get(key).cloned()
    }

    /// Runs `f` on the value stored for `key` while holding the read lock.
    ///
    /// Useful when `V` is expensive to clone.
    pub fn get_with<Q, R, F>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(&V) -> R,
    {
        self.inner.read_recursive().get(key).map(f)
    }

    /// Returns the 0-based position of `key` from the front.
    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read_recursive().position(key)
    }

    /// Moves `key` to the front.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if `key` is absent.
    pub fn move_to_front<Q>(&self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut map = self.inner.write();
        let ptr =
            find(&*map, key, Operand::Key).inspect_err(|err| debug!(%err, "move_to_front"))?;
        map.move_to_head(ptr).ok_or(Error::KeyNotFound(Operand::Key))?;
        trace!("move_to_front");
        Ok(())
    }

    /// Moves `key` to the back.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if `key` is absent.
    pub fn move_to_back<Q>(&self, key: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut map = self.inner.write();
        let ptr =
            find(&*map, key, Operand::Key).inspect_err(|err| debug!(%err, "move_to_back"))?;
        map.move_to_tail(ptr).ok_or(Error::KeyNotFound(Operand::Key))?;
        trace!("move_to_back");
        Ok(())
    }

    /// Moves `key` to sit immediately before `mark`.
    ///
    /// When `key` and `mark` are the same present key nothing moves.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] naming whichever of `key` or `mark` is absent,
    /// checking `key` first.
    pub fn move_before<Q>(&self, key: &Q, mark: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut map = self.inner.write();
        let (moved, before) =
            find_pair(&*map, key, mark).inspect_err(|err| debug!(%err, "move_before"))?;
        map.move_before(moved, before)
            .ok_or(Error::KeyNotFound(Operand::Key))?;
        trace!("move_before");
        Ok(())
    }

    /// Moves `key` to sit immediately after `mark`.
    ///
    /// When `key` and `mark` are the same present key nothing moves.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] naming whichever of `key` or `mark` is absent,
    /// checking `key` first.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::Error;
    /// use omap::OMap;
    /// use omap::Operand;
    ///
    /// let map: OMap<_, _> = (0..4).map(|i| (i, ())).collect();
    /// map.move_after(&0, &2).unwrap();
    /// assert_eq!(map.keys(), [1, 2, 0, 3]);
    ///
    /// assert_eq!(map.move_after(&0, &9), Err(Error::KeyNotFound(Operand::Mark)));
    /// ```
    pub fn move_after<Q>(&self, key: &Q, mark: &Q) -> Result<()>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut map = self.inner.write();
        let (moved, after) =
            find_pair(&*map, key, mark).inspect_err(|err| debug!(%err, "move_after"))?;
        map.move_after(moved, after)
            .ok_or(Error::KeyNotFound(Operand::Key))?;
        trace!("move_after");
        Ok(())
    }

    /// Copies the entries at positions `start..=end` into a new map.
    ///
    /// Both endpoints are inclusive and negative values count back from the
    /// end. Returns `None` when `end == 0`, when `start` is negative and
    /// `end` positive, or when both share a sign and `start > end`. See
    /// [`LinkedHashMap::between`] for the full rules.
    ///
    /// The copy is taken under the read lock and shares nothing with `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use omap::OMap;
    ///
    /// let map: OMap<_, _> = (0..10).map(|i| (i, i)).collect();
    ///
    /// let last_four = map.between(-4, -1).unwrap();
    /// assert_eq!(last_four.keys(), [6, 7, 8, 9]);
    ///
    /// assert!(map.between(0, 0).is_none());
    /// ```
    pub fn between(&self, start: isize, end: isize) -> Option<Self>
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        let map = self.inner.read_recursive();
        match map.between(start, end) {
            Some(slice) => {
                trace!(start, end, selected = slice.len(), "between");
                Some(Self::from(slice))
            }
            None => {
                debug!(start, end, len = map.len(), "between rejected range");
                None
            }
        }
    }

    /// Like [`between`](Self::between), but reports a rejected range as
    /// [`Error::InvalidRange`].
    pub fn try_between(&self, start: isize, end: isize) -> Result<Self>
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        self.between(start, end)
            .ok_or(Error::InvalidRange { start, end })
    }
}

fn find<K, V, S, Q>(map: &LinkedHashMap<K, V, S>, key: &Q, operand: Operand) -> Result<Ptr>
where
    K: Hash + Eq + Borrow<Q>,
    S: BuildHasher,
    Q: Hash + Eq + ?Sized,
{
    map.get_ptr(key).ok_or(Error::KeyNotFound(operand))
}

fn find_pair<K, V, S, Q>(map: &LinkedHashMap<K, V, S>, key: &Q, mark: &Q) -> Result<(Ptr, Ptr)>
where
    K: Hash + Eq + Borrow<Q>,
    S: BuildHasher,
    Q: Hash + Eq + ?Sized,
{
    Ok((find(map, key, Operand::Key)?, find(map, mark, Operand::Mark)?))
}

impl<K, V, S> From<LinkedHashMap<K, V, S>> for OMap<K, V, S> {
    fn from(map: LinkedHashMap<K, V, S>) -> Self {
        OMap {
            inner: RwLock::new(map),
        }
    }
}

impl<K, V, S: Default> Default for OMap<K, V, S> {
    fn default() -> Self {
        Self::from(LinkedHashMap::default())
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for OMap<K, V, S> {
    fn clone(&self) -> Self {
        Self::from(self.inner.read_recursive().clone())
    }
}

impl<K: core::fmt::Debug, V: core::fmt::Debug, S> core::fmt::Debug for OMap<K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.inner.read_recursive().iter()).finish()
    }
}

impl<K, V, S> FromIterator<(K, V)> for OMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Pushes each pair at the back; later duplicates are ignored.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<LinkedHashMap<K, V, S>>())
    }
}

impl<K, V, S> Extend<(K, V)> for OMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.inner.get_mut().extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OMap;

    fn filled(n: i32) -> OMap<i32, i32> {
        (0..n).map(|i| (i, i)).collect()
    }

    #[test]
    fn test_exists() {
        let map = OMap::new();
        assert!(!map.exists(&"yumontime"));
        assert!(map.rpush("yumontime", "nb"));
        assert!(map.exists(&"yumontime"));
        map.remove(&"yumontime");
        assert!(!map.exists(&"yumontime"));
    }

    #[test]
    fn test_push_uniqueness() {
        let map = OMap::new();
        assert!(map.rpush("a", 1));
        assert!(map.lpush("b", 2));
        assert!(!map.rpush("a", 10));
        assert!(!map.lpush("a", 11));
        assert!(!map.lpush("b", 12));

        assert_eq!(map.size(), 2);
        assert_eq!(map.get(&"a"), Some(1));
        assert_eq!(map.get(&"b"), Some(2));
        assert_eq!(map.keys(), ["b", "a"]);
    }

    #[test]
    fn test_mixed_pushes_walk_in_order() {
        let map = OMap::new();
        map.rpush("yumontime", "nb");
        map.rpush("yot", "nb");
        map.lpush("jankin", "nb");
        map.lpush("henry", "nb");

        let mut forward = Vec::new();
        map.lwalk(|key, _| forward.push(*key));
        assert_eq!(forward, ["henry", "jankin", "yumontime", "yot"]);

        let mut backward = Vec::new();
        map.rwalk(|key, _| backward.push(*key));
        assert_eq!(backward, ["yot", "yumontime", "jankin", "henry"]);
    }

    #[test]
    fn test_rwalk_visits_every_entry() {
        let map = filled(5);
        let mut count = 0;
        map.rwalk(|_, _| count += 1);
        assert_eq!(count, 5);
    }

    #[test]
    fn test_walks_on_empty_map() {
        let map: OMap<i32, i32> = OMap::new();
        map.lwalk(|_, _| panic!("nothing to visit"));
        map.rwalk(|_, _| panic!("nothing to visit"));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let map = filled(3);
        map.remove(&7);
        assert_eq!(map.size(), 3);
        assert_eq!(map.take(&7), None);
        assert_eq!(map.take(&1), Some(1));
        assert_eq!(map.keys(), [0, 2]);
    }

    #[test]
    fn test_remove_then_rpush_goes_to_back() {
        let map = filled(4);
        map.remove(&0);
        assert!(map.rpush(0, 100));
        assert_eq!(map.keys(), [1, 2, 3, 0]);
        assert_eq!(map.get(&0), Some(100));
    }

    #[test]
    fn test_get_with() {
        let map = OMap::new();
        map.rpush("k", vec![1, 2, 3]);
        assert_eq!(map.get_with(&"k", |v| v.len()), Some(3));
        assert_eq!(map.get_with(&"x", |v| v.len()), None);
    }

    #[test]
    fn test_front_back_position() {
        let map = filled(4);
        assert_eq!(map.front(), Some((0, 0)));
        assert_eq!(map.back(), Some((3, 3)));
        assert_eq!(map.position(&2), Some(2));

        let empty: OMap<i32, i32> = OMap::new();
        assert_eq!(empty.front(), None);
        assert_eq!(empty.back(), None);
    }

    #[test]
    fn test_move_to_front_and_back() {
        let map = filled(5);

        map.move_to_front(&3).unwrap();
        assert_eq!(map.keys(), [3, 0, 1, 2, 4]);

        map.move_to_back(&3).unwrap();
        assert_eq!(map.keys(), [0, 1, 2, 4, 3]);

        map.move_to_front(&0).unwrap();
        map.move_to_back(&3).unwrap();
        assert_eq!(map.keys(), [0, 1, 2, 4, 3]);

        assert_eq!(map.move_to_front(&9), Err(Error::KeyNotFound(Operand::Key)));
        assert_eq!(map.move_to_back(&9), Err(Error::KeyNotFound(Operand::Key)));
    }

    #[test]
    fn test_move_before_and_after() {
        let map = filled(5);

        map.move_before(&4, &1).unwrap();
        assert_eq!(map.keys(), [0, 4, 1, 2, 3]);

        map.move_after(&0, &3).unwrap();
        assert_eq!(map.keys(), [4, 1, 2, 3, 0]);

        map.move_before(&0, &4).unwrap();
        assert_eq!(map.keys(), [0, 4, 1, 2, 3]);

        map.move_after(&4, &3).unwrap();
        assert_eq!(map.keys(), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_move_reports_missing_operand() {
        let map = filled(3);

        assert_eq!(map.move_before(&9, &1), Err(Error::KeyNotFound(Operand::Key)));
        assert_eq!(map.move_before(&1, &9), Err(Error::KeyNotFound(Operand::Mark)));
        assert_eq!(map.move_after(&9, &8), Err(Error::KeyNotFound(Operand::Key)));
        assert_eq!(map.move_after(&1, &9), Err(Error::KeyNotFound(Operand::Mark)));
        assert_eq!(map.keys(), [0, 1, 2]);
    }

    #[test]
    fn test_move_relative_to_itself() {
        let map = filled(3);

        map.move_before(&1, &1).unwrap();
        map.move_after(&1, &1).unwrap();
        assert_eq!(map.keys(), [0, 1, 2]);

        assert_eq!(map.move_before(&9, &9), Err(Error::KeyNotFound(Operand::Key)));
        assert_eq!(map.move_after(&9, &9), Err(Error::KeyNotFound(Operand::Key)));
    }

    #[test]
    fn test_move_keeps_values() {
        let map = OMap::new();
        map.rpush("a", 1);
        map.rpush("b", 2);
        map.move_to_front(&"b").unwrap();
        assert_eq!(map.to_vec(), [("b", 2), ("a", 1)]);
    }

    #[test]
    fn test_between() {
        let map = filled(10);

        assert_eq!(map.between(-4, -1).unwrap().keys(), [6, 7, 8, 9]);
        assert_eq!(map.between(-4, -2).unwrap().keys(), [6, 7, 8]);
        assert_eq!(map.between(1, 3).unwrap().keys(), [1, 2, 3]);
        assert!(map.between(0, 0).is_none());
        assert!(map.between(-2, 5).is_none());
    }

    #[test]
    fn test_between_zero_zero_always_rejected() {
        for n in [0, 1, 5] {
            assert!(filled(n).between(0, 0).is_none());
            assert_eq!(
                filled(n).try_between(0, 0).err(),
                Some(Error::InvalidRange { start: 0, end: 0 })
            );
        }
    }

    #[test]
    fn test_between_result_is_independent() {
        let map = filled(6);
        let slice = map.between(2, 4).unwrap();

        slice.remove(&3);
        slice.rpush(100, 100);
        map.move_to_front(&4).unwrap();

        assert_eq!(map.keys(), [4, 0, 1, 2, 3, 5]);
        assert_eq!(slice.keys(), [2, 4, 100]);
    }

    #[test]
    fn test_clear_and_extend() {
        let mut map = filled(3);
        map.clear();
        assert!(map.is_empty());

        map.extend([(5, 5), (6, 6), (5, 50)]);
        assert_eq!(map.to_vec(), [(5, 5), (6, 6)]);
    }

    #[test]
    fn test_clone_and_debug() {
        let map = OMap::new();
        map.rpush("x", 1);
        map.lpush("w", 0);

        let cloned = map.clone();
        map.remove(&"x");

        assert_eq!(format!("{:?}", cloned), r#"{"w": 0, "x": 1}"#);
        assert_eq!(format!("{:?}", map), r#"{"w": 0}"#);
    }

    #[test]
    fn test_into_inner_round_trip() {
        let map = filled(3);
        let inner = map.into_inner();
        assert_eq!(inner.len(), 3);

        let map = OMap::from(inner);
        assert_eq!(map.keys(), [0, 1, 2]);
    }

    #[test]
    fn test_omap_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OMap<String, Vec<u8>>>();
    }
}
