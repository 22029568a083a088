#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

mod arena;
pub mod error;
pub mod linked_hash_map;
pub mod omap;

type RandomState = hashbrown::DefaultHashBuilder;

/// The unguarded ordered hash map using the default hasher.
///
/// This is the single-threaded core that [`OMap`] wraps in a lock. For custom
/// hashers, use [`linked_hash_map::LinkedHashMap`] directly.
///
/// # Examples
///
/// ```
/// use omap::LinkedHashMap;
///
/// let mut map = LinkedHashMap::new();
/// map.insert_tail("a", 1);
/// map.insert_head("b", 2);
///
/// let entries: Vec<_> = map.iter().collect();
/// assert_eq!(entries, [(&"b", &2), (&"a", &1)]);
/// ```
pub type LinkedHashMap<K, V> = crate::linked_hash_map::LinkedHashMap<K, V, RandomState>;

/// A thread-safe ordered hash map using the default hasher.
///
/// # Examples
///
/// ```
/// use omap::OMap;
///
/// let map = OMap::new();
/// assert!(map.rpush("a", 1));
/// assert!(map.lpush("b", 2));
/// assert!(!map.rpush("a", 3));
///
/// assert_eq!(map.get(&"a"), Some(1));
/// assert_eq!(map.keys(), ["b", "a"]);
/// ```
pub type OMap<K, V> = crate::omap::OMap<K, V, RandomState>;

use core::num::NonZeroU32;

pub use error::Error;
pub use error::Operand;
pub use error::Result;
pub use linked_hash_map::IntoIter;
pub use linked_hash_map::Iter;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
/// A handle identifying an entry's slot in a [`LinkedHashMap`].
///
/// Handles give O(1) access to an entry and its neighbours without a key
/// lookup. They are **non-generational**: once an entry is removed, its handle
/// may be handed out again for a later insertion.
///
/// # Examples
///
/// ```
/// use omap::LinkedHashMap;
///
/// let mut map = LinkedHashMap::new();
/// let ptr = map.insert_tail("key", 42).unwrap();
///
/// assert_eq!(map.ptr_get(ptr), Some(&42));
/// assert_eq!(map.get_ptr(&"key"), Some(ptr));
/// ```
pub struct Ptr(NonZeroU32);

impl core::fmt::Debug for Ptr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Ptr({})", self.0.get() - 1)
    }
}

impl Ptr {
    pub(crate) fn unchecked_from(index: usize) -> Self {
        debug_assert!(
            index < u32::MAX as usize,
            "Index too large to fit in Ptr: {index}"
        );
        match NonZeroU32::new((index as u32).saturating_add(1)) {
            Some(raw) => Ptr(raw),
            None => unreachable!("saturating_add(1) is never zero"),
        }
    }

    pub(crate) fn unchecked_get(self) -> usize {
        self.0.get() as usize - 1
    }
}
