use core::iter::FusedIterator;

use crate::Ptr;
use crate::arena::Arena;

#[derive(Debug)]
/// An iterator over the entries of a `LinkedHashMap`, head to tail.
///
/// This struct is created by the [`iter`] method on [`LinkedHashMap`]. It is
/// double-ended, so `.rev()` walks tail to head.
///
/// [`iter`]: super::LinkedHashMap::iter
/// [`LinkedHashMap`]: super::LinkedHashMap
///
/// # Examples
///
/// ```
/// use omap::LinkedHashMap;
///
/// let mut map = LinkedHashMap::new();
/// map.insert_tail("a", 1);
/// map.insert_tail("b", 2);
///
/// let reversed: Vec<_> = map.iter().rev().map(|(k, _)| *k).collect();
/// assert_eq!(reversed, ["b", "a"]);
/// ```
pub struct Iter<'a, K, V> {
    pub(crate) front: Option<Ptr>,
    pub(crate) back: Option<Ptr>,
    pub(crate) remaining: usize,
    pub(crate) nodes: &'a Arena<K, V>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            nodes: self.nodes,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let ptr = self.front?;
        let node = &self.nodes[ptr];
        self.front = node.next;
        self.remaining -= 1;

        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let ptr = self.back?;
        let node = &self.nodes[ptr];
        self.back = node.prev;
        self.remaining -= 1;

        Some((&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An owning iterator over the entries of a `LinkedHashMap`, head to tail.
///
/// This struct is created by the `into_iter` method on `LinkedHashMap`
/// (provided by the [`IntoIterator`] trait).
pub struct IntoIter<K, V> {
    pub(crate) front: Option<Ptr>,
    pub(crate) back: Option<Ptr>,
    pub(crate) remaining: usize,
    pub(crate) nodes: Arena<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let ptr = self.front?;
        // Neighbour links are left stale; `remaining` keeps the two ends from
        // crossing into freed slots.
        let node = self.nodes.free(ptr);
        self.front = node.next;
        self.remaining -= 1;

        Some((node.key, node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let ptr = self.back?;
        let node = self.nodes.free(ptr);
        self.back = node.prev;
        self.remaining -= 1;

        Some((node.key, node.value))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}
