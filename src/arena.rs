use core::ops::Index;
use core::ops::IndexMut;

use crate::Ptr;

#[cold]
#[inline(never)]
fn assert_free() -> ! {
    panic!("Attempted to access data of free slot");
}

/// An occupied slot: the entry plus its position in the order.
#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) prev: Option<Ptr>,
    pub(crate) next: Option<Ptr>,
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Node<K, V> {
    pub(crate) fn unlinked(hash: u64, key: K, value: V) -> Self {
        Node {
            prev: None,
            next: None,
            hash,
            key,
            value,
        }
    }
}

#[derive(Debug, Clone)]
enum Slot<K, V> {
    Free { next_free: Option<Ptr> },
    Occupied(Node<K, V>),
}

/// Slot storage addressed by [`Ptr`]. Freed slots form an intrusive stack and
/// are reused before the backing vector grows.
#[derive(Debug, Clone)]
pub(crate) struct Arena<K, V> {
    slots: Vec<Slot<K, V>>,
    free_head: Option<Ptr>,
}

impl<K, V> Arena<K, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Arena {
            slots: Vec::with_capacity(capacity),
            free_head: None,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        // Occupied slots cannot be compacted since outstanding Ptrs refer to
        // them, so only trailing spare capacity is released.
        self.slots.shrink_to_fit();
    }

    pub(crate) fn alloc(&mut self, node: Node<K, V>) -> Ptr {
        match self.free_head {
            Some(ptr) => {
                let old = core::mem::replace(
                    &mut self.slots[ptr.unchecked_get()],
                    Slot::Occupied(node),
                );
                match old {
                    Slot::Free { next_free } => self.free_head = next_free,
                    Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
                }
                ptr
            }
            None => {
                let ptr = Ptr::unchecked_from(self.slots.len());
                self.slots.push(Slot::Occupied(node));
                ptr
            }
        }
    }

    pub(crate) fn is_occupied(&self, ptr: Ptr) -> bool {
        matches!(self.slots.get(ptr.unchecked_get()), Some(Slot::Occupied(_)))
    }

    pub(crate) fn get(&self, ptr: Ptr) -> Option<&Node<K, V>> {
        match self.slots.get(ptr.unchecked_get()) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    pub(crate) fn free(&mut self, ptr: Ptr) -> Node<K, V> {
        assert!(self.is_occupied(ptr), "Pointer to free must be occupied");
        let old = core::mem::replace(
            &mut self.slots[ptr.unchecked_get()],
            Slot::Free {
                next_free: self.free_head,
            },
        );
        self.free_head = Some(ptr);

        match old {
            Slot::Occupied(node) => node,
            Slot::Free { .. } => assert_free(),
        }
    }
}

impl<K, V> Index<Ptr> for Arena<K, V> {
    type Output = Node<K, V>;

    fn index(&self, index: Ptr) -> &Self::Output {
        match &self.slots[index.unchecked_get()] {
            Slot::Occupied(node) => node,
            Slot::Free { .. } => assert_free(),
        }
    }
}

impl<K, V> IndexMut<Ptr> for Arena<K, V> {
    fn index_mut(&mut self, index: Ptr) -> &mut Self::Output {
        match &mut self.slots[index.unchecked_get()] {
            Slot::Occupied(node) => node,
            Slot::Free { .. } => assert_free(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node<K, V>(key: K, value: V) -> Node<K, V> {
        Node::unlinked(0, key, value)
    }

    #[test]
    fn test_ptr_debug() {
        let ptr = Ptr::unchecked_from(42);
        assert_eq!(format!("{:?}", ptr), "Ptr(42)");
        assert_eq!(ptr.unchecked_get(), 42);
    }

    #[test]
    fn test_ptr_niche() {
        assert_eq!(
            core::mem::size_of::<Option<Ptr>>(),
            core::mem::size_of::<Ptr>()
        );
    }

    #[test]
    fn test_arena_alloc_multiple() {
        let mut arena = Arena::with_capacity(4);
        let ptr1 = arena.alloc(node(1, "one".to_string()));
        let ptr2 = arena.alloc(node(2, "two".to_string()));
        let ptr3 = arena.alloc(node(3, "three".to_string()));

        assert_ne!(ptr1, ptr2);
        assert_ne!(ptr2, ptr3);
        assert!(arena.is_occupied(ptr1));
        assert!(arena.is_occupied(ptr3));

        assert_eq!(arena[ptr1].key, 1);
        assert_eq!(arena[ptr2].value, "two");
        assert_eq!(arena.get(ptr3).map(|n| n.key), Some(3));
    }

    #[test]
    fn test_arena_free_and_reuse() {
        let mut arena = Arena::with_capacity(0);
        let ptr1 = arena.alloc(node(1, "one"));
        let ptr2 = arena.alloc(node(2, "two"));

        let freed = arena.free(ptr1);
        assert_eq!(freed.key, 1);
        assert_eq!(freed.value, "one");
        assert!(!arena.is_occupied(ptr1));
        assert!(arena.get(ptr1).is_none());
        assert!(arena.is_occupied(ptr2));

        let ptr3 = arena.alloc(node(3, "three"));
        assert_eq!(ptr3, ptr1);
        assert_eq!(arena[ptr3].key, 3);
    }

    #[test]
    fn test_arena_free_list_is_lifo() {
        let mut arena = Arena::with_capacity(0);
        let ptrs: Vec<_> = (0..4).map(|i| arena.alloc(node(i, i))).collect();

        arena.free(ptrs[1]);
        arena.free(ptrs[3]);

        assert_eq!(arena.alloc(node(10, 10)), ptrs[3]);
        assert_eq!(arena.alloc(node(11, 11)), ptrs[1]);
        assert_eq!(arena.alloc(node(12, 12)), Ptr::unchecked_from(4));
    }

    #[test]
    fn test_arena_clear() {
        let mut arena = Arena::with_capacity(0);
        let ptr = arena.alloc(node(1, 1));
        arena.free(ptr);
        arena.alloc(node(2, 2));

        arena.clear();

        assert!(arena.slots.is_empty());
        assert!(arena.free_head.is_none());
        assert!(!arena.is_occupied(ptr));
    }

    #[test]
    fn test_arena_is_occupied_out_of_bounds() {
        let arena: Arena<i32, i32> = Arena::with_capacity(0);
        assert!(!arena.is_occupied(Ptr::unchecked_from(7)));
        assert!(arena.get(Ptr::unchecked_from(7)).is_none());
    }

    #[test]
    #[should_panic]
    fn test_arena_index_unoccupied_ptr() {
        let mut arena = Arena::with_capacity(0);
        let ptr = arena.alloc(node(1, "one"));
        arena.free(ptr);
        let _ = &arena[ptr];
    }

    #[test]
    #[should_panic]
    fn test_arena_free_unoccupied_ptr() {
        let mut arena = Arena::with_capacity(0);
        let ptr = arena.alloc(node(1, "one"));
        arena.free(ptr);
        arena.free(ptr);
    }
}
