use alloc::vec::Vec;

use super::handle::Handle;

/// Slot storage owning every node of a tree.
///
/// Released slots go on a free list and are handed out again by the next
/// [`alloc`](Arena::alloc), so handles stay small and stable for the lifetime
/// of the node they address.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of occupied slots.
    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(handle) = self.free.pop() {
            let slot = &mut self.slots[handle.to_index()];
            debug_assert!(slot.is_none(), "`Arena::alloc()` - free list points at a live slot!");
            *slot = Some(element);
            return handle;
        }

        assert!(
            self.slots.len() <= Handle::MAX,
            "`Arena::alloc()` - arena is at maximum capacity ({})",
            Handle::MAX + 1
        );
        self.slots.push(Some(element));
        Handle::from_index(self.slots.len() - 1)
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is released!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is released!")
    }

    /// Moves the element out of its slot and puts the slot on the free list.
    pub(crate) fn release(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::release()` - `handle` is released!");
        self.free.push(handle);
        element
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn released_slots_are_reused() {
        let mut arena = Arena::new();
        let a = arena.alloc('a');
        let b = arena.alloc('b');
        assert_eq!(arena.release(a), 'a');
        assert_eq!(arena.len(), 1);

        let c = arena.alloc('c');
        assert_eq!(c, a);
        assert_eq!(*arena.get(c), 'c');
        assert_eq!(*arena.get(b), 'b');
        assert_eq!(arena.len(), 2);
    }

    #[test]
    #[should_panic(expected = "`Arena::get()` - `handle` is released!")]
    fn get_after_release_panics() {
        let mut arena = Arena::new();
        let a = arena.alloc(1u8);
        arena.release(a);
        let _ = arena.get(a);
    }

    #[test]
    #[should_panic(expected = "`Arena::release()` - `handle` is released!")]
    fn double_release_panics() {
        let mut arena = Arena::new();
        let a = arena.alloc(1u8);
        arena.release(a);
        arena.release(a);
    }

    #[test]
    #[should_panic(expected = "arena is at maximum capacity")]
    fn alloc_past_max_panics() {
        let mut arena = Arena::with_capacity(Handle::MAX + 1);
        for _ in 0..=Handle::MAX {
            arena.alloc(());
        }
        assert!(arena.capacity() > Handle::MAX);
        arena.alloc(());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Alloc(u32),
        Set(usize, u32),
        Release(usize),
        Clear,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            10 => any::<u32>().prop_map(Op::Alloc),
            4 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Op::Set(which, value)),
            6 => any::<usize>().prop_map(Op::Release),
            1 => Just(Op::Clear),
        ]
    }

    proptest! {
        #[test]
        fn live_slots_track_a_model(ops in prop::collection::vec(op_strategy(), 0..256)) {
            let mut arena: Arena<u32> = Arena::new();
            let mut live: Vec<(Handle, u32)> = Vec::new();

            for op in ops {
                match op {
                    Op::Alloc(value) => live.push((arena.alloc(value), value)),
                    Op::Set(which, value) if !live.is_empty() => {
                        let index = which % live.len();
                        *arena.get_mut(live[index].0) = value;
                        live[index].1 = value;
                    }
                    Op::Release(which) if !live.is_empty() => {
                        let (handle, value) = live.swap_remove(which % live.len());
                        prop_assert_eq!(arena.release(handle), value);
                    }
                    Op::Clear => {
                        arena.clear();
                        live.clear();
                    }
                    Op::Set(..) | Op::Release(_) => {}
                }

                prop_assert_eq!(arena.len(), live.len());
                for &(handle, value) in &live {
                    prop_assert_eq!(*arena.get(handle), value);
                }
            }
        }
    }
}
