//! Index-addressed sparse slot collections.
//!
//! Every object that needs "one thing per device" (or "one record per view")
//! stores it in an [`IndexedSlots`]. Device and view indices are small,
//! densely assigned integers, so a `Vec<Option<T>>` gives O(1) access and
//! cheap iteration without hashing.

use std::fmt;
use std::marker::PhantomData;

/// A small integer index usable as an offset into [`IndexedSlots`].
pub trait SlotIndex: Copy {
    /// Converts the index into a vector offset.
    fn to_offset(self) -> usize;

    /// Rebuilds the index from a vector offset.
    fn from_offset(offset: usize) -> Self;
}

/// Sparse, index-addressable container.
///
/// Only occupied slots are visited by [`iter`](Self::iter); the backing
/// vector grows on demand and never shrinks except on [`clear`](Self::clear).
pub struct IndexedSlots<I, T> {
    slots: Vec<Option<T>>,
    occupied: usize,
    _index: PhantomData<fn() -> I>,
}

impl<I: SlotIndex, T> IndexedSlots<I, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            occupied: 0,
            _index: PhantomData,
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            occupied: 0,
            _index: PhantomData,
        }
    }

    /// Returns `true` when a value is stored at `index`.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: I) -> bool {
        self.get(index).is_some()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: I) -> Option<&T> {
        self.slots.get(index.to_offset()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn get_mut(&mut self, index: I) -> Option<&mut T> {
        self.slots.get_mut(index.to_offset()).and_then(Option::as_mut)
    }

    /// Stores `value` at `index`, returning the previous value if any.
    pub fn insert(&mut self, index: I, value: T) -> Option<T> {
        let offset = index.to_offset();
        if offset >= self.slots.len() {
            self.slots.resize_with(offset + 1, || None);
        }
        let previous = self.slots[offset].replace(value);
        if previous.is_none() {
            self.occupied += 1;
        }
        previous
    }

    pub fn remove(&mut self, index: I) -> Option<T> {
        let removed = self.slots.get_mut(index.to_offset()).and_then(Option::take);
        if removed.is_some() {
            self.occupied -= 1;
        }
        removed
    }

    pub fn get_or_insert_with(&mut self, index: I, create: impl FnOnce() -> T) -> &mut T {
        let offset = index.to_offset();
        if self.get(index).is_none() {
            self.insert(index, create());
        }
        // The slot was filled above.
        match self.slots[offset].as_mut() {
            Some(value) => value,
            None => unreachable!("slot {offset} was just filled"),
        }
    }

    /// Iterates over occupied slots only.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(offset, slot)| slot.as_ref().map(|value| (I::from_offset(offset), value)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(offset, slot)| slot.as_mut().map(|value| (I::from_offset(offset), value)))
    }

    /// Indices of all occupied slots.
    pub fn indices(&self) -> impl Iterator<Item = I> + '_ {
        self.iter().map(|(index, _)| index)
    }

    /// Removes every value, yielding them with their index.
    pub fn drain(&mut self) -> impl Iterator<Item = (I, T)> + '_ {
        self.occupied = 0;
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(offset, slot)| slot.take().map(|value| (I::from_offset(offset), value)))
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.occupied = 0;
    }
}

impl<I: SlotIndex, T> Default for IndexedSlots<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: SlotIndex, T: Clone> Clone for IndexedSlots<I, T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            occupied: self.occupied,
            _index: PhantomData,
        }
    }
}

impl<I: SlotIndex + fmt::Debug, T: fmt::Debug> fmt::Debug for IndexedSlots<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Idx(usize);

    impl SlotIndex for Idx {
        fn to_offset(self) -> usize {
            self.0
        }
        fn from_offset(offset: usize) -> Self {
            Self(offset)
        }
    }

    #[test]
    fn sparse_insert_and_iterate_occupied_only() {
        let mut slots: IndexedSlots<Idx, &str> = IndexedSlots::new();
        slots.insert(Idx(3), "three");
        slots.insert(Idx(0), "zero");

        assert_eq!(slots.len(), 2);
        assert!(!slots.contains(Idx(1)));
        let visited: Vec<_> = slots.iter().map(|(i, v)| (i.0, *v)).collect();
        assert_eq!(visited, vec![(0, "zero"), (3, "three")]);
    }

    #[test]
    fn remove_updates_count() {
        let mut slots: IndexedSlots<Idx, u32> = IndexedSlots::new();
        slots.insert(Idx(2), 7);
        assert_eq!(slots.insert(Idx(2), 8), Some(7));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots.remove(Idx(2)), Some(8));
        assert_eq!(slots.remove(Idx(2)), None);
        assert!(slots.is_empty());
    }

    #[test]
    fn get_or_insert_runs_factory_once() {
        let mut slots: IndexedSlots<Idx, u32> = IndexedSlots::new();
        let mut calls = 0;
        *slots.get_or_insert_with(Idx(1), || {
            calls += 1;
            10
        }) += 1;
        slots.get_or_insert_with(Idx(1), || {
            calls += 1;
            99
        });
        assert_eq!(calls, 1);
        assert_eq!(slots.get(Idx(1)), Some(&11));
    }

    #[test]
    fn drain_empties_collection() {
        let mut slots: IndexedSlots<Idx, u32> = IndexedSlots::new();
        slots.insert(Idx(0), 1);
        slots.insert(Idx(4), 2);
        let drained: Vec<_> = slots.drain().map(|(i, v)| (i.0, v)).collect();
        assert_eq!(drained, vec![(0, 1), (4, 2)]);
        assert!(slots.is_empty());
        assert!(slots.get(Idx(4)).is_none());
    }
}
