//! Bounded, duplicate-free window of the most recently seen numbers.
//!
//! Values are kept in insertion order. Once the window grows beyond its capacity,
//! the oldest-inserted values are evicted first, regardless of their magnitude.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::prelude::*;

pub type Number = i64;

pub struct WindowStore {
    capacity: NonZeroUsize,

    /// Retained values in insertion order, oldest first.
    order: VecDeque<Number>,

    /// Membership index over `order`.
    members: AHashSet<Number>,
}

/// Window snapshots taken right before and right after a merge.
#[derive(Debug, PartialEq, Eq)]
pub struct Merge {
    pub previous: Vec<Number>,
    pub current: Vec<Number>,
}

impl WindowStore {
    pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10) {
        Some(capacity) => capacity,
        None => unreachable!(),
    };

    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity.get()),
            members: AHashSet::default(),
        }
    }

    /// Inserts the values in the given order and trims the window back to its capacity.
    ///
    /// Values which are already retained keep their original position.
    pub fn merge(&mut self, values: &[Number]) -> Merge {
        let previous = self.snapshot();

        for &value in values {
            if self.members.insert(value) {
                self.order.push_back(value);
            }
        }
        while self.order.len() > self.capacity.get() {
            if let Some(evicted) = self.order.pop_front() {
                self.members.remove(&evicted);
            }
        }

        Merge {
            previous,
            current: self.snapshot(),
        }
    }

    /// Arithmetic mean of the retained values, or `0` for an empty window.
    #[must_use]
    pub fn average(&self) -> f64 {
        if self.order.is_empty() {
            return 0.0;
        }
        let sum = self.order.iter().map(|&value| value as f64).sum::<f64>();
        sum / self.order.len() as f64
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Number> {
        self.order.iter().copied().collect()
    }
}

impl Default for WindowStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(capacity: usize, retained: &[Number]) -> WindowStore {
        let mut store = WindowStore::new(NonZeroUsize::new(capacity).unwrap());
        store.merge(retained);
        store
    }

    #[test]
    fn empty_store_average_is_zero() {
        let store = WindowStore::default();
        assert!(store.snapshot().is_empty());
        assert_eq!(store.average(), 0.0);
    }

    #[test]
    fn merge_into_empty_ok() {
        let mut store = WindowStore::default();
        let merge = store.merge(&[1, 2, 3]);
        assert_eq!(merge.previous, Vec::<Number>::new());
        assert_eq!(merge.current, vec![1, 2, 3]);
        assert!((store.average() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn merge_evicts_oldest_ok() {
        let mut store = store(3, &[1, 2, 3]);
        let merge = store.merge(&[4]);
        assert_eq!(merge.previous, vec![1, 2, 3]);
        assert_eq!(merge.current, vec![2, 3, 4]);
        assert!((store.average() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn merge_keeps_position_of_retained_duplicate() {
        let mut store = store(3, &[1, 2, 3]);
        let merge = store.merge(&[2, 5]);
        assert_eq!(merge.previous, vec![1, 2, 3]);
        assert_eq!(merge.current, vec![2, 3, 5]);
        assert!((store.average() - 10.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn eviction_ignores_magnitude() {
        let mut store = store(3, &[30, 20, 10]);
        assert_eq!(store.merge(&[1]).current, vec![20, 10, 1]);
    }

    #[test]
    fn duplicates_within_batch_insert_once() {
        let mut store = WindowStore::default();
        assert_eq!(store.merge(&[5, 5]).current, vec![5]);
        assert_eq!(store.snapshot(), [5]);
    }

    #[test]
    fn repeated_duplicate_batches_are_idempotent() {
        let mut once = store(4, &[1, 2, 3]);
        let mut twice = store(4, &[1, 2, 3]);
        let expected = once.merge(&[7]).current;
        twice.merge(&[7, 7]);
        assert_eq!(twice.merge(&[7, 7]).current, expected);
    }

    #[test]
    fn empty_merge_changes_nothing() {
        let mut store = store(3, &[4, 8, 15]);
        let average = store.average();
        let merge = store.merge(&[]);
        assert_eq!(merge.previous, merge.current);
        assert_eq!(store.average(), average);
    }

    #[test]
    fn oversized_batch_keeps_its_tail() {
        let mut store = store(3, &[1]);
        let merge = store.merge(&[10, 11, 12, 13, 11]);
        assert_eq!(merge.current, vec![11, 12, 13]);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut store = store(5, &[]);
        let mut seed = 17_i64;
        for round in 0..200 {
            let batch: Vec<Number> = (0..round % 9)
                .map(|_| {
                    seed = (seed * 1_103_515_245 + 12_345) % 2_147_483_648;
                    seed % 23
                })
                .collect();
            let merge = store.merge(&batch);
            assert!(merge.current.len() <= 5);
            let unique = merge.current.iter().collect::<AHashSet<_>>();
            assert_eq!(unique.len(), merge.current.len());
        }
    }
}
