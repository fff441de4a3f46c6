use persrun_common::TemplateId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::StreamError;

/// Shuffled permutation of the segment catalog plus a cursor.
///
/// Within one pass every template comes up exactly once. When a pass runs
/// out the order is reshuffled, and the first pick of the new pass never
/// equals the last pick of the old one.
#[derive(Debug, Clone)]
pub struct SelectionOrder {
    order: Vec<TemplateId>,
    cursor: usize,
    last: Option<TemplateId>,
    passes: u64,
    rng: StdRng,
}

impl SelectionOrder {
    /// Build an order over `catalog`, seeded for reproducible runs.
    ///
    /// Duplicate entries are dropped so a pass never repeats a template.
    pub fn new(catalog: &[TemplateId], seed: u64) -> Result<Self, StreamError> {
        let mut order = Vec::with_capacity(catalog.len());
        for t in catalog {
            if order.contains(t) {
                tracing::warn!(template = %t, "duplicate template in catalog ignored");
                continue;
            }
            order.push(*t);
        }
        if order.is_empty() {
            return Err(StreamError::EmptyCatalog);
        }
        let mut selection = Self {
            order,
            cursor: 0,
            last: None,
            passes: 0,
            rng: StdRng::seed_from_u64(seed),
        };
        selection.reshuffle();
        Ok(selection)
    }

    /// Draw the next template.
    pub fn pick(&mut self) -> TemplateId {
        if self.cursor >= self.order.len() {
            self.reshuffle();
        }
        let t = self.order[self.cursor];
        self.cursor += 1;
        self.last = Some(t);
        t
    }

    fn reshuffle(&mut self) {
        self.order.shuffle(&mut self.rng);
        let len = self.order.len();
        if len >= 2 && self.last == Some(self.order[0]) {
            let swap_with = self.rng.random_range(1..len);
            self.order.swap(0, swap_with);
        }
        self.cursor = 0;
        self.passes += 1;
        tracing::trace!(passes = self.passes, "selection reshuffled");
    }

    /// Number of distinct templates.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of shuffles performed, the initial one included.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn last_pick(&self) -> Option<TemplateId> {
        self.last
    }
}

impl Iterator for SelectionOrder {
    type Item = TemplateId;

    fn next(&mut self) -> Option<TemplateId> {
        Some(self.pick())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn catalog(n: u32) -> Vec<TemplateId> {
        (0..n).map(TemplateId).collect()
    }

    #[test]
    fn empty_catalog_rejected() {
        assert!(matches!(
            SelectionOrder::new(&[], 1),
            Err(StreamError::EmptyCatalog)
        ));
    }

    #[test]
    fn single_template_always_selected() {
        let mut s = SelectionOrder::new(&[TemplateId(4)], 9).unwrap();
        for _ in 0..20 {
            assert_eq!(s.pick(), TemplateId(4));
        }
    }

    #[test]
    fn each_pass_is_a_permutation() {
        let cat = catalog(5);
        let mut s = SelectionOrder::new(&cat, 3).unwrap();
        for _ in 0..10 {
            let pass: HashSet<TemplateId> = (0..5).map(|_| s.pick()).collect();
            assert_eq!(pass.len(), 5);
        }
    }

    #[test]
    fn duplicates_are_dropped() {
        let s = SelectionOrder::new(&[TemplateId(1), TemplateId(1), TemplateId(2)], 0).unwrap();
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn same_seed_same_sequence() {
        let cat = catalog(4);
        let a: Vec<_> = SelectionOrder::new(&cat, 77).unwrap().take(40).collect();
        let b: Vec<_> = SelectionOrder::new(&cat, 77).unwrap().take(40).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn reshuffles_after_pass() {
        let mut s = SelectionOrder::new(&catalog(3), 5).unwrap();
        assert_eq!(s.passes(), 1);
        for _ in 0..3 {
            s.pick();
        }
        assert_eq!(s.passes(), 1);
        s.pick();
        assert_eq!(s.passes(), 2);
    }

    // Property: no two consecutive picks are equal, across pass seams too.
    proptest! {
        #[test]
        fn prop_no_immediate_repeat(n in 2u32..8, seed in any::<u64>(), picks in 1usize..300) {
            let mut s = SelectionOrder::new(&catalog(n), seed).unwrap();
            let mut prev = s.pick();
            for _ in 0..picks {
                let next = s.pick();
                prop_assert_ne!(next, prev);
                prev = next;
            }
        }
    }
}
