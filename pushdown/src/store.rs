/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Triple matching consumed by the planner.
//!
//! The planner never touches storage directly: everything goes through
//! [`TripleSource::match_pattern`] and [`TripleSource::size`]. [`MemoryStore`]
//! is the in-memory implementation used by tests, benches and small datasets.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use shared::triple::Triple;
use std::sync::Arc;

type Permutation = FxHashMap<u32, FxHashMap<u32, FxHashSet<u32>>>;

pub trait TripleSource: Send + Sync {
    /// Lazily yields every stored triple matching the given positions;
    /// `None` is a wildcard.
    fn match_pattern(
        &self,
        subject: Option<u32>,
        predicate: Option<u32>,
        object: Option<u32>,
    ) -> Box<dyn Iterator<Item = Triple> + '_>;

    /// Number of stored triples (the `kbSize` statistic).
    fn size(&self) -> u64;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    spo: Permutation,
    pos: Permutation,
    osp: Permutation,
    len: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triples(triples: &[Triple]) -> Self {
        let mut store = MemoryStore::new();
        store.build_from_triples(triples);
        store
    }

    /// Insert a single triple into the three permutations
    pub fn insert(&mut self, triple: Triple) -> bool {
        let Triple { subject: s, predicate: p, object: o } = triple;
        if self.contains(&triple) {
            return false;
        }
        self.spo.entry(s).or_default().entry(p).or_default().insert(o);
        self.pos.entry(p).or_default().entry(o).or_default().insert(s);
        self.osp.entry(o).or_default().entry(s).or_default().insert(p);
        self.len += 1;
        true
    }

    pub fn remove(&mut self, triple: &Triple) -> bool {
        if !self.contains(triple) {
            return false;
        }
        let Triple { subject: s, predicate: p, object: o } = *triple;
        remove_from(&mut self.spo, s, p, o);
        remove_from(&mut self.pos, p, o, s);
        remove_from(&mut self.osp, o, s, p);
        self.len -= 1;
        true
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.spo
            .get(&triple.subject)
            .and_then(|preds| preds.get(&triple.predicate))
            .map_or(false, |objects| objects.contains(&triple.object))
    }

    /// Bulk-build from a slice, building partial stores in parallel and merging them.
    pub fn build_from_triples(&mut self, triples: &[Triple]) {
        if triples.is_empty() {
            return;
        }
        let chunk_size = (triples.len() / rayon::current_num_threads()).max(10_000);
        let partials: Vec<MemoryStore> = triples
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut local = MemoryStore::new();
                for triple in chunk {
                    local.insert(*triple);
                }
                local
            })
            .collect();

        for partial in partials {
            self.merge_from(partial);
        }
    }

    fn merge_from(&mut self, other: MemoryStore) {
        for (s, preds) in other.spo {
            for (p, objects) in preds {
                for o in objects {
                    self.insert(Triple::new(s, p, o));
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Triple> + '_ {
        flatten_all(&self.spo).map(|(s, p, o)| Triple::new(s, p, o))
    }
}

fn remove_from(index: &mut Permutation, a: u32, b: u32, c: u32) {
    if let Some(second) = index.get_mut(&a) {
        if let Some(third) = second.get_mut(&b) {
            third.remove(&c);
            if third.is_empty() {
                second.remove(&b);
            }
        }
        if second.is_empty() {
            index.remove(&a);
        }
    }
}

fn flatten_all(index: &Permutation) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
    index.iter().flat_map(|(&a, second)| {
        second
            .iter()
            .flat_map(move |(&b, third)| third.iter().map(move |&c| (a, b, c)))
    })
}

fn flatten_second(
    index: &Permutation,
    a: u32,
) -> Box<dyn Iterator<Item = (u32, u32)> + '_> {
    match index.get(&a) {
        Some(second) => Box::new(
            second
                .iter()
                .flat_map(|(&b, third)| third.iter().map(move |&c| (b, c))),
        ),
        None => Box::new(std::iter::empty()),
    }
}

fn flatten_third(index: &Permutation, a: u32, b: u32) -> Box<dyn Iterator<Item = u32> + '_> {
    match index.get(&a).and_then(|second| second.get(&b)) {
        Some(third) => Box::new(third.iter().copied()),
        None => Box::new(std::iter::empty()),
    }
}

impl TripleSource for MemoryStore {
    fn match_pattern(
        &self,
        subject: Option<u32>,
        predicate: Option<u32>,
        object: Option<u32>,
    ) -> Box<dyn Iterator<Item = Triple> + '_> {
        match (subject, predicate, object) {
            (Some(s), Some(p), Some(o)) => {
                let triple = Triple::new(s, p, o);
                if self.contains(&triple) {
                    Box::new(std::iter::once(triple))
                } else {
                    Box::new(std::iter::empty())
                }
            }
            (Some(s), Some(p), None) => {
                Box::new(flatten_third(&self.spo, s, p).map(move |o| Triple::new(s, p, o)))
            }
            (Some(s), None, Some(o)) => {
                Box::new(flatten_third(&self.osp, o, s).map(move |p| Triple::new(s, p, o)))
            }
            (None, Some(p), Some(o)) => {
                Box::new(flatten_third(&self.pos, p, o).map(move |s| Triple::new(s, p, o)))
            }
            (Some(s), None, None) => {
                Box::new(flatten_second(&self.spo, s).map(move |(p, o)| Triple::new(s, p, o)))
            }
            (None, Some(p), None) => {
                Box::new(flatten_second(&self.pos, p).map(move |(o, s)| Triple::new(s, p, o)))
            }
            (None, None, Some(o)) => {
                Box::new(flatten_second(&self.osp, o).map(move |(s, p)| Triple::new(s, p, o)))
            }
            (None, None, None) => Box::new(self.iter()),
        }
    }

    fn size(&self) -> u64 {
        self.len
    }
}

/// Default graph plus named graphs, keyed by the graph name's dictionary id.
#[derive(Clone)]
pub struct Dataset {
    default_graph: Arc<dyn TripleSource>,
    named_graphs: FxHashMap<u32, Arc<dyn TripleSource>>,
}

impl Dataset {
    pub fn new(default_graph: Arc<dyn TripleSource>) -> Self {
        Dataset {
            default_graph,
            named_graphs: FxHashMap::default(),
        }
    }

    pub fn with_named_graph(mut self, name: u32, graph: Arc<dyn TripleSource>) -> Self {
        self.named_graphs.insert(name, graph);
        self
    }

    pub fn default_graph(&self) -> &dyn TripleSource {
        self.default_graph.as_ref()
    }

    pub fn named_graph(&self, name: u32) -> Option<&dyn TripleSource> {
        self.named_graphs.get(&name).map(|g| g.as_ref())
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("default_size", &self.default_graph.size())
            .field("named_graphs", &self.named_graphs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> MemoryStore {
        MemoryStore::from_triples(&[
            Triple::new(1, 10, 2),
            Triple::new(1, 10, 3),
            Triple::new(2, 11, 3),
            Triple::new(3, 10, 1),
        ])
    }

    fn sorted(iter: Box<dyn Iterator<Item = Triple> + '_>) -> Vec<Triple> {
        let mut v: Vec<Triple> = iter.collect();
        v.sort();
        v
    }

    #[test]
    fn test_match_every_shape() {
        let store = sample_store();
        assert_eq!(store.size(), 4);
        assert_eq!(sorted(store.match_pattern(None, None, None)).len(), 4);
        assert_eq!(
            sorted(store.match_pattern(Some(1), Some(10), None)),
            vec![Triple::new(1, 10, 2), Triple::new(1, 10, 3)]
        );
        assert_eq!(
            sorted(store.match_pattern(None, Some(10), Some(3))),
            vec![Triple::new(1, 10, 3)]
        );
        assert_eq!(
            sorted(store.match_pattern(Some(2), None, Some(3))),
            vec![Triple::new(2, 11, 3)]
        );
        assert_eq!(sorted(store.match_pattern(None, None, Some(3))).len(), 2);
        assert_eq!(sorted(store.match_pattern(None, Some(10), None)).len(), 3);
        assert_eq!(sorted(store.match_pattern(Some(3), None, None)).len(), 1);
        assert_eq!(sorted(store.match_pattern(Some(3), Some(10), Some(1))).len(), 1);
        assert!(sorted(store.match_pattern(Some(3), Some(11), Some(1))).is_empty());
    }

    #[test]
    fn test_insert_is_idempotent_and_remove_cleans_up() {
        let mut store = sample_store();
        assert!(!store.insert(Triple::new(1, 10, 2)));
        assert!(store.remove(&Triple::new(2, 11, 3)));
        assert!(!store.remove(&Triple::new(2, 11, 3)));
        assert_eq!(store.size(), 3);
        assert!(sorted(store.match_pattern(None, Some(11), None)).is_empty());
    }

    #[test]
    fn test_bulk_build_deduplicates() {
        let triples: Vec<Triple> = (0..25_000).map(|i| Triple::new(i % 100, 1, i % 7)).collect();
        let store = MemoryStore::from_triples(&triples);
        assert_eq!(store.size(), 700);
    }
}
