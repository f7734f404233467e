/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::error::{Error, Result};
use crate::store::TripleSource;
use crate::temporal::extent::{parse_extent, Endpoint, TemporalExtent, TemporalInstant};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use shared::dictionary::Dictionary;
use shared::vocab::{AS_INTERVAL, TIME_IN_XSD_DATE_TIME_STAMP};
use std::collections::BTreeSet;
use std::ops::Bound;

pub type ExtentIter<'a> = Box<dyn Iterator<Item = TemporalExtent> + 'a>;

/// In-memory temporal index: an ordered set of endpoint instants plus the
/// node <-> extent maps.
///
/// A node holds at most one extent. Adding a second extent for the same node
/// replaces the first, so a node with several temporal literals in the store
/// keeps the last one read.
#[derive(Debug, Default, Clone)]
pub struct MemoryTemporalIndex {
    endpoints: BTreeSet<TemporalInstant>,
    extent_nodes: FxHashMap<TemporalExtent, Vec<u32>>,
    node_extents: FxHashMap<u32, TemporalExtent>,
}

impl MemoryTemporalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes the temporal literals of `store`: instants through
    /// `time:inXSDDateTimeStamp`, intervals through the interval predicate.
    pub fn build_from_store(store: &dyn TripleSource, dictionary: &Dictionary) -> Result<Self> {
        let mut index = MemoryTemporalIndex::new();
        for predicate in [TIME_IN_XSD_DATE_TIME_STAMP, AS_INTERVAL] {
            let Some(predicate_id) = dictionary.get_id(predicate) else {
                continue;
            };
            for triple in store.match_pattern(None, Some(predicate_id), None) {
                let (lexical, datatype) = dictionary.literal(triple.object).ok_or_else(|| {
                    Error::Literal(format!("object of {} is not a literal", dictionary.decode_triple(&triple)))
                })?;
                let extent = parse_extent(lexical, datatype)?;
                if let Some(previous) = index.add(triple.subject, extent) {
                    warn!(
                        "node {} already had extent {:?}, keeping {:?}",
                        dictionary.decode(triple.subject).unwrap_or("?"),
                        previous,
                        extent
                    );
                }
            }
        }
        debug!("temporal index built: {} nodes, {} endpoints", index.size(), index.endpoints.len());
        Ok(index)
    }

    /// Sets the extent of `node`, returning the one it replaced.
    pub fn add(&mut self, node: u32, extent: TemporalExtent) -> Option<TemporalExtent> {
        let previous = self.remove(node);
        self.node_extents.insert(node, extent);
        let nodes = self.extent_nodes.entry(extent).or_default();
        if nodes.is_empty() {
            self.endpoints.extend(extent.endpoints());
        }
        nodes.push(node);
        previous
    }

    pub fn remove(&mut self, node: u32) -> Option<TemporalExtent> {
        let extent = self.node_extents.remove(&node)?;
        if let Some(nodes) = self.extent_nodes.get_mut(&extent) {
            nodes.retain(|&n| n != node);
            if nodes.is_empty() {
                self.extent_nodes.remove(&extent);
                for endpoint in extent.endpoints() {
                    self.endpoints.remove(&endpoint);
                }
            }
        }
        Some(extent)
    }

    pub fn extent_of(&self, node: u32) -> Option<TemporalExtent> {
        self.node_extents.get(&node).copied()
    }

    pub fn nodes_with(&self, extent: &TemporalExtent) -> &[u32] {
        self.extent_nodes.get(extent).map(|nodes| nodes.as_slice()).unwrap_or(&[])
    }

    /// Number of indexed nodes.
    pub fn size(&self) -> u64 {
        self.node_extents.len() as u64
    }

    /// Every distinct extent, in endpoint order of their starts.
    pub fn extents(&self) -> ExtentIter<'_> {
        self.scan(Endpoint::Start, Bound::Unbounded, Bound::Unbounded)
    }

    /// Extents whose `endpoint` lies in the given time range. A free instant
    /// counts as both its own start and end.
    pub fn scan(&self, endpoint: Endpoint, lower: Bound<i64>, upper: Bound<i64>) -> ExtentIter<'_> {
        let lo = match lower {
            Bound::Included(t) => Bound::Included(TemporalInstant::lowest_at(t)),
            Bound::Excluded(t) => match t.checked_add(1) {
                Some(next) => Bound::Included(TemporalInstant::lowest_at(next)),
                None => return Box::new(std::iter::empty()),
            },
            Bound::Unbounded => Bound::Unbounded,
        };
        let hi = match upper {
            Bound::Included(t) => match t.checked_add(1) {
                Some(next) => Bound::Excluded(TemporalInstant::lowest_at(next)),
                None => Bound::Unbounded,
            },
            Bound::Excluded(t) => Bound::Excluded(TemporalInstant::lowest_at(t)),
            Bound::Unbounded => Bound::Unbounded,
        };
        if is_empty_range(&lo, &hi) {
            return Box::new(std::iter::empty());
        }
        Box::new(
            self.endpoints
                .range((lo, hi))
                .filter(move |instant| match instant.parent() {
                    Some((_, e)) => e == endpoint,
                    None => true,
                })
                .map(|instant| instant.owner()),
        )
    }

    pub fn before_start(&self, t: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::Start, Bound::Unbounded, Bound::Excluded(t))
    }

    pub fn before_start_inclusive(&self, t: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::Start, Bound::Unbounded, Bound::Included(t))
    }

    pub fn after_start(&self, t: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::Start, Bound::Excluded(t), Bound::Unbounded)
    }

    pub fn after_start_inclusive(&self, t: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::Start, Bound::Included(t), Bound::Unbounded)
    }

    pub fn before_finish(&self, t: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::End, Bound::Unbounded, Bound::Excluded(t))
    }

    pub fn before_finish_inclusive(&self, t: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::End, Bound::Unbounded, Bound::Included(t))
    }

    pub fn after_finish(&self, t: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::End, Bound::Excluded(t), Bound::Unbounded)
    }

    pub fn after_finish_inclusive(&self, t: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::End, Bound::Included(t), Bound::Unbounded)
    }

    pub fn at_start(&self, t: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::Start, Bound::Included(t), Bound::Included(t))
    }

    pub fn at_finish(&self, t: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::End, Bound::Included(t), Bound::Included(t))
    }

    /// Extents starting strictly between `from` and `to`.
    pub fn between_starts(&self, from: i64, to: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::Start, Bound::Excluded(from), Bound::Excluded(to))
    }

    /// Extents finishing strictly between `from` and `to`.
    pub fn between_finishes(&self, from: i64, to: i64) -> ExtentIter<'_> {
        self.scan(Endpoint::End, Bound::Excluded(from), Bound::Excluded(to))
    }
}

fn is_empty_range(lo: &Bound<TemporalInstant>, hi: &Bound<TemporalInstant>) -> bool {
    match (lo, hi) {
        (Bound::Included(a), Bound::Included(b)) => a > b,
        (Bound::Included(a), Bound::Excluded(b))
        | (Bound::Excluded(a), Bound::Included(b))
        | (Bound::Excluded(a), Bound::Excluded(b)) => a >= b,
        _ => false,
    }
}
