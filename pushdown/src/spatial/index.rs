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
use crate::spatial::geometry::{envelope, literal_geometry, Envelope};
use crate::store::TripleSource;
use geo::Geometry;
use log::{debug, warn};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;
use rustc_hash::FxHashMap;
use shared::dictionary::Dictionary;
use shared::vocab::{GEO_AS_WKT, GEO_HAS_GEOMETRY};

type Entry = GeomWithData<Rectangle<[f64; 2]>, u32>;

pub type NodeIter<'a> = Box<dyn Iterator<Item = (u32, &'a Geometry<f64>)> + 'a>;

/// In-memory spatial index: an R*-tree over node bounding boxes plus the
/// node -> geometry map.
///
/// A node holds at most one geometry; adding another replaces it. Empty
/// geometries are kept in the map but have no place in the tree. Nodes read
/// from a `geo:asWKT` triple also remember the literal they came from.
#[derive(Debug, Default, Clone)]
pub struct MemorySpatialIndex {
    tree: RTree<Entry>,
    geometries: FxHashMap<u32, (Geometry<f64>, Option<Envelope>)>,
    serializations: FxHashMap<u32, u32>,
}

impl MemorySpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes the `geo:asWKT` literals of `store`, then gives every
    /// `geo:hasGeometry` subject the geometry of its object.
    pub fn build_from_store(store: &dyn TripleSource, dictionary: &Dictionary) -> Result<Self> {
        let mut index = MemorySpatialIndex::new();
        if let Some(as_wkt) = dictionary.get_id(GEO_AS_WKT) {
            for triple in store.match_pattern(None, Some(as_wkt), None) {
                let geometry = dictionary
                    .literal(triple.object)
                    .and_then(|(lexical, datatype)| literal_geometry(lexical, datatype))
                    .ok_or_else(|| {
                        Error::Literal(format!("object of {} is not a WKT literal", dictionary.decode_triple(&triple)))
                    })??;
                if index.add_serialized(triple.subject, triple.object, geometry).is_some() {
                    warn!("{} has several geometries, keeping the last", dictionary.decode(triple.subject).unwrap_or("?"));
                }
            }
        }
        if let Some(has_geometry) = dictionary.get_id(GEO_HAS_GEOMETRY) {
            for triple in store.match_pattern(None, Some(has_geometry), None) {
                let Some(geometry) = index.geometry_of(triple.object).cloned() else {
                    debug!("{}: geometry without WKT", dictionary.decode_triple(&triple));
                    continue;
                };
                if index.add(triple.subject, geometry).is_some() {
                    warn!("{} has several geometries, keeping the last", dictionary.decode(triple.subject).unwrap_or("?"));
                }
            }
        }
        debug!("spatial index built: {} nodes, {} boxes", index.size(), index.tree.size());
        Ok(index)
    }

    /// Sets the geometry of `node`, returning the one it replaced.
    pub fn add(&mut self, node: u32, geometry: Geometry<f64>) -> Option<Geometry<f64>> {
        let previous = self.remove(node);
        let bbox = envelope(&geometry);
        if let Some(bbox) = bbox {
            self.tree.insert(GeomWithData::new(Rectangle::from(bbox), node));
        }
        self.geometries.insert(node, (geometry, bbox));
        previous
    }

    /// [`MemorySpatialIndex::add`] for a geometry parsed from the WKT literal `literal`.
    pub fn add_serialized(&mut self, node: u32, literal: u32, geometry: Geometry<f64>) -> Option<Geometry<f64>> {
        let previous = self.add(node, geometry);
        self.serializations.insert(node, literal);
        previous
    }

    pub fn remove(&mut self, node: u32) -> Option<Geometry<f64>> {
        self.serializations.remove(&node);
        let (geometry, bbox) = self.geometries.remove(&node)?;
        if let Some(bbox) = bbox {
            self.tree.remove(&GeomWithData::new(Rectangle::from(bbox), node));
        }
        Some(geometry)
    }

    pub fn geometry_of(&self, node: u32) -> Option<&Geometry<f64>> {
        self.geometries.get(&node).map(|(geometry, _)| geometry)
    }

    /// The WKT literal `node`'s geometry was read from, if any.
    pub fn serialization_of(&self, node: u32) -> Option<u32> {
        self.serializations.get(&node).copied()
    }

    /// Number of indexed nodes.
    pub fn size(&self) -> u64 {
        self.geometries.len() as u64
    }

    /// Every indexed node with its geometry.
    pub fn entries(&self) -> NodeIter<'_> {
        Box::new(self.geometries.iter().map(|(&node, (geometry, _))| (node, geometry)))
    }

    /// Nodes whose bounding box intersects `bbox`.
    pub fn intersecting(&self, bbox: &Envelope) -> NodeIter<'_> {
        Box::new(
            self.tree
                .locate_in_envelope_intersecting(bbox)
                .filter_map(|entry| self.geometry_of(entry.data).map(|geometry| (entry.data, geometry))),
        )
    }

    /// Nodes holding exactly `geometry`.
    pub fn nodes_with(&self, geometry: &Geometry<f64>) -> Vec<u32> {
        let candidates = match envelope(geometry) {
            Some(bbox) => self.intersecting(&bbox),
            None => self.entries(),
        };
        let mut nodes: Vec<u32> = candidates
            .filter(|(_, held)| *held == geometry)
            .map(|(node, _)| node)
            .collect();
        nodes.sort_unstable();
        nodes
    }
}
