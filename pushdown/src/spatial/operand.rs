/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::index::{Operand, OperandFactory};
use crate::spatial::geometry::literal_geometry;
use crate::spatial::index::MemorySpatialIndex;
use geo::Geometry;
use shared::binding::Binding;
use shared::dictionary::Dictionary;
use shared::terms::{Term, TriplePattern};
use shared::vocab::GEO_AS_WKT;
use std::sync::Arc;

/// Resolves BGP nodes to geometries: stored nodes through the index, WKT
/// literal constants by parsing them, and variables through a defining
/// `(node, geo:asWKT, literal)` triple in the pattern.
pub struct SpatialOperandFactory {
    index: Arc<MemorySpatialIndex>,
    dictionary: Arc<Dictionary>,
    as_wkt: Option<u32>,
}

impl SpatialOperandFactory {
    pub fn new(index: Arc<MemorySpatialIndex>, dictionary: Arc<Dictionary>) -> Self {
        let as_wkt = dictionary.get_id(GEO_AS_WKT);
        SpatialOperandFactory {
            index,
            dictionary,
            as_wkt,
        }
    }

    /// Geometry of a literal id, `None` unless it is a parseable WKT literal.
    pub fn literal_geometry(&self, id: u32) -> Option<Geometry<f64>> {
        let (lexical, datatype) = self.dictionary.literal(id)?;
        literal_geometry(lexical, datatype)?.ok()
    }

    fn defining_triples(&self, root: &Term, pattern: &[TriplePattern]) -> Vec<(TriplePattern, Geometry<f64>)> {
        let Some(as_wkt) = self.as_wkt else {
            return Vec::new();
        };
        pattern
            .iter()
            .filter(|(s, p, _)| s == root && p.as_constant() == Some(as_wkt))
            .filter_map(|triple| {
                let geometry = self.literal_geometry(triple.2.as_constant()?)?;
                Some((triple.clone(), geometry))
            })
            .collect()
    }

    fn known_geometry(&self, id: u32) -> Option<Geometry<f64>> {
        self.index.geometry_of(id).cloned().or_else(|| self.literal_geometry(id))
    }
}

impl OperandFactory<Geometry<f64>> for SpatialOperandFactory {
    fn create_operand(&self, root: &Term, pattern: &[TriplePattern], binding: &Binding) -> Option<Operand<Geometry<f64>>> {
        let mut triples = Vec::new();
        let mut defined: Option<Geometry<f64>> = None;
        for (triple, geometry) in self.defining_triples(root, pattern) {
            match &defined {
                // a node cannot hold two different geometries
                Some(first) if *first != geometry => return None,
                Some(_) => {}
                None => defined = Some(geometry),
            }
            triples.push(triple);
        }

        match root.resolve(binding) {
            Some(id) => {
                let known = self.known_geometry(id)?;
                if defined.map_or(true, |d| d == known) {
                    Some(Operand::new(root.clone(), Some(known), triples))
                } else {
                    None
                }
            }
            None => Some(Operand::new(root.clone(), defined, triples)),
        }
    }

    fn create_operand_from_binding(&self, root: &Term, binding: &Binding) -> Option<Operand<Geometry<f64>>> {
        match root.resolve(binding) {
            Some(id) => self
                .known_geometry(id)
                .map(|geometry| Operand::new(root.clone(), Some(geometry), Vec::new())),
            None => Some(Operand::unbound(root.clone())),
        }
    }
}
