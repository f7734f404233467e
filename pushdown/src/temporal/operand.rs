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
use crate::temporal::extent::{parse_extent, TemporalExtent};
use crate::temporal::index::MemoryTemporalIndex;
use shared::binding::Binding;
use shared::dictionary::Dictionary;
use shared::terms::{Term, TriplePattern};
use shared::vocab::{AS_INTERVAL, TIME_IN_XSD_DATE_TIME_STAMP};
use std::sync::Arc;

/// Resolves BGP nodes to temporal extents: from the index for stored nodes,
/// from the literal itself for literal constants, and from defining
/// `(node, instant|interval predicate, literal)` triples in the pattern.
pub struct TemporalOperandFactory {
    index: Arc<MemoryTemporalIndex>,
    dictionary: Arc<Dictionary>,
    defining_predicates: Vec<u32>,
}

impl TemporalOperandFactory {
    pub fn new(index: Arc<MemoryTemporalIndex>, dictionary: Arc<Dictionary>) -> Self {
        let defining_predicates = [TIME_IN_XSD_DATE_TIME_STAMP, AS_INTERVAL]
            .iter()
            .filter_map(|iri| dictionary.get_id(iri))
            .collect();
        TemporalOperandFactory {
            index,
            dictionary,
            defining_predicates,
        }
    }

    /// Extent of a literal id, `None` for non-literals and unparseable ones.
    pub fn literal_extent(&self, id: u32) -> Option<TemporalExtent> {
        let (lexical, datatype) = self.dictionary.literal(id)?;
        parse_extent(lexical, datatype).ok()
    }

    fn defining_triples(&self, root: &Term, pattern: &[TriplePattern]) -> Vec<(TriplePattern, TemporalExtent)> {
        pattern
            .iter()
            .filter(|(s, p, _)| {
                s == root && p.as_constant().map_or(false, |id| self.defining_predicates.contains(&id))
            })
            .filter_map(|triple| {
                let extent = self.literal_extent(triple.2.as_constant()?)?;
                Some((triple.clone(), extent))
            })
            .collect()
    }

    fn known_extent(&self, id: u32) -> Option<TemporalExtent> {
        self.index.extent_of(id).or_else(|| self.literal_extent(id))
    }
}

impl OperandFactory<TemporalExtent> for TemporalOperandFactory {
    fn create_operand(
        &self,
        root: &Term,
        pattern: &[TriplePattern],
        binding: &Binding,
    ) -> Option<Operand<TemporalExtent>> {
        let defining = self.defining_triples(root, pattern);
        let defined = match defining.first() {
            Some((_, first)) if defining.iter().all(|(_, e)| e == first) => Some(*first),
            // conflicting definitions can never hold together
            Some(_) => return None,
            None => None,
        };
        let triples: Vec<TriplePattern> = defining.into_iter().map(|(t, _)| t).collect();

        match root.resolve(binding) {
            Some(id) => {
                let known = self.known_extent(id)?;
                if defined.map_or(true, |d| d == known) {
                    Some(Operand::new(root.clone(), Some(known), triples))
                } else {
                    None
                }
            }
            None => Some(Operand::new(root.clone(), defined, triples)),
        }
    }

    fn create_operand_from_binding(&self, root: &Term, binding: &Binding) -> Option<Operand<TemporalExtent>> {
        match root.resolve(binding) {
            Some(id) => self
                .known_extent(id)
                .map(|extent| Operand::new(root.clone(), Some(extent), Vec::new())),
            None => Some(Operand::unbound(root.clone())),
        }
    }
}
