/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Decomposed basic graph patterns.
//!
//! An [`IndexPattern`] is the original BGP plus the ordered list of
//! [`IndexSubPattern`]s it was split into. Every triple of the BGP belongs to
//! exactly one sub-pattern.

pub mod decomposer;

pub use decomposer::{decompose, Decomposer};

use crate::error::Result;
use crate::execution::generic::{errors_only, nested_loop, querier_loop};
use crate::execution::{BindingStream, ExecutionContext};
use crate::index::{PatternQuerier, PropertyFunctionInstance};
use crate::optimizer::order_triples;
use crate::selectivity::estimate_pattern;
use log::trace;
use rustc_hash::{FxHashMap, FxHashSet};
use shared::binding::Binding;
use shared::terms::{pattern_variables, TriplePattern};
use std::fmt;
use std::sync::Arc;

/// Triples matched by the store, or by a pattern querier when one claimed them.
#[derive(Clone)]
pub struct BgpSubPattern {
    pub triples: Vec<TriplePattern>,
    pub querier: Option<Arc<dyn PatternQuerier>>,
}

impl fmt::Debug for BgpSubPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BgpSubPattern")
            .field("triples", &self.triples)
            .field("querier", &self.querier.as_ref().map(|q| q.name()))
            .finish()
    }
}

/// Triples matched inside one named graph.
#[derive(Debug, Clone)]
pub struct GraphSubPattern {
    pub graph: u32,
    pub triples: Vec<TriplePattern>,
}

#[derive(Debug)]
pub enum IndexSubPattern {
    GenericBgp(BgpSubPattern),
    PropertyFunction(Box<dyn PropertyFunctionInstance>),
    EstimablePropertyFunction(Box<dyn PropertyFunctionInstance>),
    GraphScoped(GraphSubPattern),
}

impl IndexSubPattern {
    pub fn generic(triples: Vec<TriplePattern>) -> Self {
        IndexSubPattern::GenericBgp(BgpSubPattern {
            triples,
            querier: None,
        })
    }

    pub fn triples(&self) -> &[TriplePattern] {
        match self {
            IndexSubPattern::GenericBgp(bgp) => &bgp.triples,
            IndexSubPattern::GraphScoped(graph) => &graph.triples,
            IndexSubPattern::PropertyFunction(pf) | IndexSubPattern::EstimablePropertyFunction(pf) => {
                pf.covering()
            }
        }
    }

    /// Variables bound by this sub-pattern's output.
    pub fn variables(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        for triple in self.triples() {
            for v in pattern_variables(triple) {
                if !vars.iter().any(|known| known == v) {
                    vars.push(v.to_string());
                }
            }
        }
        vars
    }

    pub fn supports_estimate(&self) -> bool {
        match self {
            IndexSubPattern::EstimablePropertyFunction(_) => true,
            IndexSubPattern::GenericBgp(bgp) => bgp.querier.is_some(),
            IndexSubPattern::PropertyFunction(_) | IndexSubPattern::GraphScoped(_) => false,
        }
    }

    pub fn estimate(&self) -> Option<u64> {
        match self {
            IndexSubPattern::EstimablePropertyFunction(pf) => pf.estimate(),
            IndexSubPattern::GenericBgp(BgpSubPattern {
                triples,
                querier: Some(querier),
            }) => {
                let empty = Binding::new();
                Some(
                    triples
                        .iter()
                        .map(|t| querier.estimate(t, &empty))
                        .fold(0u64, u64::saturating_add),
                )
            }
            _ => None,
        }
    }

    /// Adds this sub-pattern as a stage after `input`. `bound` holds the
    /// variables every incoming binding is guaranteed to carry.
    pub fn evaluate<'a>(
        &'a self,
        input: BindingStream<'a>,
        bound: &FxHashSet<String>,
        ctx: &'a ExecutionContext<'a>,
    ) -> Result<BindingStream<'a>> {
        match self {
            IndexSubPattern::GenericBgp(BgpSubPattern { triples, querier: None }) => {
                let order = order_triples(ctx.config.optimizer, triples, bound, ctx.stats, ctx.kb_size())?;
                trace!(
                    "generic stage order {:?}, about {:.0} rows per input binding",
                    order,
                    estimate_pattern(&ordered(triples, &order), bound, ctx.stats)
                );
                Ok(nested_loop(triples, order, ctx.dataset.default_graph(), input))
            }
            IndexSubPattern::GenericBgp(BgpSubPattern {
                triples,
                querier: Some(querier),
            }) => Ok(querier_loop(triples, querier.as_ref(), input)),
            IndexSubPattern::GraphScoped(GraphSubPattern { graph, triples }) => {
                match ctx.dataset.named_graph(*graph) {
                    Some(source) => {
                        let order = order_triples(ctx.config.optimizer, triples, bound, ctx.stats, source.size())?;
                        Ok(nested_loop(triples, order, source, input))
                    }
                    None => Ok(errors_only(input)),
                }
            }
            IndexSubPattern::PropertyFunction(pf) | IndexSubPattern::EstimablePropertyFunction(pf) => {
                let pf: &'a dyn PropertyFunctionInstance = pf.as_ref();
                Ok(Box::new(input.flat_map(move |item| -> BindingStream<'a> {
                    match item {
                        Ok(binding) => pf.evaluate(binding, ctx),
                        Err(e) => Box::new(std::iter::once(Err(e))),
                    }
                })))
            }
        }
    }
}

fn ordered(triples: &[TriplePattern], order: &[usize]) -> Vec<TriplePattern> {
    order.iter().map(|&i| triples[i].clone()).collect()
}

#[derive(Debug, Default)]
pub struct IndexPattern {
    triples: Vec<TriplePattern>,
    sub_patterns: Vec<IndexSubPattern>,
}

impl IndexPattern {
    pub fn new(triples: Vec<TriplePattern>, sub_patterns: Vec<IndexSubPattern>) -> Self {
        IndexPattern {
            triples,
            sub_patterns,
        }
    }

    pub fn triples(&self) -> &[TriplePattern] {
        &self.triples
    }

    pub fn sub_patterns(&self) -> &[IndexSubPattern] {
        &self.sub_patterns
    }

    /// True when the sub-patterns cover the BGP's triples exactly once each.
    pub fn verify_coverage(&self) -> bool {
        let mut counts: FxHashMap<&TriplePattern, i64> = FxHashMap::default();
        for triple in &self.triples {
            *counts.entry(triple).or_insert(0) += 1;
        }
        for sub_pattern in &self.sub_patterns {
            for triple in sub_pattern.triples() {
                *counts.entry(triple).or_insert(0) -= 1;
            }
        }
        counts.values().all(|&c| c == 0)
    }
}
