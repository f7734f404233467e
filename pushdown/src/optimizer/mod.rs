/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Join-order optimizers for generic triples.
//!
//! Two interchangeable strategies produce a permutation of triple indices:
//!
//! - `greedy`: a one-step cost oracle ([`CompiledQuery`]) driven by
//!   [`GreedyOptimizer`], with costs in "candidate subjects"
//! - `tree_width`: greedy elimination over the constraint hypergraph
//!   ([`TreeWidthQueryOptimizer`]) with selectivity-weighted hyperedges
//!
//! [`order_triples`] picks one according to [`OptimizerKind`].

pub mod greedy;
pub mod tree_width;

pub use greedy::{BindState, CompiledQuery, GreedyOptimizer, UsageSet};
pub use tree_width::{Constraint, TreeWidthEstimator, TreeWidthOptimizer, TreeWidthQueryOptimizer};

use crate::config::OptimizerKind;
use crate::error::Result;
use crate::stats::DatabaseStats;
use rustc_hash::FxHashSet;
use shared::terms::TriplePattern;

pub fn order_triples(
    kind: OptimizerKind,
    triples: &[TriplePattern],
    bound: &FxHashSet<String>,
    stats: &DatabaseStats,
    kb_size: u64,
) -> Result<Vec<usize>> {
    match kind {
        OptimizerKind::Greedy => Ok(GreedyOptimizer::new(kb_size).order(triples, bound)),
        OptimizerKind::TreeWidth => TreeWidthOptimizer::new(stats).order(triples, bound),
    }
}
