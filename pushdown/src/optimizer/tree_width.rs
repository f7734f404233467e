/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Tree-decomposition join ordering.
//!
//! Triples become hyperedges ([`Constraint`]s) over variable indices, each
//! weighted by the number of rows it can produce. [`TreeWidthQueryOptimizer`]
//! builds an elimination order greedily, at every step committing the
//! constraint that keeps the estimated intermediate width smallest.
//!
//! ## Width
//!
//! [`TreeWidthEstimator`] keeps a running intermediate cardinality `card`
//! (1 on an empty stack) and an upper bound `dom(v)` on the distinct values
//! of every variable already touched. Pushing constraint `c` over variables
//! `V` with maximum product `m` gives
//!
//! ```text
//! card' = card * m / Π max(dom(v), m)   for v in V with a known dom(v)
//! dom(v) = min(dom(v), m)               for v in V
//! ```
//!
//! so a constraint joining on already-restricted variables adds little width,
//! and an unconnected one multiplies it by `m`. Push and pop cost `O(|V|)`.

use crate::error::{Error, Result};
use crate::selectivity::estimate_triple;
use crate::stats::DatabaseStats;
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use shared::terms::{pattern_variables, TriplePattern};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub variables: Vec<usize>,
    pub maximum_product: u64,
}

impl Constraint {
    pub fn new(variables: Vec<usize>, maximum_product: u64) -> Self {
        let mut variables = variables;
        variables.sort_unstable();
        variables.dedup();
        Constraint {
            variables,
            maximum_product,
        }
    }

    fn validate(&self, num_variables: usize) -> Result<()> {
        match self.variables.iter().find(|&&v| v >= num_variables) {
            Some(&variable) => Err(Error::VariableOutOfRange {
                variable,
                num_variables,
            }),
            None => Ok(()),
        }
    }
}

struct Frame {
    card: f64,
    saved_domains: Vec<(usize, Option<f64>)>,
}

pub struct TreeWidthEstimator {
    num_variables: usize,
    domains: Vec<Option<f64>>,
    card: f64,
    frames: Vec<Frame>,
}

impl TreeWidthEstimator {
    pub fn new(num_variables: usize) -> Self {
        TreeWidthEstimator {
            num_variables,
            domains: vec![None; num_variables],
            card: 1.0,
            frames: Vec::new(),
        }
    }

    pub fn push(&mut self, constraint: &Constraint) -> Result<()> {
        constraint.validate(self.num_variables)?;

        let m = constraint.maximum_product as f64;
        let mut divisor = 1.0;
        let mut saved_domains = Vec::with_capacity(constraint.variables.len());
        for &v in &constraint.variables {
            let previous = self.domains[v];
            if let Some(dom) = previous {
                divisor *= dom.max(m);
            }
            saved_domains.push((v, previous));
            self.domains[v] = Some(previous.map_or(m, |dom| dom.min(m)));
        }

        self.frames.push(Frame {
            card: self.card,
            saved_domains,
        });
        self.card = if divisor > 0.0 { self.card * m / divisor } else { 0.0 };
        Ok(())
    }

    /// Undoes the last push. Returns false on an empty stack.
    pub fn pop(&mut self) -> bool {
        match self.frames.pop() {
            Some(frame) => {
                for (v, previous) in frame.saved_domains.into_iter().rev() {
                    self.domains[v] = previous;
                }
                self.card = frame.card;
                true
            }
            None => false,
        }
    }

    pub fn calculate_width(&self) -> f64 {
        self.card
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

pub struct TreeWidthQueryOptimizer {
    estimator: TreeWidthEstimator,
    constraints: Vec<Constraint>,
}

impl TreeWidthQueryOptimizer {
    /// Fixed constraints are pushed once and stay active for the whole run.
    pub fn new(
        num_variables: usize,
        fixed_constraints: &[Constraint],
        constraints: Vec<Constraint>,
    ) -> Result<Self> {
        for constraint in &constraints {
            constraint.validate(num_variables)?;
        }
        let mut estimator = TreeWidthEstimator::new(num_variables);
        for fixed in fixed_constraints {
            estimator.push(fixed)?;
        }
        Ok(TreeWidthQueryOptimizer {
            estimator,
            constraints,
        })
    }

    pub fn optimize_constraints(mut self) -> Result<Vec<usize>> {
        let mut result: Vec<usize> = Vec::with_capacity(self.constraints.len());
        let mut placed = vec![false; self.constraints.len()];

        while result.len() < self.constraints.len() {
            let mut best: Option<(usize, f64)> = None;
            for (index, constraint) in self.constraints.iter().enumerate() {
                if placed[index] {
                    continue;
                }
                self.estimator.push(constraint)?;
                let width = self.estimator.calculate_width();
                self.estimator.pop();
                if best.map_or(true, |(_, min)| width < min) {
                    best = Some((index, width));
                }
            }
            let Some((index, width)) = best else { break };
            debug!("tree-width step {}: constraint {} (width {:.3})", result.len(), index, width);
            self.estimator.push(&self.constraints[index])?;
            placed[index] = true;
            result.push(index);
        }
        Ok(result)
    }
}

/// Orders generic triples by building one constraint per triple, with
/// upstream-bound variables as fixed single-row constraints.
pub struct TreeWidthOptimizer<'a> {
    stats: &'a DatabaseStats,
}

impl<'a> TreeWidthOptimizer<'a> {
    pub fn new(stats: &'a DatabaseStats) -> Self {
        TreeWidthOptimizer { stats }
    }

    pub fn order(&self, bgp: &[TriplePattern], bound: &FxHashSet<String>) -> Result<Vec<usize>> {
        let mut indices: FxHashMap<&str, usize> = FxHashMap::default();
        let mut constraints = Vec::with_capacity(bgp.len());
        let unbound = FxHashSet::default();

        for triple in bgp {
            let vars = pattern_variables(triple)
                .into_iter()
                .map(|name| {
                    let next = indices.len();
                    *indices.entry(name).or_insert(next)
                })
                .collect();
            let rows = estimate_triple(triple, &unbound, self.stats).max(1.0).ceil() as u64;
            constraints.push(Constraint::new(vars, rows));
        }

        let fixed: Vec<Constraint> = indices
            .iter()
            .filter(|(name, _)| bound.contains(**name))
            .map(|(_, &v)| Constraint::new(vec![v], 1))
            .collect();

        TreeWidthQueryOptimizer::new(indices.len(), &fixed, constraints)?.optimize_constraints()
    }
}
