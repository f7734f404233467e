/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use log::debug;
use rustc_hash::FxHashSet;
use shared::terms::{Term, TriplePattern};

/// Binding-state code of a variable during the greedy search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BindState {
    /// Not touched by any chosen triple yet.
    Unseen = 0,
    /// Appears in a chosen triple, value not yet estimated.
    Pending = 1,
    /// Has a concrete value estimate.
    Estimated = 2,
}

/// Usedness of the triples of one [`CompiledQuery`] during a single ordering run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageSet {
    used: Vec<bool>,
    count: usize,
}

impl UsageSet {
    pub fn new(len: usize) -> Self {
        UsageSet {
            used: vec![false; len],
            count: 0,
        }
    }

    pub fn mark_used(&mut self, index: usize) {
        if !self.used[index] {
            self.used[index] = true;
            self.count += 1;
        }
    }

    pub fn mark_unused(&mut self, index: usize) {
        if self.used[index] {
            self.used[index] = false;
            self.count -= 1;
        }
    }

    pub fn is_used(&self, index: usize) -> bool {
        self.used[index]
    }

    pub fn count_used(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.count == self.used.len()
    }
}

/// A BGP flattened to numeric ids for the greedy cost search.
///
/// Variable positions carry the variable's index (first-appearance order),
/// constant positions carry the dictionary id.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    triples: Vec<[u32; 3]>,
    is_variable: Vec<[bool; 3]>,
    variables: Vec<String>,
    kb_size: f64,
}

impl CompiledQuery {
    pub fn compile(bgp: &[TriplePattern], kb_size: u64) -> Self {
        let mut variables: Vec<String> = Vec::new();
        let mut triples = Vec::with_capacity(bgp.len());
        let mut is_variable = Vec::with_capacity(bgp.len());

        for (s, p, o) in bgp {
            let mut ids = [0u32; 3];
            let mut flags = [false; 3];
            for (pos, term) in [s, p, o].into_iter().enumerate() {
                match term {
                    Term::Constant(id) => ids[pos] = *id,
                    Term::Variable(name) => {
                        let index = match variables.iter().position(|v| v == name) {
                            Some(index) => index,
                            None => {
                                variables.push(name.clone());
                                variables.len() - 1
                            }
                        };
                        ids[pos] = index as u32;
                        flags[pos] = true;
                    }
                }
            }
            triples.push(ids);
            is_variable.push(flags);
        }

        CompiledQuery {
            triples,
            is_variable,
            variables,
            kb_size: kb_size.max(1) as f64,
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn kb_size(&self) -> f64 {
        self.kb_size
    }

    pub fn new_usage(&self) -> UsageSet {
        UsageSet::new(self.triples.len())
    }

    /// Variable indices of triple `index`, deduplicated.
    pub fn triple_variables(&self, index: usize) -> Vec<usize> {
        let mut vars = Vec::with_capacity(3);
        for pos in 0..3 {
            if self.is_variable[index][pos] {
                let v = self.triples[index][pos] as usize;
                if !vars.contains(&v) {
                    vars.push(v);
                }
            }
        }
        vars
    }

    fn get_value(&self, index: usize, pos: usize, values: &[f64], states: &[BindState]) -> f64 {
        let id = self.triples[index][pos];
        if !self.is_variable[index][pos] {
            // zero would wipe out the whole product
            return (id as f64).max(1.0);
        }
        let var = id as usize;
        if states[var] == BindState::Estimated {
            values[var]
        } else {
            self.kb_size
        }
    }

    /// Cost of triple `index`: the subject factor at full scale, predicate
    /// and object factors normalised by the store size.
    pub fn estimate_triple(&self, index: usize, values: &[f64], states: &[BindState]) -> f64 {
        let v0 = self.get_value(index, 0, values, states);
        let v1 = self.get_value(index, 1, values, states);
        let v2 = self.get_value(index, 2, values, states);
        v0 * (v1 / self.kb_size) * (v2 / self.kb_size)
    }

    /// Cheapest unused triple, lowest index on ties; `None` once every triple is used.
    pub fn find_min_query(
        &self,
        usage: &UsageSet,
        values: &[f64],
        states: &[BindState],
    ) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for index in 0..self.triples.len() {
            if usage.is_used(index) {
                continue;
            }
            let cost = self.estimate_triple(index, values, states);
            match best {
                Some((_, best_cost)) if cost >= best_cost || cost.is_nan() => {}
                _ => best = Some((index, cost)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// First unused triple, or 0 when all are used.
    pub fn find_any_query(&self, usage: &UsageSet) -> usize {
        (0..self.triples.len())
            .find(|&index| !usage.is_used(index))
            .unwrap_or(0)
    }
}

/// Orders generic triples with the greedy cost oracle.
pub struct GreedyOptimizer {
    kb_size: u64,
}

impl GreedyOptimizer {
    pub fn new(kb_size: u64) -> Self {
        GreedyOptimizer { kb_size }
    }

    /// Permutation of `bgp` indices. Variables in `bound` are treated as
    /// already carrying a single value.
    pub fn order(&self, bgp: &[TriplePattern], bound: &FxHashSet<String>) -> Vec<usize> {
        let query = CompiledQuery::compile(bgp, self.kb_size);
        let mut usage = query.new_usage();
        let mut values = vec![query.kb_size(); query.variables().len()];
        let mut states = vec![BindState::Unseen; query.variables().len()];

        for (var, name) in query.variables().iter().enumerate() {
            if bound.contains(name) {
                values[var] = 1.0;
                states[var] = BindState::Estimated;
            }
        }

        let mut order = Vec::with_capacity(query.len());
        while !usage.is_complete() {
            let next = query
                .find_min_query(&usage, &values, &states)
                .unwrap_or_else(|| query.find_any_query(&usage));
            usage.mark_used(next);
            order.push(next);

            let vars = query.triple_variables(next);
            for &var in &vars {
                if states[var] == BindState::Unseen {
                    states[var] = BindState::Pending;
                }
            }
            let estimate = query.estimate_triple(next, &values, &states).max(1.0);
            for &var in &vars {
                if states[var] == BindState::Pending {
                    values[var] = estimate;
                    states[var] = BindState::Estimated;
                }
            }
            debug!("greedy step {}: triple {} (estimate {:.3})", order.len(), next, estimate);
        }
        order
    }
}
