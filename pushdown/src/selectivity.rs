/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Cardinality estimates for triples and conjunctions of triples.

use crate::stats::DatabaseStats;
use rustc_hash::FxHashSet;
use shared::terms::{pattern_variables, Term, TriplePattern};

#[derive(Clone, Copy)]
enum Position {
    Subject,
    Predicate,
    Object,
}

fn constant_cardinality(stats: &DatabaseStats, position: Position, id: u32) -> u64 {
    match position {
        Position::Subject => stats.get_subject_cardinality(id),
        Position::Predicate => stats.get_predicate_cardinality(id),
        Position::Object => stats.get_object_cardinality(id),
    }
}

fn distinct_values(stats: &DatabaseStats, position: Position) -> u64 {
    match position {
        Position::Subject => stats.distinct_subjects(),
        Position::Predicate => stats.distinct_predicates(),
        Position::Object => stats.distinct_objects(),
    }
}

/// Expected matches of `pattern` for one assignment of the `bound` variables.
pub fn estimate_triple(
    pattern: &TriplePattern,
    bound: &FxHashSet<String>,
    stats: &DatabaseStats,
) -> f64 {
    let total = stats.total_triples as f64;
    if total == 0.0 {
        return 0.0;
    }

    let mut estimate = total;
    let mut seen: Vec<&str> = Vec::with_capacity(3);
    let positions = [
        (Position::Subject, &pattern.0),
        (Position::Predicate, &pattern.1),
        (Position::Object, &pattern.2),
    ];
    for (position, term) in positions {
        match term {
            Term::Constant(id) => {
                estimate *= constant_cardinality(stats, position, *id) as f64 / total;
            }
            Term::Variable(name) => {
                if bound.contains(name) || seen.contains(&name.as_str()) {
                    estimate /= distinct_values(stats, position).max(1) as f64;
                } else {
                    seen.push(name);
                }
            }
        }
    }
    estimate
}

/// Expected rows of a conjunction evaluated left to right, starting from
/// the `bound` variables.
pub fn estimate_pattern(
    triples: &[TriplePattern],
    bound: &FxHashSet<String>,
    stats: &DatabaseStats,
) -> f64 {
    let mut bound = bound.clone();
    let mut rows = 1.0;
    for triple in triples {
        rows *= estimate_triple(triple, &bound, stats);
        bound.extend(pattern_variables(triple).into_iter().map(str::to_string));
    }
    rows
}
