/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::config::PlannerConfig;
use crate::store::TripleSource;
use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use shared::triple::Triple;

/// Per-position cardinality statistics used by the selectivity model.
/// Read-only once gathered, so one instance can back many concurrent plans.
#[derive(Debug, Clone, Default)]
pub struct DatabaseStats {
    pub total_triples: u64,
    pub predicate_cardinalities: FxHashMap<u32, u64>,
    pub subject_cardinalities: FxHashMap<u32, u64>,
    pub object_cardinalities: FxHashMap<u32, u64>,
}

#[derive(Default)]
struct Counts {
    subjects: FxHashMap<u32, u64>,
    predicates: FxHashMap<u32, u64>,
    objects: FxHashMap<u32, u64>,
}

impl Counts {
    fn add(mut self, triple: &Triple) -> Self {
        *self.subjects.entry(triple.subject).or_insert(0) += 1;
        *self.predicates.entry(triple.predicate).or_insert(0) += 1;
        *self.objects.entry(triple.object).or_insert(0) += 1;
        self
    }

    fn merge(mut self, other: Counts) -> Self {
        for (k, v) in other.subjects {
            *self.subjects.entry(k).or_insert(0) += v;
        }
        for (k, v) in other.predicates {
            *self.predicates.entry(k).or_insert(0) += v;
        }
        for (k, v) in other.objects {
            *self.objects.entry(k).or_insert(0) += v;
        }
        self
    }
}

impl DatabaseStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// [`DatabaseStats::gather`] with the configured sample cap.
    pub fn gather_with(source: &dyn TripleSource, config: &PlannerConfig) -> Self {
        Self::gather(source, config.stats_sample_size)
    }

    /// Gathers statistics from a store, sampling at most `sample_size`
    /// triples and scaling counts back up.
    pub fn gather(source: &dyn TripleSource, sample_size: usize) -> Self {
        let total_triples = source.size();
        let sample_size = sample_size.max(1);
        let step = if total_triples > sample_size as u64 {
            (total_triples / sample_size as u64) as usize
        } else {
            1
        };

        let sampled: Vec<Triple> = source
            .match_pattern(None, None, None)
            .step_by(step)
            .take(sample_size)
            .collect();

        let counts = sampled
            .par_iter()
            .fold(Counts::default, |acc, triple| acc.add(triple))
            .reduce(Counts::default, Counts::merge);

        let scale = step as u64;
        let scale_map = |mut map: FxHashMap<u32, u64>| {
            if scale > 1 {
                map.values_mut().for_each(|v| *v *= scale);
            }
            map
        };

        debug!(
            "gathered stats over {} of {} triples (step {})",
            sampled.len(),
            total_triples,
            step
        );

        Self {
            total_triples,
            predicate_cardinalities: scale_map(counts.predicates),
            subject_cardinalities: scale_map(counts.subjects),
            object_cardinalities: scale_map(counts.objects),
        }
    }

    pub fn get_predicate_cardinality(&self, predicate: u32) -> u64 {
        self.predicate_cardinalities.get(&predicate).copied().unwrap_or(0)
    }

    pub fn get_subject_cardinality(&self, subject: u32) -> u64 {
        self.subject_cardinalities.get(&subject).copied().unwrap_or(0)
    }

    pub fn get_object_cardinality(&self, object: u32) -> u64 {
        self.object_cardinalities.get(&object).copied().unwrap_or(0)
    }

    pub fn distinct_subjects(&self) -> u64 {
        self.subject_cardinalities.len() as u64
    }

    pub fn distinct_predicates(&self) -> u64 {
        self.predicate_cardinalities.len() as u64
    }

    pub fn distinct_objects(&self) -> u64 {
        self.object_cardinalities.len() as u64
    }

    /// Updates statistics with a newly inserted triple
    pub fn update_stats(&mut self, triple: &Triple) {
        self.total_triples += 1;
        *self.predicate_cardinalities.entry(triple.predicate).or_insert(0) += 1;
        *self.subject_cardinalities.entry(triple.subject).or_insert(0) += 1;
        *self.object_cardinalities.entry(triple.object).or_insert(0) += 1;
    }

    /// Removes statistics for a deleted triple
    pub fn remove_stats(&mut self, triple: &Triple) {
        self.total_triples = self.total_triples.saturating_sub(1);
        decrement(&mut self.predicate_cardinalities, triple.predicate);
        decrement(&mut self.subject_cardinalities, triple.subject);
        decrement(&mut self.object_cardinalities, triple.object);
    }
}

fn decrement(map: &mut FxHashMap<u32, u64>, key: u32) {
    if let Some(count) = map.get_mut(&key) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            map.remove(&key);
        }
    }
}
