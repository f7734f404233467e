/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Staged evaluation of an [`IndexPattern`].
//!
//! Every sub-pattern becomes one stage that consumes the upstream binding
//! stream and yields extended bindings, so the whole pipeline is a lazy
//! nested loop pulled one binding at a time. Nothing runs until the first
//! call to `next`, and dropping or closing the iterator releases every stage.

pub mod generic;

use crate::config::PlannerConfig;
use crate::error::Result;
use crate::pattern::IndexPattern;
use crate::stats::DatabaseStats;
use crate::store::Dataset;
use log::debug;
use rustc_hash::FxHashSet;
use shared::binding::Binding;

pub use generic::from_bindings;

pub type BindingStream<'a> = Box<dyn Iterator<Item = Result<Binding>> + 'a>;

/// Everything a stage may consult while evaluating.
pub struct ExecutionContext<'a> {
    pub dataset: &'a Dataset,
    pub stats: &'a DatabaseStats,
    pub config: &'a PlannerConfig,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(dataset: &'a Dataset, stats: &'a DatabaseStats, config: &'a PlannerConfig) -> Self {
        ExecutionContext {
            dataset,
            stats,
            config,
        }
    }

    pub fn kb_size(&self) -> u64 {
        self.config
            .kb_size
            .unwrap_or_else(|| self.dataset.default_graph().size())
    }
}

pub struct IndexPatternIterator<'a> {
    stream: Option<BindingStream<'a>>,
    stages: usize,
}

impl<'a> IndexPatternIterator<'a> {
    pub fn new(
        pattern: &'a IndexPattern,
        input: BindingStream<'a>,
        ctx: &'a ExecutionContext<'a>,
    ) -> Result<Self> {
        Self::with_bound_variables(pattern, input, &FxHashSet::default(), ctx)
    }

    /// Like [`IndexPatternIterator::new`] when every input binding is known
    /// to bind `bound`, which lets the first stages plan around them.
    pub fn with_bound_variables(
        pattern: &'a IndexPattern,
        input: BindingStream<'a>,
        bound: &FxHashSet<String>,
        ctx: &'a ExecutionContext<'a>,
    ) -> Result<Self> {
        let mut bound = bound.clone();
        let mut stream = input;
        for sub_pattern in pattern.sub_patterns() {
            stream = sub_pattern.evaluate(stream, &bound, ctx)?;
            bound.extend(sub_pattern.variables());
        }
        debug!("pipeline built with {} stages", pattern.sub_patterns().len());
        Ok(IndexPatternIterator {
            stream: Some(stream),
            stages: pattern.sub_patterns().len(),
        })
    }

    /// Releases every stage; later calls to `next` return `None`.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!("pipeline with {} stages closed early", self.stages);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}

impl<'a> Iterator for IndexPatternIterator<'a> {
    type Item = Result<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stream.as_mut()?.next();
        if next.is_none() {
            self.stream = None;
        }
        next
    }
}

/// Threads `input` through every sub-pattern of `pattern`.
pub fn evaluate<'a, I>(
    pattern: &'a IndexPattern,
    input: I,
    ctx: &'a ExecutionContext<'a>,
) -> Result<IndexPatternIterator<'a>>
where
    I: IntoIterator<Item = Binding>,
    I::IntoIter: 'a,
{
    IndexPatternIterator::new(pattern, from_bindings(input), ctx)
}
