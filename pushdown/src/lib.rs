/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Query planning and index pushdown over an encoded triple store.
//!
//! A basic graph pattern is decomposed into sub-patterns that secondary
//! indexes can answer (temporal and spatial property functions, numeric
//! values) plus a residual that the generic matcher evaluates in an order
//! chosen by the greedy or tree-width optimizer. The sub-patterns are then chained into a
//! lazy binding stream.

pub mod config;
pub mod error;
pub mod execution;
pub mod index;
pub mod numeric;
pub mod optimizer;
pub mod pattern;
pub mod selectivity;
pub mod spatial;
pub mod stats;
pub mod store;
pub mod temporal;

pub use config::{OptimizerKind, PlannerConfig};
pub use error::{Error, Result};
pub use execution::{evaluate, BindingStream, ExecutionContext, IndexPatternIterator};
pub use index::IndexRegistry;
pub use pattern::{decompose, IndexPattern, IndexSubPattern};
pub use stats::DatabaseStats;
pub use store::{Dataset, MemoryStore, TripleSource};
