/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Temporal index and the OWL-Time relations it answers.
//!
//! Nodes get an extent from `time:inXSDDateTimeStamp` (instants) or the
//! interval predicate (literals written `start/end`). A BGP triple whose
//! predicate is one of the relations, e.g. `?a time:intervalBefore ?b`, is
//! claimed by [`TemporalFunctions`] and answered by range probes over
//! [`MemoryTemporalIndex`].

pub mod extent;
pub mod index;
pub mod operand;
pub mod property_function;
pub mod relation;

pub use extent::{Endpoint, TemporalExtent, TemporalInstant, TemporalInterval};
pub use index::MemoryTemporalIndex;
pub use operand::TemporalOperandFactory;
pub use property_function::{TemporalFunctions, TemporalPropertyFunction};
pub use relation::TemporalRelation;
