/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Spatial index and the GeoSPARQL topological relations it answers.
//!
//! Geometries come from `geo:asWKT` literals; a `geo:hasGeometry` feature
//! inherits the geometry of its object. Triples such as `?f geo:sfWithin ?r`
//! are claimed by [`SpatialFunctions`] and answered by envelope searches over
//! the R-tree in [`MemorySpatialIndex`], refined with DE-9IM matrices.

pub mod geometry;
pub mod index;
pub mod operand;
pub mod property_function;
pub mod relation;

pub use geometry::{parse_wkt, Envelope};
pub use index::MemorySpatialIndex;
pub use operand::SpatialOperandFactory;
pub use property_function::{SpatialFunctions, SpatialPropertyFunction};
pub use relation::SpatialRelation;
