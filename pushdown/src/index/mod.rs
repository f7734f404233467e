/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Secondary-index plugin contract.
//!
//! Indexes take part in planning in one of two ways:
//!
//! - as a [`PropertyFunctionFactory`]: triples whose predicate lies in the
//!   factory's namespace are relations the index evaluates itself, with
//!   arguments described by typed [`Operand`]s
//! - as a [`PatternQuerier`]: ordinary triples the index claims through
//!   `examine` and answers instead of the store
//!
//! [`IndexRegistry`] is built once and shared read-only between queries.

pub mod operand;
pub mod property_function;
pub mod querier;

pub use operand::{get_operands, Operand, OperandFactory};
pub use property_function::{
    bind_property_function, BoundPropertyFunction, Claim, ClaimContext, PropertyFunction,
    PropertyFunctionFactory, PropertyFunctionInstance,
};
pub use querier::PatternQuerier;

use shared::dictionary::Dictionary;
use shared::vocab::RDF_TYPE;
use std::sync::Arc;

pub struct IndexRegistry {
    dictionary: Arc<Dictionary>,
    property_functions: Vec<Arc<dyn PropertyFunctionFactory>>,
    queriers: Vec<Arc<dyn PatternQuerier>>,
}

impl IndexRegistry {
    pub fn new(dictionary: Arc<Dictionary>) -> Self {
        IndexRegistry {
            dictionary,
            property_functions: Vec::new(),
            queriers: Vec::new(),
        }
    }

    pub fn register_property_functions(&mut self, factory: Arc<dyn PropertyFunctionFactory>) {
        self.property_functions.push(factory);
    }

    pub fn register_querier(&mut self, querier: Arc<dyn PatternQuerier>) {
        self.queriers.push(querier);
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn rdf_type(&self) -> Option<u32> {
        self.dictionary.get_id(RDF_TYPE)
    }

    pub fn queriers(&self) -> &[Arc<dyn PatternQuerier>] {
        &self.queriers
    }

    /// Factory whose namespace prefixes the IRI of `predicate`, with that IRI.
    pub fn factory_for(&self, predicate: u32) -> Option<(&dyn PropertyFunctionFactory, &str)> {
        let iri = self.dictionary.decode(predicate)?;
        self.property_functions
            .iter()
            .find(|f| iri.starts_with(f.namespace()))
            .map(|f| (f.as_ref(), iri))
    }

    pub fn is_empty(&self) -> bool {
        self.property_functions.is_empty() && self.queriers.is_empty()
    }
}

impl std::fmt::Debug for IndexRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexRegistry")
            .field(
                "namespaces",
                &self.property_functions.iter().map(|p| p.namespace()).collect::<Vec<_>>(),
            )
            .field("queriers", &self.queriers.iter().map(|q| q.name()).collect::<Vec<_>>())
            .finish()
    }
}
