/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::error::Result;
use crate::execution::{BindingStream, ExecutionContext};
use crate::index::operand::{get_operands, OperandFactory, Operand};
use log::{debug, trace, warn};
use shared::binding::Binding;
use shared::terms::{pattern_variables, Term, TriplePattern};
use std::fmt;
use std::sync::Arc;

/// One relation answered by an index, typed by the index's operand representation.
pub trait PropertyFunction<T>: Send + Sync {
    fn name(&self) -> &str;

    fn operand_factory(&self) -> &dyn OperandFactory<T>;

    /// Whether operands reachable from the arguments are extracted too.
    fn find_subordinates(&self) -> bool {
        false
    }

    fn supports_estimate(&self) -> bool {
        false
    }

    /// Expected number of results for the given argument operands.
    fn estimate(&self, _subject: &Operand<T>, _object: &Operand<T>) -> Option<u64> {
        None
    }

    /// Extensions of `binding` satisfying the relation between the two arguments.
    fn evaluate<'a>(
        &'a self,
        binding: &Binding,
        subject: &Operand<T>,
        object: &Operand<T>,
        ctx: &ExecutionContext<'a>,
    ) -> Result<BindingStream<'a>>;
}

/// A property function bound to one BGP triple, with the operand type erased
/// so sub-patterns of different indexes can share a pipeline.
pub trait PropertyFunctionInstance: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// The property-function triple followed by the operand triples it answers.
    fn covering(&self) -> &[TriplePattern];

    fn supports_estimate(&self) -> bool;

    /// Estimate computed when the instance was claimed.
    fn estimate(&self) -> Option<u64>;

    fn evaluate<'a>(&'a self, binding: Binding, ctx: &ExecutionContext<'a>) -> BindingStream<'a>;

    fn variables(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        for triple in self.covering() {
            for v in pattern_variables(triple) {
                if !vars.iter().any(|known| known == v) {
                    vars.push(v.to_string());
                }
            }
        }
        vars
    }
}

pub struct BoundPropertyFunction<T> {
    function: Arc<dyn PropertyFunction<T>>,
    subject: Term,
    object: Term,
    covering: Vec<TriplePattern>,
    estimate: Option<u64>,
}

impl<T> fmt::Debug for BoundPropertyFunction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundPropertyFunction")
            .field("function", &self.function.name())
            .field("subject", &self.subject)
            .field("object", &self.object)
            .field("covering", &self.covering)
            .field("estimate", &self.estimate)
            .finish()
    }
}

impl<T> BoundPropertyFunction<T> {
    fn operand(&self, root: &Term, binding: &Binding) -> Option<Operand<T>> {
        let factory = self.function.operand_factory();
        factory
            .create_operand(root, &self.covering, binding)
            .or_else(|| factory.create_operand_from_binding(root, binding))
    }
}

impl<T: 'static> PropertyFunctionInstance for BoundPropertyFunction<T> {
    fn name(&self) -> &str {
        self.function.name()
    }

    fn covering(&self) -> &[TriplePattern] {
        &self.covering
    }

    fn supports_estimate(&self) -> bool {
        self.function.supports_estimate()
    }

    fn estimate(&self) -> Option<u64> {
        self.estimate
    }

    fn evaluate<'a>(&'a self, binding: Binding, ctx: &ExecutionContext<'a>) -> BindingStream<'a> {
        let subject = self.operand(&self.subject, &binding);
        let object = self.operand(&self.object, &binding);
        let (Some(subject), Some(object)) = (subject, object) else {
            trace!("{}: argument unknown to the index under {}", self.name(), binding);
            return Box::new(std::iter::empty());
        };
        match self.function.evaluate(&binding, &subject, &object, ctx) {
            Ok(stream) => stream,
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }
}

/// Outcome of offering a property-function triple to its index.
pub enum Claim {
    Claimed(Box<dyn PropertyFunctionInstance>),
    /// An argument has no operand; the triples stay generic.
    Abandoned,
    /// The predicate lives in the namespace but is not a relation of the index.
    NotAFunction,
}

/// Creates property-function instances for every relation in one namespace.
pub trait PropertyFunctionFactory: Send + Sync {
    fn namespace(&self) -> &str;

    fn instantiate(
        &self,
        predicate: &str,
        triple: &TriplePattern,
        available: &[TriplePattern],
        binding: &Binding,
        claim: &ClaimContext<'_>,
    ) -> Result<Claim>;
}

/// Registry facts a factory needs while claiming.
pub struct ClaimContext<'r> {
    pub rdf_type: Option<u32>,
    pub is_literal: &'r dyn Fn(u32) -> bool,
}

/// Extracts the operands of `triple`'s arguments from `available` and binds
/// `function` to them, abandoning the claim when either is missing.
pub fn bind_property_function<T: 'static>(
    function: Arc<dyn PropertyFunction<T>>,
    triple: &TriplePattern,
    available: &[TriplePattern],
    binding: &Binding,
    claim: &ClaimContext<'_>,
) -> Claim {
    let roots = [triple.0.clone(), triple.2.clone()];
    let operands = get_operands(
        function.operand_factory(),
        &roots,
        available,
        binding,
        function.find_subordinates(),
        claim.rdf_type,
        claim.is_literal,
    );

    let (Some(subject), Some(object)) = (operands.get(&triple.0), operands.get(&triple.2)) else {
        warn!("{}: no operand for an argument of {:?}, leaving it to the generic matcher", function.name(), triple);
        return Claim::Abandoned;
    };

    let mut covering = vec![triple.clone()];
    for t in subject.triples().iter().chain(object.triples()) {
        if !covering.contains(t) {
            covering.push(t.clone());
        }
    }

    let estimate = if function.supports_estimate() {
        function.estimate(subject, object)
    } else {
        None
    };
    debug!("{} claims {} triples (estimate {:?})", function.name(), covering.len(), estimate);

    Claim::Claimed(Box::new(BoundPropertyFunction {
        function,
        subject: triple.0.clone(),
        object: triple.2.clone(),
        covering,
        estimate,
    }))
}
