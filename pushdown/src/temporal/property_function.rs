/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::error::{Error, Result};
use crate::execution::{BindingStream, ExecutionContext};
use crate::index::{
    bind_property_function, Claim, ClaimContext, Operand, OperandFactory, PropertyFunction,
    PropertyFunctionFactory,
};
use crate::temporal::extent::TemporalExtent;
use crate::temporal::index::MemoryTemporalIndex;
use crate::temporal::operand::TemporalOperandFactory;
use crate::temporal::relation::TemporalRelation;
use shared::binding::Binding;
use shared::dictionary::Dictionary;
use shared::terms::{Term, TriplePattern};
use shared::vocab::TIME_NS;
use std::sync::Arc;

type Bindings<'a> = Box<dyn Iterator<Item = Binding> + 'a>;

/// Binds `root` to every node holding `extent` when it is a free variable.
/// A bound or constant root survives only if it holds `extent` itself; ids
/// the index does not know (literals) were resolved by the operand factory.
fn bind_root<'a>(index: &'a MemoryTemporalIndex, root: &Term, extent: TemporalExtent, binding: Binding) -> Bindings<'a> {
    let node = match root {
        Term::Variable(name) => match binding.get(name) {
            Some(node) => node,
            None => {
                let name = name.clone();
                return Box::new(
                    index
                        .nodes_with(&extent)
                        .iter()
                        .filter_map(move |&node| binding.extend(&name, node)),
                );
            }
        },
        Term::Constant(id) => *id,
    };
    if index.extent_of(node).map_or(true, |held| held == extent) {
        Box::new(std::iter::once(binding))
    } else {
        Box::new(std::iter::empty())
    }
}

pub struct TemporalPropertyFunction {
    name: String,
    relation: TemporalRelation,
    index: Arc<MemoryTemporalIndex>,
    operands: Arc<TemporalOperandFactory>,
}

impl PropertyFunction<TemporalExtent> for TemporalPropertyFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn operand_factory(&self) -> &dyn OperandFactory<TemporalExtent> {
        self.operands.as_ref()
    }

    fn supports_estimate(&self) -> bool {
        true
    }

    fn estimate(&self, subject: &Operand<TemporalExtent>, object: &Operand<TemporalExtent>) -> Option<u64> {
        let index = self.index.as_ref();
        Some(match (subject.representation(), object.representation()) {
            (Some(_), Some(_)) => 1,
            (Some(x), None) => self.relation.bind_second_var(index, *x).count() as u64,
            (None, Some(y)) => self.relation.bind_first_var(index, *y).count() as u64,
            (None, None) => index.size().saturating_mul(index.size()),
        })
    }

    fn evaluate<'a>(
        &'a self,
        binding: &Binding,
        subject: &Operand<TemporalExtent>,
        object: &Operand<TemporalExtent>,
        ctx: &ExecutionContext<'a>,
    ) -> Result<BindingStream<'a>> {
        let index: &'a MemoryTemporalIndex = self.index.as_ref();
        let relation = self.relation;
        let subject_root = subject.root().clone();
        let object_root = object.root().clone();

        let bindings: Bindings<'a> = match (subject.representation().copied(), object.representation().copied()) {
            (Some(x), Some(y)) => {
                if !relation.holds(&x, &y) {
                    return Ok(Box::new(std::iter::empty()));
                }
                Box::new(
                    bind_root(index, &subject_root, x, binding.clone())
                        .flat_map(move |b| bind_root(index, &object_root, y, b)),
                )
            }
            (Some(x), None) => Box::new(bind_root(index, &subject_root, x, binding.clone()).flat_map(move |b| {
                let object_root = object_root.clone();
                relation
                    .bind_second_var(index, x)
                    .flat_map(move |y| bind_root(index, &object_root, y, b.clone()))
            })),
            (None, Some(y)) => Box::new(bind_root(index, &object_root, y, binding.clone()).flat_map(move |b| {
                let subject_root = subject_root.clone();
                relation
                    .bind_first_var(index, y)
                    .flat_map(move |x| bind_root(index, &subject_root, x, b.clone()))
            })),
            (None, None) => {
                if !ctx.config.evaluate_doubly_unbound {
                    return Err(Error::DoublyUnbound(self.name.clone()));
                }
                let binding = binding.clone();
                Box::new(index.extents().flat_map(move |x| {
                    let start = binding.clone();
                    let subject_root = subject_root.clone();
                    let object_root = object_root.clone();
                    relation.bind_second_var(index, x).flat_map(move |y| {
                        let object_root = object_root.clone();
                        bind_root(index, &subject_root, x, start.clone())
                            .flat_map(move |b| bind_root(index, &object_root, y, b))
                    })
                }))
            }
        };
        Ok(Box::new(bindings.map(Ok)))
    }
}

/// Property-function factory for the OWL-Time relations over one temporal index.
pub struct TemporalFunctions {
    index: Arc<MemoryTemporalIndex>,
    dictionary: Arc<Dictionary>,
    operands: Arc<TemporalOperandFactory>,
}

impl TemporalFunctions {
    pub fn new(index: Arc<MemoryTemporalIndex>, dictionary: Arc<Dictionary>) -> Self {
        let operands = Arc::new(TemporalOperandFactory::new(index.clone(), dictionary.clone()));
        TemporalFunctions {
            index,
            dictionary,
            operands,
        }
    }

    fn check_literal_argument(&self, relation: &str, argument: &Term) -> Result<()> {
        let Term::Constant(id) = argument else {
            return Ok(());
        };
        if self.dictionary.is_literal(*id) && self.operands.literal_extent(*id).is_none() {
            return Err(Error::MalformedPattern(format!(
                "argument {} of time:{} is not a temporal literal",
                self.dictionary.decode(*id).unwrap_or("?"),
                relation
            )));
        }
        Ok(())
    }
}

impl PropertyFunctionFactory for TemporalFunctions {
    fn namespace(&self) -> &str {
        TIME_NS
    }

    fn instantiate(
        &self,
        predicate: &str,
        triple: &TriplePattern,
        available: &[TriplePattern],
        binding: &Binding,
        claim: &ClaimContext<'_>,
    ) -> Result<Claim> {
        let local = predicate.strip_prefix(TIME_NS).unwrap_or(predicate);
        let Some(relation) = TemporalRelation::from_local_name(local) else {
            return Ok(Claim::NotAFunction);
        };
        self.check_literal_argument(local, &triple.0)?;
        self.check_literal_argument(local, &triple.2)?;

        let function = Arc::new(TemporalPropertyFunction {
            name: format!("time:{}", local),
            relation,
            index: self.index.clone(),
            operands: self.operands.clone(),
        });
        Ok(bind_property_function(function, triple, available, binding, claim))
    }
}
