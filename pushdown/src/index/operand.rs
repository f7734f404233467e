/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use rustc_hash::FxHashMap;
use shared::binding::Binding;
use shared::terms::{Term, TriplePattern};

/// An index's typed view of one BGP node.
///
/// `representation` is `None` when the node is a variable the index knows
/// nothing about yet; `triples` are the pattern triples that define the
/// representation and are answered by the index along with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand<T> {
    root: Term,
    representation: Option<T>,
    triples: Vec<TriplePattern>,
}

impl<T> Operand<T> {
    pub fn new(root: Term, representation: Option<T>, triples: Vec<TriplePattern>) -> Self {
        Operand {
            root,
            representation,
            triples,
        }
    }

    /// Operand for a variable with no known value.
    pub fn unbound(root: Term) -> Self {
        Operand::new(root, None, Vec::new())
    }

    pub fn root(&self) -> &Term {
        &self.root
    }

    pub fn representation(&self) -> Option<&T> {
        self.representation.as_ref()
    }

    pub fn triples(&self) -> &[TriplePattern] {
        &self.triples
    }

    pub fn is_known(&self) -> bool {
        self.representation.is_some()
    }
}

pub trait OperandFactory<T>: Send + Sync {
    /// Builds the operand for `root`, looking in `pattern` for defining triples.
    fn create_operand(&self, root: &Term, pattern: &[TriplePattern], binding: &Binding) -> Option<Operand<T>>;

    /// Builds the operand for `root` from the binding alone.
    fn create_operand_from_binding(&self, root: &Term, binding: &Binding) -> Option<Operand<T>>;
}

/// Builds operands for `nodes` and, with `find_subordinates`, for every node
/// reachable from them through object positions of non-`rdf:type` triples.
/// Nodes the factory cannot serve are left out of the map.
pub fn get_operands<T>(
    factory: &dyn OperandFactory<T>,
    nodes: &[Term],
    pattern: &[TriplePattern],
    binding: &Binding,
    find_subordinates: bool,
    rdf_type: Option<u32>,
    is_literal: &dyn Fn(u32) -> bool,
) -> FxHashMap<Term, Operand<T>> {
    let mut operands = FxHashMap::default();
    let mut visited: Vec<Term> = Vec::new();
    let mut stack: Vec<Term> = nodes.iter().rev().cloned().collect();

    while let Some(node) = stack.pop() {
        if visited.contains(&node) {
            continue;
        }
        visited.push(node.clone());

        if let Some(operand) = factory.create_operand(&node, pattern, binding) {
            operands.insert(node.clone(), operand);
        }

        if find_subordinates {
            // reversed so the first linked triple is explored first
            for (s, p, o) in pattern.iter().rev() {
                let is_type = matches!(rdf_type, Some(t) if p.as_constant() == Some(t));
                if *s != node || is_type {
                    continue;
                }
                let follows = match o {
                    Term::Variable(_) => true,
                    Term::Constant(id) => !is_literal(*id),
                };
                if follows && !visited.contains(o) {
                    stack.push(o.clone());
                }
            }
        }
    }
    operands
}
