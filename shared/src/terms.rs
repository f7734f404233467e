/*
 * Copyright © 2024 Volodymyr Kadzhaia
 * Copyright © 2024 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::binding::Binding;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Variable(String),
    Constant(u32),
}

pub type TriplePattern = (Term, Term, Term);

impl Term {
    pub fn var(name: &str) -> Self {
        Term::Variable(name.to_string())
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn as_var(&self) -> Option<&str> {
        match self {
            Term::Variable(name) => Some(name.as_str()),
            Term::Constant(_) => None,
        }
    }

    pub fn as_constant(&self) -> Option<u32> {
        match self {
            Term::Constant(id) => Some(*id),
            Term::Variable(_) => None,
        }
    }

    /// Value of this term under `binding`, `None` for a free variable.
    pub fn resolve(&self, binding: &Binding) -> Option<u32> {
        match self {
            Term::Constant(id) => Some(*id),
            Term::Variable(name) => binding.get(name),
        }
    }
}

/// Variables of a triple pattern in subject, predicate, object order.
/// A variable repeated inside the triple is reported once.
pub fn pattern_variables(pattern: &TriplePattern) -> Vec<&str> {
    let mut vars: Vec<&str> = Vec::with_capacity(3);
    for term in [&pattern.0, &pattern.1, &pattern.2] {
        if let Some(name) = term.as_var() {
            if !vars.contains(&name) {
                vars.push(name);
            }
        }
    }
    vars
}

pub fn shares_variable(a: &TriplePattern, b: &TriplePattern) -> bool {
    let left = pattern_variables(a);
    pattern_variables(b).iter().any(|v| left.contains(v))
}
