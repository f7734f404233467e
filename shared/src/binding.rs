/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Solution mappings.
//!
//! A [`Binding`] maps variable names to dictionary ids. Bindings are values:
//! extending one produces a new binding and never retracts an existing slot,
//! so a downstream stage always sees everything its upstream stages bound.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Binding {
    slots: BTreeMap<String, u32>,
}

impl Binding {
    pub fn new() -> Self {
        Binding {
            slots: BTreeMap::new(),
        }
    }

    pub fn get(&self, variable: &str) -> Option<u32> {
        self.slots.get(variable).copied()
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.slots.contains_key(variable)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns a copy extended with `variable = value`.
    ///
    /// Returns `None` when the variable is already bound to a different value,
    /// which is how joins reject inconsistent candidates.
    pub fn extend(&self, variable: &str, value: u32) -> Option<Binding> {
        match self.slots.get(variable) {
            Some(&existing) if existing == value => Some(self.clone()),
            Some(_) => None,
            None => {
                let mut slots = self.slots.clone();
                slots.insert(variable.to_string(), value);
                Some(Binding { slots })
            }
        }
    }

    /// Builder form of [`Binding::extend`] that overwrites on conflict.
    /// Meant for constructing inputs, not for joining.
    pub fn with(mut self, variable: &str, value: u32) -> Binding {
        self.slots.insert(variable.to_string(), value);
        self
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_is_monotonic() {
        let base = Binding::new().with("x", 1);
        let extended = base.extend("y", 2).unwrap();
        assert_eq!(base.len(), 1);
        assert_eq!(extended.get("x"), Some(1));
        assert_eq!(extended.get("y"), Some(2));
        assert_eq!(extended.len(), 2);
    }

    #[test]
    fn test_extend_rejects_conflict() {
        let base = Binding::new().with("x", 1);
        assert!(base.extend("x", 2).is_none());
        assert_eq!(base.extend("x", 1), Some(base.clone()));
    }

    #[test]
    fn test_display() {
        let b = Binding::new().with("b", 2).with("a", 1);
        assert_eq!(b.to_string(), "{?a=1, ?b=2}");
    }
}
