/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Numeric value index for a single predicate, answering `?s <pred> ?o`.
//!
//! Values are kept in value order, so a bound object is matched by the
//! number it denotes rather than by its lexical form: `"30"` and `"30.0"`
//! find the same subjects.

use crate::error::Result;
use crate::execution::BindingStream;
use crate::index::PatternQuerier;
use crate::store::TripleSource;
use log::{debug, warn};
use rustc_hash::FxHashMap;
use shared::binding::Binding;
use shared::dictionary::Dictionary;
use shared::terms::TriplePattern;
use shared::vocab::{XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

const SIGN: u64 = 0x8000_0000_0000_0000;

/// Order-preserving key of a number. NaN has none; `-0.0` shares the key of `0.0`.
fn value_key(value: f64) -> Option<u64> {
    if value.is_nan() {
        return None;
    }
    let bits = if value == 0.0 { 0 } else { value.to_bits() };
    Some(if bits & SIGN != 0 { !bits } else { bits ^ SIGN })
}

fn key_value(key: u64) -> f64 {
    f64::from_bits(if key & SIGN != 0 { key ^ SIGN } else { !key })
}

/// Number denoted by a literal id: plain literals and the XSD numeric types.
pub fn numeric_value(dictionary: &Dictionary, id: u32) -> Option<f64> {
    let (lexical, datatype) = dictionary.literal(id)?;
    match datatype {
        None | Some(XSD_INTEGER) | Some(XSD_DECIMAL) | Some(XSD_DOUBLE) => lexical.trim().parse::<f64>().ok(),
        Some(_) => None,
    }
}

#[derive(Debug, Clone)]
pub struct NumericIndex {
    name: String,
    predicate: u32,
    dictionary: Arc<Dictionary>,
    /// value key -> (subject, literal)
    values: BTreeMap<u64, Vec<(u32, u32)>>,
    /// subject -> (value key, literal)
    subjects: FxHashMap<u32, Vec<(u64, u32)>>,
    len: u64,
}

impl NumericIndex {
    pub fn new(predicate: u32, name: &str, dictionary: Arc<Dictionary>) -> Self {
        NumericIndex {
            name: name.to_string(),
            predicate,
            dictionary,
            values: BTreeMap::new(),
            subjects: FxHashMap::default(),
            len: 0,
        }
    }

    /// Indexes every numeric object of `predicate` in `store`. Objects that do
    /// not parse as numbers are skipped.
    pub fn build_from_store(store: &dyn TripleSource, dictionary: &Arc<Dictionary>, predicate: &str) -> Result<Self> {
        let mut index = match dictionary.get_id(predicate) {
            Some(id) => NumericIndex::new(id, predicate, dictionary.clone()),
            None => return Ok(NumericIndex::new(u32::MAX, predicate, dictionary.clone())),
        };
        for triple in store.match_pattern(None, Some(index.predicate), None) {
            let Some(value) = numeric_value(dictionary, triple.object) else {
                warn!("{}: skipping non-numeric object in {}", predicate, dictionary.decode_triple(&triple));
                continue;
            };
            if !index.add(triple.subject, value, triple.object) {
                warn!("{}: skipping NaN object in {}", predicate, dictionary.decode_triple(&triple));
            }
        }
        debug!("numeric index for {} built: {} entries", predicate, index.len);
        Ok(index)
    }

    /// Records `subject <predicate> literal` with the literal's value.
    /// Returns false for NaN, which has no place in the value order.
    pub fn add(&mut self, subject: u32, value: f64, literal: u32) -> bool {
        let Some(key) = value_key(value) else {
            return false;
        };
        let entries = self.subjects.entry(subject).or_default();
        if entries.iter().any(|&(_, l)| l == literal) {
            return true;
        }
        entries.push((key, literal));
        self.values.entry(key).or_default().push((subject, literal));
        self.len += 1;
        true
    }

    pub fn predicate(&self) -> u32 {
        self.predicate
    }

    pub fn size(&self) -> u64 {
        self.len
    }

    /// Numeric values recorded for `subject`.
    pub fn values_of(&self, subject: u32) -> impl Iterator<Item = f64> + '_ {
        self.subjects.get(&subject).into_iter().flatten().map(|&(key, _)| key_value(key))
    }

    /// `(value, subject)` pairs with a value between `start` and `end`, in value order.
    pub fn range(&self, start: Bound<f64>, end: Bound<f64>) -> Box<dyn Iterator<Item = (f64, u32)> + '_> {
        let (Some(lo), Some(hi)) = (key_bound(start), key_bound(end)) else {
            return Box::new(std::iter::empty());
        };
        let empty = match (&lo, &hi) {
            (Bound::Included(a), Bound::Included(b)) => a > b,
            (Bound::Included(a), Bound::Excluded(b))
            | (Bound::Excluded(a), Bound::Included(b))
            | (Bound::Excluded(a), Bound::Excluded(b)) => a >= b,
            _ => false,
        };
        if empty {
            return Box::new(std::iter::empty());
        }
        Box::new(
            self.values
                .range((lo, hi))
                .flat_map(|(&key, entries)| entries.iter().map(move |&(subject, _)| (key_value(key), subject))),
        )
    }

    /// Entries whose value equals the number denoted by `literal`.
    fn entries_matching(&self, literal: u32) -> &[(u32, u32)] {
        numeric_value(&self.dictionary, literal)
            .and_then(value_key)
            .and_then(|key| self.values.get(&key))
            .map(|entries| entries.as_slice())
            .unwrap_or(&[])
    }

    fn claims(&self, triple: &TriplePattern) -> bool {
        triple.0.is_var() && triple.1.as_constant() == Some(self.predicate) && triple.2.is_var()
    }
}

/// `None` when the bound is NaN.
fn key_bound(bound: Bound<f64>) -> Option<Bound<u64>> {
    Some(match bound {
        Bound::Included(v) => Bound::Included(value_key(v)?),
        Bound::Excluded(v) => Bound::Excluded(value_key(v)?),
        Bound::Unbounded => Bound::Unbounded,
    })
}

impl PatternQuerier for NumericIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn examine(&self, triples: &[TriplePattern]) -> Vec<usize> {
        triples
            .iter()
            .enumerate()
            .filter(|(_, triple)| self.claims(triple))
            .map(|(i, _)| i)
            .collect()
    }

    fn estimate(&self, triple: &TriplePattern, binding: &Binding) -> u64 {
        match (triple.0.resolve(binding), triple.2.resolve(binding)) {
            (None, None) => self.len,
            (Some(s), None) => self.subjects.get(&s).map_or(0, |entries| entries.len() as u64),
            (None, Some(o)) => self.entries_matching(o).len() as u64,
            (Some(_), Some(_)) => 1,
        }
    }

    fn query<'a>(&'a self, triple: &TriplePattern, binding: &Binding) -> Result<BindingStream<'a>> {
        let subject_var = triple.0.as_var().map(str::to_string);
        let object_var = triple.2.as_var().map(str::to_string);
        let binding = binding.clone();

        let results: Box<dyn Iterator<Item = Binding> + 'a> =
            match (triple.0.resolve(&binding), triple.2.resolve(&binding)) {
                (Some(s), Some(o)) => {
                    let found = self.entries_matching(o).iter().any(|&(subject, _)| subject == s);
                    Box::new(found.then_some(binding).into_iter())
                }
                (Some(s), None) => Box::new(
                    self.subjects
                        .get(&s)
                        .into_iter()
                        .flatten()
                        .filter_map(move |&(_, literal)| bind(&binding, object_var.as_deref(), literal)),
                ),
                (None, Some(o)) => Box::new(
                    self.entries_matching(o)
                        .iter()
                        .filter_map(move |&(subject, _)| bind(&binding, subject_var.as_deref(), subject)),
                ),
                (None, None) => Box::new(self.values.values().flatten().filter_map(move |&(subject, literal)| {
                    bind(&binding, subject_var.as_deref(), subject).and_then(|b| bind(&b, object_var.as_deref(), literal))
                })),
            };
        Ok(Box::new(results.map(Ok)))
    }
}

fn bind(binding: &Binding, variable: Option<&str>, value: u32) -> Option<Binding> {
    match variable {
        Some(var) => binding.extend(var, value),
        None => Some(binding.clone()),
    }
}
