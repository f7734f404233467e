/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::execution::BindingStream;
use crate::index::PatternQuerier;
use crate::store::TripleSource;
use shared::binding::Binding;
use shared::terms::{Term, TriplePattern};
use shared::triple::Triple;

/// Extends `binding` with the variables of `pattern` matched against `triple`.
/// A variable repeated in the pattern must match the same value each time.
pub fn extend_with_triple(binding: &Binding, pattern: &TriplePattern, triple: &Triple) -> Option<Binding> {
    let mut extended = binding.clone();
    let positions = [
        (&pattern.0, triple.subject),
        (&pattern.1, triple.predicate),
        (&pattern.2, triple.object),
    ];
    for (term, value) in positions {
        if let Term::Variable(name) = term {
            extended = extended.extend(name, value)?;
        }
    }
    Some(extended)
}

fn match_triple<'a>(
    source: &'a dyn TripleSource,
    pattern: &'a TriplePattern,
    binding: Binding,
) -> BindingStream<'a> {
    let s = pattern.0.resolve(&binding);
    let p = pattern.1.resolve(&binding);
    let o = pattern.2.resolve(&binding);
    Box::new(
        source
            .match_pattern(s, p, o)
            .filter_map(move |triple| extend_with_triple(&binding, pattern, &triple))
            .map(Ok),
    )
}

/// Nested-loop join of `input` with `triples`, in `order`, against `source`.
pub fn nested_loop<'a>(
    triples: &'a [TriplePattern],
    order: Vec<usize>,
    source: &'a dyn TripleSource,
    input: BindingStream<'a>,
) -> BindingStream<'a> {
    let mut stream = input;
    for index in order {
        let pattern = &triples[index];
        stream = Box::new(stream.flat_map(move |item| -> BindingStream<'a> {
            match item {
                Ok(binding) => match_triple(source, pattern, binding),
                Err(e) => Box::new(std::iter::once(Err(e))),
            }
        }));
    }
    stream
}

/// Nested-loop join of `input` with triples answered by `querier`.
pub fn querier_loop<'a>(
    triples: &'a [TriplePattern],
    querier: &'a dyn PatternQuerier,
    input: BindingStream<'a>,
) -> BindingStream<'a> {
    let mut stream = input;
    for pattern in triples {
        stream = Box::new(stream.flat_map(move |item| -> BindingStream<'a> {
            let binding = match item {
                Ok(binding) => binding,
                Err(e) => return Box::new(std::iter::once(Err(e))),
            };
            match querier.query(pattern, &binding) {
                Ok(results) => results,
                Err(e) => Box::new(std::iter::once(Err(e))),
            }
        }));
    }
    stream
}

/// Keeps only the errors of `input`; used when a stage can produce nothing.
pub fn errors_only<'a>(input: BindingStream<'a>) -> BindingStream<'a> {
    Box::new(input.filter(|item| item.is_err()))
}

/// Lifts plain bindings into a stream.
pub fn from_bindings<'a, I>(bindings: I) -> BindingStream<'a>
where
    I: IntoIterator<Item = Binding>,
    I::IntoIter: 'a,
{
    Box::new(bindings.into_iter().map(Ok))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::store::MemoryStore;

    #[test]
    fn test_repeated_variable_must_agree() {
        let pattern = (Term::var("x"), Term::Constant(1), Term::var("x"));
        let binding = Binding::new();
        assert!(extend_with_triple(&binding, &pattern, &Triple::new(3, 1, 4)).is_none());
        let b = extend_with_triple(&binding, &pattern, &Triple::new(3, 1, 3)).unwrap();
        assert_eq!(b.get("x"), Some(3));
    }

    #[test]
    fn test_nested_loop_joins_through_shared_variable() {
        let store = MemoryStore::from_triples(&[
            Triple::new(1, 10, 2),
            Triple::new(2, 11, 5),
            Triple::new(3, 10, 4),
        ]);
        let triples = vec![
            (Term::var("a"), Term::Constant(10), Term::var("b")),
            (Term::var("b"), Term::Constant(11), Term::var("c")),
        ];
        let out: Vec<Binding> = nested_loop(&triples, vec![0, 1], &store, from_bindings(vec![Binding::new()]))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(out, vec![Binding::new().with("a", 1).with("b", 2).with("c", 5)]);
    }

    #[test]
    fn test_errors_pass_through() {
        let store = MemoryStore::new();
        let triples = vec![(Term::var("a"), Term::Constant(10), Term::var("b"))];
        let input: BindingStream = Box::new(std::iter::once(Err(crate::error::Error::Probe("boom".into()))));
        let out: Vec<_> = nested_loop(&triples, vec![0], &store, input).collect();
        assert_eq!(out.len(), 1);
        assert!(out[0].is_err());
    }
}
