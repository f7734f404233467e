/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

extern crate pushdown;
use pushdown::numeric::NumericIndex;
use pushdown::pattern::{Decomposer, IndexSubPattern};
use pushdown::temporal::{MemoryTemporalIndex, TemporalFunctions};
use pushdown::{
    decompose, evaluate, Dataset, DatabaseStats, Error, ExecutionContext, IndexRegistry, MemoryStore,
    PlannerConfig, TripleSource,
};
use shared::binding::Binding;
use shared::dictionary::Dictionary;
use shared::terms::{Term, TriplePattern};
use shared::triple::Triple;
use shared::vocab::{AS_INTERVAL, INTERVAL_DATATYPE, TIME_IN_XSD_DATE_TIME_STAMP, TIME_NS, XSD_DATE_TIME, XSD_INTEGER};
use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        dictionary: Arc<Dictionary>,
        dataset: Dataset,
        stats: DatabaseStats,
        registry: IndexRegistry,
        ids: Ids,
    }

    struct Ids {
        kind: u32,
        meeting: u32,
        age: u32,
        name: u32,
        m1: u32,
        m2: u32,
        m3: u32,
        deadline: u32,
        alice: u32,
        bob: u32,
        interval_before: u32,
        before: u32,
        deadline_literal: u32,
        cutoff: u32,
        garbage: u32,
        at: u32,
        archive: u32,
    }

    fn setup_test_db() -> Fixture {
        let mut dict = Dictionary::new();

        let kind = dict.encode("http://example.org/kind");
        let meeting = dict.encode("http://example.org/Meeting");
        let age = dict.encode("http://example.org/age");
        let name = dict.encode("http://example.org/name");
        let as_interval = dict.encode(AS_INTERVAL);
        let at = dict.encode(TIME_IN_XSD_DATE_TIME_STAMP);
        let interval_before = dict.encode(&format!("{}intervalBefore", TIME_NS));
        let before = dict.encode(&format!("{}before", TIME_NS));
        dict.encode(&format!("{}intervalEquals", TIME_NS));

        let m1 = dict.encode("http://example.org/m1");
        let m2 = dict.encode("http://example.org/m2");
        let m3 = dict.encode("http://example.org/m3");
        let deadline = dict.encode("http://example.org/deadline");
        let alice = dict.encode("http://example.org/alice");
        let bob = dict.encode("http://example.org/bob");
        let archive = dict.encode("http://example.org/archive");

        let m1_span = dict.encode_typed_literal("2020-01-01T09:00:00Z/2020-01-01T10:00:00Z", INTERVAL_DATATYPE);
        let m2_span = dict.encode_typed_literal("2020-01-01T11:00:00Z/2020-01-01T12:00:00Z", INTERVAL_DATATYPE);
        let m3_span = dict.encode_typed_literal("2020-01-01T09:30:00Z/2020-01-01T10:30:00Z", INTERVAL_DATATYPE);
        let deadline_literal = dict.encode_typed_literal("2020-01-01T10:45:00Z", XSD_DATE_TIME);
        let cutoff = dict.encode_typed_literal("2020-01-01T10:15:00Z", XSD_DATE_TIME);
        let garbage = dict.encode_typed_literal("not a time", XSD_DATE_TIME);
        let thirty = dict.encode_typed_literal("30", XSD_INTEGER);
        let forty = dict.encode_typed_literal("40", XSD_INTEGER);
        let alice_name = dict.encode("\"Alice\"");
        let bob_name = dict.encode("\"Bob\"");

        let store = MemoryStore::from_triples(&[
            Triple::new(m1, kind, meeting),
            Triple::new(m2, kind, meeting),
            Triple::new(m3, kind, meeting),
            Triple::new(m1, as_interval, m1_span),
            Triple::new(m2, as_interval, m2_span),
            Triple::new(m3, as_interval, m3_span),
            Triple::new(deadline, at, deadline_literal),
            Triple::new(alice, age, thirty),
            Triple::new(bob, age, forty),
            Triple::new(alice, name, alice_name),
            Triple::new(bob, name, bob_name),
            // asserted outright; neither argument has a temporal extent
            Triple::new(alice, before, bob),
        ]);
        let archive_graph = MemoryStore::from_triples(&[Triple::new(m1, kind, meeting)]);

        let dictionary = Arc::new(dict);
        let temporal = Arc::new(MemoryTemporalIndex::build_from_store(&store, &dictionary).unwrap());
        let numeric = NumericIndex::build_from_store(&store, &dictionary, "http://example.org/age").unwrap();

        let mut registry = IndexRegistry::new(dictionary.clone());
        registry.register_property_functions(Arc::new(TemporalFunctions::new(temporal, dictionary.clone())));
        registry.register_querier(Arc::new(numeric));

        let stats = DatabaseStats::gather_with(&store, &PlannerConfig::default());
        let default_graph: Arc<dyn TripleSource> = Arc::new(store);
        let dataset = Dataset::new(default_graph).with_named_graph(archive, Arc::new(archive_graph));

        Fixture {
            dictionary,
            dataset,
            stats,
            registry,
            ids: Ids {
                kind,
                meeting,
                age,
                name,
                m1,
                m2,
                m3,
                deadline,
                alice,
                bob,
                interval_before,
                before,
                deadline_literal,
                cutoff,
                garbage,
                at,
                archive,
            },
        }
    }

    fn c(id: u32) -> Term {
        Term::Constant(id)
    }

    fn v(name: &str) -> Term {
        Term::var(name)
    }

    fn run(fixture: &Fixture, config: &PlannerConfig, bgp: &[TriplePattern]) -> Vec<Binding> {
        let pattern = decompose(bgp, &fixture.registry, config).unwrap();
        assert!(pattern.verify_coverage());
        let ctx = ExecutionContext::new(&fixture.dataset, &fixture.stats, config);
        evaluate(&pattern, vec![Binding::new()], &ctx)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn pairs(rows: &[Binding], a: &str, b: &str) -> Vec<(u32, u32)> {
        let mut out: Vec<(u32, u32)> = rows
            .iter()
            .map(|row| (row.get(a).unwrap(), row.get(b).unwrap()))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_interval_before_between_variables() {
        let f = setup_test_db();
        let ids = &f.ids;
        let bgp = vec![
            (v("a"), c(ids.kind), c(ids.meeting)),
            (v("b"), c(ids.kind), c(ids.meeting)),
            (v("a"), c(ids.interval_before), v("b")),
        ];
        let rows = run(&f, &PlannerConfig::default(), &bgp);
        let mut expected = vec![(ids.m1, ids.m2), (ids.m3, ids.m2)];
        expected.sort();
        assert_eq!(pairs(&rows, "a", "b"), expected);
    }

    #[test]
    fn test_same_rows_with_tree_width_optimizer_and_no_reordering() {
        let f = setup_test_db();
        let ids = &f.ids;
        let bgp = vec![
            (v("a"), c(ids.kind), c(ids.meeting)),
            (v("b"), c(ids.kind), c(ids.meeting)),
            (v("a"), c(ids.interval_before), v("b")),
        ];
        let config = PlannerConfig::from_toml_str(
            "optimizer = \"tree_width\"\nreorder_sub_patterns = false\nsplit_disconnected = false\n",
        )
        .unwrap();
        let rows = run(&f, &config, &bgp);
        let mut expected = vec![(ids.m1, ids.m2), (ids.m3, ids.m2)];
        expected.sort();
        assert_eq!(pairs(&rows, "a", "b"), expected);
    }

    #[test]
    fn test_before_literal_constant() {
        let f = setup_test_db();
        let ids = &f.ids;
        let bgp = vec![
            (v("a"), c(ids.kind), c(ids.meeting)),
            (v("a"), c(ids.before), c(ids.cutoff)),
        ];
        let rows = run(&f, &PlannerConfig::default(), &bgp);
        let found: Vec<u32> = rows.iter().map(|row| row.get("a").unwrap()).collect();
        assert_eq!(found, vec![ids.m1]);
    }

    #[test]
    fn test_defining_triple_is_claimed_with_the_relation() {
        let f = setup_test_db();
        let ids = &f.ids;
        let bgp = vec![
            (v("a"), c(ids.kind), c(ids.meeting)),
            (v("d"), c(ids.at), c(ids.deadline_literal)),
            (v("a"), c(ids.before), v("d")),
        ];
        let pattern = decompose(&bgp, &f.registry, &PlannerConfig::default()).unwrap();
        let function = pattern
            .sub_patterns()
            .iter()
            .find(|sp| matches!(sp, IndexSubPattern::EstimablePropertyFunction(_)))
            .unwrap();
        assert_eq!(function.triples().len(), 2);
        assert!(function.triples().contains(&bgp[1]));

        let rows = run(&f, &PlannerConfig::default(), &bgp);
        let mut expected = vec![(ids.m1, ids.deadline), (ids.m3, ids.deadline)];
        expected.sort();
        assert_eq!(pairs(&rows, "a", "d"), expected);
    }

    #[test]
    fn test_numeric_querier_joins_with_generic_triples() {
        let f = setup_test_db();
        let ids = &f.ids;
        let bgp = vec![(v("p"), c(ids.age), v("years")), (v("p"), c(ids.name), v("label"))];
        let pattern = decompose(&bgp, &f.registry, &PlannerConfig::default()).unwrap();
        assert!(pattern
            .sub_patterns()
            .iter()
            .any(|sp| matches!(sp, IndexSubPattern::GenericBgp(bgp) if bgp.querier.is_some())));

        let rows = run(&f, &PlannerConfig::default(), &bgp);
        let mut people: Vec<u32> = rows.iter().map(|row| row.get("p").unwrap()).collect();
        people.sort();
        let mut expected = vec![ids.alice, ids.bob];
        expected.sort();
        assert_eq!(people, expected);
    }

    #[test]
    fn test_close_releases_the_pipeline() {
        let f = setup_test_db();
        let ids = &f.ids;
        let config = PlannerConfig::default();
        let bgp = vec![(v("a"), c(ids.kind), c(ids.meeting))];
        let pattern = decompose(&bgp, &f.registry, &config).unwrap();
        let ctx = ExecutionContext::new(&f.dataset, &f.stats, &config);
        let mut rows = evaluate(&pattern, vec![Binding::new()], &ctx).unwrap();

        assert!(rows.next().is_some());
        rows.close();
        assert!(rows.is_closed());
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_input_bindings_are_extended() {
        let f = setup_test_db();
        let ids = &f.ids;
        let config = PlannerConfig::default();
        let bgp = vec![(v("a"), c(ids.interval_before), v("b"))];
        let pattern = decompose(&bgp, &f.registry, &config).unwrap();
        let ctx = ExecutionContext::new(&f.dataset, &f.stats, &config);
        let input = vec![Binding::new().with("a", ids.m1), Binding::new().with("a", ids.m2)];
        let rows = evaluate(&pattern, input, &ctx)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        // the deadline instant also follows m1
        let mut expected = vec![(ids.m1, ids.m2), (ids.m1, ids.deadline)];
        expected.sort();
        assert_eq!(pairs(&rows, "a", "b"), expected);
    }

    #[test]
    fn test_graph_scoped_residual() {
        let f = setup_test_db();
        let ids = &f.ids;
        let config = PlannerConfig::default();
        let bgp = vec![(v("a"), c(ids.kind), c(ids.meeting))];

        let pattern = Decomposer::new(&f.registry, &config)
            .decompose_in_graph(&bgp, ids.archive, &Binding::new())
            .unwrap();
        assert!(matches!(pattern.sub_patterns()[0], IndexSubPattern::GraphScoped(_)));
        let ctx = ExecutionContext::new(&f.dataset, &f.stats, &config);
        let rows: Vec<Binding> = evaluate(&pattern, vec![Binding::new()], &ctx)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(rows, vec![Binding::new().with("a", ids.m1)]);

        let unknown = Decomposer::new(&f.registry, &config)
            .decompose_in_graph(&bgp, ids.meeting, &Binding::new())
            .unwrap();
        let ctx = ExecutionContext::new(&f.dataset, &f.stats, &config);
        assert_eq!(evaluate(&unknown, vec![Binding::new()], &ctx).unwrap().count(), 0);
    }

    #[test]
    fn test_doubly_unbound_can_be_refused() {
        let f = setup_test_db();
        let ids = &f.ids;
        let config = PlannerConfig {
            evaluate_doubly_unbound: false,
            ..PlannerConfig::default()
        };
        let bgp = vec![(v("a"), c(ids.interval_before), v("b"))];
        let pattern = decompose(&bgp, &f.registry, &config).unwrap();
        let ctx = ExecutionContext::new(&f.dataset, &f.stats, &config);
        let rows: Vec<_> = evaluate(&pattern, vec![Binding::new()], &ctx).unwrap().collect();
        assert!(rows.iter().any(|row| matches!(row, Err(Error::DoublyUnbound(_)))));
    }

    #[test]
    fn test_malformed_temporal_literal_is_rejected() {
        let f = setup_test_db();
        let ids = &f.ids;
        let bgp = vec![(v("a"), c(ids.before), c(ids.garbage))];
        let err = decompose(&bgp, &f.registry, &PlannerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedPattern(_)));
        assert!(f.dictionary.is_literal(ids.garbage));
    }

    #[test]
    fn test_argument_unknown_to_temporal_index_falls_back_to_generic() {
        let f = setup_test_db();
        let ids = &f.ids;
        let config = PlannerConfig::default();
        let bgp = vec![(v("p"), c(ids.before), c(ids.bob))];
        let pattern = decompose(&bgp, &f.registry, &config).unwrap();
        assert_eq!(pattern.sub_patterns().len(), 1);
        assert!(matches!(
            &pattern.sub_patterns()[0],
            IndexSubPattern::GenericBgp(generic) if generic.querier.is_none() && generic.triples == bgp
        ));

        let rows = run(&f, &config, &bgp);
        assert_eq!(rows, vec![Binding::new().with("p", ids.alice)]);

        // same fallback, but nothing stored matches
        let ground = vec![(c(ids.m1), c(ids.before), c(ids.alice))];
        let pattern = decompose(&ground, &f.registry, &config).unwrap();
        assert!(matches!(&pattern.sub_patterns()[0], IndexSubPattern::GenericBgp(_)));
        assert!(run(&f, &config, &ground).is_empty());
    }

    #[test]
    fn test_repeated_variable_in_temporal_relation() {
        let f = setup_test_db();
        let ids = &f.ids;
        let config = PlannerConfig::default();

        let before_itself = vec![(v("x"), c(ids.interval_before), v("x"))];
        assert!(run(&f, &config, &before_itself).is_empty());

        let equals = f.dictionary.get_id(&format!("{}intervalEquals", TIME_NS)).unwrap();
        let equals_itself = vec![(v("x"), c(equals), v("x"))];
        let mut found: Vec<u32> = run(&f, &config, &equals_itself)
            .iter()
            .map(|row| row.get("x").unwrap())
            .collect();
        found.sort();
        let mut meetings = vec![ids.m1, ids.m2, ids.m3];
        meetings.sort();
        assert_eq!(found, meetings);
    }

    #[test]
    fn test_plain_bgp_without_indexes() {
        let f = setup_test_db();
        let ids = &f.ids;
        let registry = IndexRegistry::new(f.dictionary.clone());
        let config = PlannerConfig::default();
        let bgp = vec![(v("m"), c(ids.kind), c(ids.meeting)), (v("m"), v("p"), v("o"))];
        let pattern = decompose(&bgp, &registry, &config).unwrap();
        assert_eq!(pattern.sub_patterns().len(), 1);

        let ctx = ExecutionContext::new(&f.dataset, &f.stats, &config);
        let rows = evaluate(&pattern, vec![Binding::new()], &ctx)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        // three meetings, each with a kind and an interval triple
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|row| row.get("m") != Some(ids.deadline)));
    }
}
