/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

extern crate criterion;
extern crate pushdown;

use criterion::*;
use pushdown::optimizer::{GreedyOptimizer, TreeWidthOptimizer};
use pushdown::*;
use rustc_hash::FxHashSet;
use shared::binding::Binding;
use shared::dictionary::Dictionary;
use shared::terms::{Term, TriplePattern};
use shared::triple::Triple;
use std::sync::Arc;

const EMPLOYEES: u32 = 20_000;

fn setup_database() -> (Dictionary, MemoryStore) {
    let mut dict = Dictionary::new();
    let works_for = dict.encode("http://example.org/worksFor");
    let manages = dict.encode("http://example.org/manages");
    let located = dict.encode("http://example.org/locatedIn");
    let salary = dict.encode("http://example.org/salary");
    let cities: Vec<u32> = (0..20).map(|i| dict.encode(&format!("http://example.org/city{}", i))).collect();
    let companies: Vec<u32> = (0..200).map(|i| dict.encode(&format!("http://example.org/company{}", i))).collect();

    let mut triples = Vec::new();
    for (i, company) in companies.iter().enumerate() {
        triples.push(Triple::new(*company, located, cities[i % cities.len()]));
    }
    for i in 0..EMPLOYEES {
        let employee = dict.encode(&format!("http://example.org/employee{}", i));
        let amount = dict.encode(&format!("\"{}\"", 30_000 + (i % 500) * 100));
        triples.push(Triple::new(employee, works_for, companies[(i as usize) % companies.len()]));
        triples.push(Triple::new(employee, salary, amount));
        if i % 50 == 0 {
            triples.push(Triple::new(employee, manages, companies[(i as usize / 50) % companies.len()]));
        }
    }
    let mut store = MemoryStore::new();
    store.build_from_triples(&triples);
    (dict, store)
}

fn sample_bgp(dict: &Dictionary) -> Vec<TriplePattern> {
    let id = |iri: &str| Term::Constant(dict.get_id(iri).unwrap_or(0));
    vec![
        (Term::var("e"), id("http://example.org/salary"), Term::var("s")),
        (Term::var("e"), id("http://example.org/worksFor"), Term::var("c")),
        (Term::var("c"), id("http://example.org/locatedIn"), id("http://example.org/city3")),
        (Term::var("m"), id("http://example.org/manages"), Term::var("c")),
    ]
}

fn my_benchmark(c: &mut Criterion) {
    let (dict, store) = setup_database();
    let stats = DatabaseStats::gather(&store, 100_000);
    let bgp = sample_bgp(&dict);
    let bound = FxHashSet::default();

    c.bench_function("greedy_order", |b| {
        b.iter(|| GreedyOptimizer::new(store.size()).order(black_box(&bgp), &bound))
    });
    c.bench_function("tree_width_order", |b| {
        b.iter(|| TreeWidthOptimizer::new(&stats).order(black_box(&bgp), &bound))
    });

    let registry = IndexRegistry::new(Arc::new(dict));
    let dataset = Dataset::new(Arc::new(store));
    let mut group = c.benchmark_group("sample-size-example");
    group.sample_size(10);

    for kind in [OptimizerKind::Greedy, OptimizerKind::TreeWidth] {
        let config = PlannerConfig {
            optimizer: kind,
            ..PlannerConfig::default()
        };
        let pattern = match decompose(&bgp, &registry, &config) {
            Ok(pattern) => pattern,
            Err(e) => panic!("decomposition failed: {}", e),
        };
        group.bench_function(format!("evaluate_{:?}", kind), |b| {
            b.iter(|| {
                let ctx = ExecutionContext::new(&dataset, &stats, &config);
                evaluate(&pattern, vec![Binding::new()], &ctx).map(|rows| rows.count())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, my_benchmark);
criterion_main!(benches);
