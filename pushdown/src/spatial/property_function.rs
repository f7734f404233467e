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
use crate::spatial::geometry::literal_geometry;
use crate::spatial::index::MemorySpatialIndex;
use crate::spatial::operand::SpatialOperandFactory;
use crate::spatial::relation::SpatialRelation;
use geo::Geometry;
use shared::binding::Binding;
use shared::dictionary::Dictionary;
use shared::terms::{Term, TriplePattern};
use shared::vocab::GEO_NS;
use std::sync::Arc;

type Bindings<'a> = Box<dyn Iterator<Item = Binding> + 'a>;

/// Binds `root` to every node holding `geometry` when it is a free variable.
/// A bound or constant root survives only if it holds `geometry` itself.
/// `serialized` lists the WKT literals the pattern ties `root` to through
/// `geo:asWKT`; a node must have been read from each of them.
fn bind_root<'a>(
    index: &'a MemorySpatialIndex,
    root: &Term,
    geometry: &Geometry<f64>,
    serialized: Vec<u32>,
    binding: Binding,
) -> Bindings<'a> {
    let read_from = move |node: u32| serialized.iter().all(|&literal| index.serialization_of(node) == Some(literal));
    let node = match root {
        Term::Variable(name) => match binding.get(name) {
            Some(node) => node,
            None => {
                let name = name.clone();
                return Box::new(
                    index
                        .nodes_with(geometry)
                        .into_iter()
                        .filter(move |&node| read_from(node))
                        .filter_map(move |node| binding.extend(&name, node)),
                );
            }
        },
        Term::Constant(id) => *id,
    };
    if index.geometry_of(node).map_or(true, |held| held == geometry) && read_from(node) {
        Box::new(std::iter::once(binding))
    } else {
        Box::new(std::iter::empty())
    }
}

/// Literal objects of the `geo:asWKT` triples that define `operand`.
fn serializations(operand: &Operand<Geometry<f64>>) -> Vec<u32> {
    operand.triples().iter().filter_map(|(_, _, o)| o.as_constant()).collect()
}

/// Extends `binding` with `root = node`.
fn bind_node(root: &Term, node: u32, binding: &Binding) -> Option<Binding> {
    match root {
        Term::Variable(name) => binding.extend(name, node),
        Term::Constant(id) => (*id == node).then(|| binding.clone()),
    }
}

pub struct SpatialPropertyFunction {
    name: String,
    relation: SpatialRelation,
    index: Arc<MemorySpatialIndex>,
    operands: Arc<SpatialOperandFactory>,
}

impl PropertyFunction<Geometry<f64>> for SpatialPropertyFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn operand_factory(&self) -> &dyn OperandFactory<Geometry<f64>> {
        self.operands.as_ref()
    }

    fn supports_estimate(&self) -> bool {
        true
    }

    fn estimate(&self, subject: &Operand<Geometry<f64>>, object: &Operand<Geometry<f64>>) -> Option<u64> {
        let index = self.index.as_ref();
        Some(match (subject.representation(), object.representation()) {
            (Some(_), Some(_)) => 1,
            (Some(x), None) => self.relation.bind_second_var(index, x.clone()).count() as u64,
            (None, Some(y)) => self.relation.bind_first_var(index, y.clone()).count() as u64,
            (None, None) => index.size().saturating_mul(index.size()),
        })
    }

    fn evaluate<'a>(
        &'a self,
        binding: &Binding,
        subject: &Operand<Geometry<f64>>,
        object: &Operand<Geometry<f64>>,
        ctx: &ExecutionContext<'a>,
    ) -> Result<BindingStream<'a>> {
        let index: &'a MemorySpatialIndex = self.index.as_ref();
        let relation = self.relation;
        let subject_root = subject.root().clone();
        let object_root = object.root().clone();
        let subject_literals = serializations(subject);
        let object_literals = serializations(object);

        let bindings: Bindings<'a> = match (subject.representation().cloned(), object.representation().cloned()) {
            (Some(x), Some(y)) => {
                if !relation.holds(&x, &y) {
                    return Ok(Box::new(std::iter::empty()));
                }
                Box::new(
                    bind_root(index, &subject_root, &x, subject_literals, binding.clone())
                        .flat_map(move |b| bind_root(index, &object_root, &y, object_literals.clone(), b)),
                )
            }
            (Some(x), None) => Box::new(bind_root(index, &subject_root, &x, subject_literals, binding.clone()).flat_map(move |b| {
                let object_root = object_root.clone();
                relation
                    .bind_second_var(index, x.clone())
                    .filter_map(move |node| bind_node(&object_root, node, &b))
            })),
            (None, Some(y)) => Box::new(bind_root(index, &object_root, &y, object_literals, binding.clone()).flat_map(move |b| {
                let subject_root = subject_root.clone();
                relation
                    .bind_first_var(index, y.clone())
                    .filter_map(move |node| bind_node(&subject_root, node, &b))
            })),
            (None, None) => {
                if !ctx.config.evaluate_doubly_unbound {
                    return Err(Error::DoublyUnbound(self.name.clone()));
                }
                let binding = binding.clone();
                Box::new(index.entries().flat_map(move |(x_node, x)| {
                    let object_root = object_root.clone();
                    bind_node(&subject_root, x_node, &binding)
                        .into_iter()
                        .flat_map(move |b| {
                            let object_root = object_root.clone();
                            relation
                                .bind_second_var(index, x.clone())
                                .filter_map(move |node| bind_node(&object_root, node, &b))
                        })
                }))
            }
        };
        Ok(Box::new(bindings.map(Ok)))
    }
}

/// Property-function factory for the GeoSPARQL topological relations over
/// one spatial index.
pub struct SpatialFunctions {
    index: Arc<MemorySpatialIndex>,
    dictionary: Arc<Dictionary>,
    operands: Arc<SpatialOperandFactory>,
}

impl SpatialFunctions {
    pub fn new(index: Arc<MemorySpatialIndex>, dictionary: Arc<Dictionary>) -> Self {
        let operands = Arc::new(SpatialOperandFactory::new(index.clone(), dictionary.clone()));
        SpatialFunctions {
            index,
            dictionary,
            operands,
        }
    }

    fn check_literal_argument(&self, relation: &str, argument: &Term) -> Result<()> {
        let Term::Constant(id) = argument else {
            return Ok(());
        };
        let Some((lexical, datatype)) = self.dictionary.literal(*id) else {
            return Ok(());
        };
        match literal_geometry(lexical, datatype) {
            Some(Err(e)) => Err(Error::MalformedPattern(format!("argument of geo:{}: {}", relation, e))),
            _ => Ok(()),
        }
    }
}

impl PropertyFunctionFactory for SpatialFunctions {
    fn namespace(&self) -> &str {
        GEO_NS
    }

    fn instantiate(
        &self,
        predicate: &str,
        triple: &TriplePattern,
        available: &[TriplePattern],
        binding: &Binding,
        claim: &ClaimContext<'_>,
    ) -> Result<Claim> {
        let local = predicate.strip_prefix(GEO_NS).unwrap_or(predicate);
        let Some(relation) = SpatialRelation::from_local_name(local) else {
            return Ok(Claim::NotAFunction);
        };
        self.check_literal_argument(local, &triple.0)?;
        self.check_literal_argument(local, &triple.2)?;

        let function = Arc::new(SpatialPropertyFunction {
            name: format!("geo:{}", local),
            relation,
            index: self.index.clone(),
            operands: self.operands.clone(),
        });
        Ok(bind_property_function(function, triple, available, binding, claim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::index::PropertyFunctionInstance;
    use crate::spatial::geometry::parse_wkt;
    use crate::stats::DatabaseStats;
    use crate::store::{Dataset, MemoryStore};
    use shared::vocab::{GEO_AS_WKT, GEO_WKT_LITERAL};

    struct Fixture {
        functions: SpatialFunctions,
        dictionary: Arc<Dictionary>,
        region: u32,
        park: u32,
        harbour: u32,
        as_wkt: u32,
        inside_literal: u32,
        broken: u32,
    }

    fn fixture() -> Fixture {
        let mut dict = Dictionary::new();
        let as_wkt = dict.encode(GEO_AS_WKT);
        let region = dict.encode("http://example.org/region");
        let park = dict.encode("http://example.org/park");
        let harbour = dict.encode("http://example.org/harbour");
        let inside_literal = dict.encode_typed_literal("POINT(1 1)", GEO_WKT_LITERAL);
        let broken = dict.encode_typed_literal("POLYGON((0 0", GEO_WKT_LITERAL);
        let mut index = MemorySpatialIndex::new();
        index.add(region, parse_wkt("POLYGON((0 0, 10 0, 10 10, 0 10, 0 0))").unwrap());
        index.add(park, parse_wkt("POLYGON((1 1, 3 1, 3 3, 1 3, 1 1))").unwrap());
        index.add(harbour, parse_wkt("POINT(50 50)").unwrap());
        let dictionary = Arc::new(dict);
        Fixture {
            functions: SpatialFunctions::new(Arc::new(index), dictionary.clone()),
            dictionary,
            region,
            park,
            harbour,
            as_wkt,
            inside_literal,
            broken,
        }
    }

    fn claim(f: &Fixture, local: &str, bgp: &[TriplePattern], binding: &Binding) -> Result<Claim> {
        let is_literal = |id: u32| f.dictionary.is_literal(id);
        let context = ClaimContext {
            rdf_type: None,
            is_literal: &is_literal,
        };
        let predicate = format!("{}{}", GEO_NS, local);
        f.functions.instantiate(&predicate, &bgp[0], bgp, binding, &context)
    }

    fn claimed(outcome: Result<Claim>) -> Box<dyn PropertyFunctionInstance> {
        match outcome {
            Ok(Claim::Claimed(instance)) => instance,
            _ => panic!("expected a claim"),
        }
    }

    fn rows(instance: &dyn PropertyFunctionInstance, binding: Binding) -> Vec<Binding> {
        let dataset = Dataset::new(Arc::new(MemoryStore::new()));
        let stats = DatabaseStats::new();
        let config = PlannerConfig::default();
        let ctx = ExecutionContext::new(&dataset, &stats, &config);
        let mut rows: Vec<Binding> = instance.evaluate(binding, &ctx).map(|r| r.unwrap()).collect();
        rows.sort_by_key(|row| row.to_string());
        rows
    }

    #[test]
    fn test_vocabulary_is_not_a_function() {
        let f = fixture();
        let bgp = vec![(Term::var("g"), Term::Constant(f.as_wkt), Term::var("w"))];
        assert!(matches!(claim(&f, "asWKT", &bgp, &Binding::new()), Ok(Claim::NotAFunction)));
    }

    #[test]
    fn test_malformed_wkt_argument() {
        let f = fixture();
        let bgp = vec![(Term::var("x"), Term::var("p"), Term::Constant(f.broken))];
        assert!(matches!(claim(&f, "sfWithin", &bgp, &Binding::new()), Err(Error::MalformedPattern(_))));
    }

    #[test]
    fn test_estimates() {
        let f = fixture();
        let bgp = vec![(Term::var("x"), Term::var("p"), Term::var("y"))];
        let free = claimed(claim(&f, "sfWithin", &bgp, &Binding::new()));
        assert_eq!(free.estimate(), Some(9));

        // the park and the region itself lie within the region
        let bound = claimed(claim(&f, "sfWithin", &bgp, &Binding::new().with("y", f.region)));
        assert_eq!(bound.estimate(), Some(2));
    }

    #[test]
    fn test_within_binds_the_free_argument() {
        let f = fixture();
        let bgp = vec![(Term::var("x"), Term::var("p"), Term::var("y"))];
        let within = claimed(claim(&f, "sfWithin", &bgp, &Binding::new()));

        let inside = rows(within.as_ref(), Binding::new().with("y", f.region));
        assert_eq!(inside.len(), 2);
        assert!(inside.contains(&Binding::new().with("x", f.park).with("y", f.region)));
        assert!(inside.contains(&Binding::new().with("x", f.region).with("y", f.region)));

        let containers = rows(within.as_ref(), Binding::new().with("x", f.park));
        assert_eq!(containers.len(), 2);
        assert!(containers.contains(&Binding::new().with("x", f.park).with("y", f.park)));
        assert!(!containers.iter().any(|row| row.get("y") == Some(f.harbour)));

        // three reflexive pairs plus the park within the region
        assert_eq!(rows(within.as_ref(), Binding::new()).len(), 4);
    }

    #[test]
    fn test_disjoint_scans_every_node() {
        let f = fixture();
        let bgp = vec![(Term::Constant(f.harbour), Term::var("p"), Term::var("y"))];
        let disjoint = claimed(claim(&f, "sfDisjoint", &bgp, &Binding::new()));
        let mut found: Vec<u32> = rows(disjoint.as_ref(), Binding::new())
            .iter()
            .map(|row| row.get("y").unwrap())
            .collect();
        found.sort_unstable();
        let mut expected = vec![f.region, f.park];
        expected.sort_unstable();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_literal_and_defining_triple_arguments() {
        let f = fixture();
        let constant = vec![(Term::var("x"), Term::var("p"), Term::Constant(f.inside_literal))];
        let contains = claimed(claim(&f, "sfContains", &constant, &Binding::new()));
        assert_eq!(rows(contains.as_ref(), Binding::new()), vec![Binding::new().with("x", f.region)]);

        let defined = vec![
            (Term::var("x"), Term::var("p"), Term::var("g")),
            (Term::var("g"), Term::Constant(f.as_wkt), Term::Constant(f.inside_literal)),
        ];
        let contains = claimed(claim(&f, "sfContains", &defined, &Binding::new()));
        assert_eq!(contains.covering().len(), 2);
        // no stored node holds the point itself
        assert!(rows(contains.as_ref(), Binding::new()).is_empty());
    }

    #[test]
    fn test_repeated_variable() {
        let f = fixture();
        let bgp = vec![(Term::var("x"), Term::var("p"), Term::var("x"))];
        let within = claimed(claim(&f, "sfWithin", &bgp, &Binding::new()));
        // every geometry lies within itself
        assert_eq!(rows(within.as_ref(), Binding::new()).len(), 3);
        let disjoint = claimed(claim(&f, "sfDisjoint", &bgp, &Binding::new()));
        assert!(rows(disjoint.as_ref(), Binding::new()).is_empty());
    }
}
