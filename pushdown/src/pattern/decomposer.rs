/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::config::PlannerConfig;
use crate::error::{Error, Result};
use crate::index::{Claim, ClaimContext, IndexRegistry};
use crate::pattern::{BgpSubPattern, GraphSubPattern, IndexPattern, IndexSubPattern};
use log::debug;
use shared::binding::Binding;
use shared::terms::{pattern_variables, shares_variable, TriplePattern};

/// Splits a BGP into index-claimed and generic sub-patterns.
pub struct Decomposer<'r> {
    registry: &'r IndexRegistry,
    config: &'r PlannerConfig,
}

impl<'r> Decomposer<'r> {
    pub fn new(registry: &'r IndexRegistry, config: &'r PlannerConfig) -> Self {
        Decomposer { registry, config }
    }

    pub fn decompose(&self, bgp: &[TriplePattern], binding: &Binding) -> Result<IndexPattern> {
        self.decompose_scoped(bgp, None, binding)
    }

    /// Decomposes a BGP evaluated inside the named graph `graph`.
    pub fn decompose_in_graph(&self, bgp: &[TriplePattern], graph: u32, binding: &Binding) -> Result<IndexPattern> {
        self.decompose_scoped(bgp, Some(graph), binding)
    }

    fn decompose_scoped(&self, bgp: &[TriplePattern], graph: Option<u32>, binding: &Binding) -> Result<IndexPattern> {
        let mut claimed = vec![false; bgp.len()];
        let mut sub_patterns = self.claim_property_functions(bgp, binding, &mut claimed)?;

        for querier in self.registry.queriers() {
            let open: Vec<usize> = (0..bgp.len()).filter(|&i| !claimed[i]).collect();
            let candidates: Vec<TriplePattern> = open.iter().map(|&i| bgp[i].clone()).collect();
            let picked = querier.examine(&candidates);
            if picked.is_empty() {
                continue;
            }
            let mut triples = Vec::with_capacity(picked.len());
            for local in picked {
                let position = open[local];
                claimed[position] = true;
                triples.push(bgp[position].clone());
            }
            debug!("querier {} claims {} triples", querier.name(), triples.len());
            sub_patterns.push(IndexSubPattern::GenericBgp(BgpSubPattern {
                triples,
                querier: Some(querier.clone()),
            }));
        }

        let residual: Vec<TriplePattern> = (0..bgp.len())
            .filter(|&i| !claimed[i])
            .map(|i| bgp[i].clone())
            .collect();
        if !residual.is_empty() {
            sub_patterns.push(match graph {
                Some(graph) => IndexSubPattern::GraphScoped(GraphSubPattern {
                    graph,
                    triples: residual,
                }),
                None => IndexSubPattern::generic(residual),
            });
        }

        if self.config.split_disconnected {
            sub_patterns = split_by_subgraph(sub_patterns);
        }
        if self.config.reorder_sub_patterns && sub_patterns.len() > 1 {
            sub_patterns = reorder(sub_patterns);
        }

        let pattern = IndexPattern::new(bgp.to_vec(), sub_patterns);
        debug_assert!(pattern.verify_coverage());
        Ok(pattern)
    }

    fn claim_property_functions(
        &self,
        bgp: &[TriplePattern],
        binding: &Binding,
        claimed: &mut [bool],
    ) -> Result<Vec<IndexSubPattern>> {
        let dictionary = self.registry.dictionary();
        let is_literal = |id: u32| dictionary.is_literal(id);
        let context = ClaimContext {
            rdf_type: self.registry.rdf_type(),
            is_literal: &is_literal,
        };

        let mut sub_patterns = Vec::new();
        for i in 0..bgp.len() {
            if claimed[i] {
                continue;
            }
            let Some(predicate) = bgp[i].1.as_constant() else {
                continue;
            };
            let Some((factory, iri)) = self.registry.factory_for(predicate) else {
                continue;
            };

            let available: Vec<TriplePattern> = (0..bgp.len())
                .filter(|&j| !claimed[j])
                .map(|j| bgp[j].clone())
                .collect();
            let instance = match factory.instantiate(iri, &bgp[i], &available, binding, &context)? {
                Claim::Claimed(instance) => instance,
                Claim::Abandoned | Claim::NotAFunction => continue,
            };

            claimed[i] = true;
            for triple in instance.covering().iter().skip(1) {
                let position = (0..bgp.len())
                    .find(|&j| !claimed[j] && bgp[j] == *triple)
                    .ok_or_else(|| {
                        Error::MalformedPattern(format!(
                            "{} claimed {:?}, which is not an open triple of the pattern",
                            instance.name(),
                            triple
                        ))
                    })?;
                claimed[position] = true;
            }

            sub_patterns.push(if instance.supports_estimate() {
                IndexSubPattern::EstimablePropertyFunction(instance)
            } else {
                IndexSubPattern::PropertyFunction(instance)
            });
        }
        Ok(sub_patterns)
    }
}

/// Decomposes `bgp` for evaluation against the default graph.
pub fn decompose(bgp: &[TriplePattern], registry: &IndexRegistry, config: &PlannerConfig) -> Result<IndexPattern> {
    Decomposer::new(registry, config).decompose(bgp, &Binding::new())
}

/// Groups triples into variable-connected partitions, keeping BGP order
/// inside each; variable-free triples each get their own partition.
fn partition(triples: Vec<TriplePattern>) -> Vec<Vec<TriplePattern>> {
    let mut groups: Vec<(Vec<String>, Vec<(usize, TriplePattern)>)> = Vec::new();
    let mut ground: Vec<Vec<TriplePattern>> = Vec::new();

    for (position, triple) in triples.into_iter().enumerate() {
        let vars: Vec<String> = pattern_variables(&triple).into_iter().map(str::to_string).collect();
        if vars.is_empty() {
            ground.push(vec![triple]);
            continue;
        }
        let linked: Vec<usize> = groups
            .iter()
            .enumerate()
            .filter(|(_, (group_vars, _))| vars.iter().any(|v| group_vars.contains(v)))
            .map(|(i, _)| i)
            .collect();

        let Some(&first) = linked.first() else {
            groups.push((vars, vec![(position, triple)]));
            continue;
        };
        // merge later linked groups into the first one, back to front
        for &other in linked.iter().skip(1).rev() {
            let (other_vars, other_triples) = groups.remove(other);
            let (group_vars, group_triples) = &mut groups[first];
            for v in other_vars {
                if !group_vars.contains(&v) {
                    group_vars.push(v);
                }
            }
            group_triples.extend(other_triples);
        }
        let (group_vars, group_triples) = &mut groups[first];
        for v in vars {
            if !group_vars.contains(&v) {
                group_vars.push(v);
            }
        }
        group_triples.push((position, triple));
    }

    let mut result: Vec<Vec<TriplePattern>> = groups
        .into_iter()
        .map(|(_, mut triples)| {
            triples.sort_unstable_by_key(|(position, _)| *position);
            triples.into_iter().map(|(_, triple)| triple).collect()
        })
        .collect();
    result.extend(ground);
    result
}

fn split_by_subgraph(sub_patterns: Vec<IndexSubPattern>) -> Vec<IndexSubPattern> {
    let mut result = Vec::with_capacity(sub_patterns.len());
    for sub_pattern in sub_patterns {
        match sub_pattern {
            IndexSubPattern::GenericBgp(BgpSubPattern { triples, querier }) => {
                for part in partition(triples) {
                    result.push(IndexSubPattern::GenericBgp(BgpSubPattern {
                        triples: part,
                        querier: querier.clone(),
                    }));
                }
            }
            IndexSubPattern::GraphScoped(GraphSubPattern { graph, triples }) => {
                for part in partition(triples) {
                    result.push(IndexSubPattern::GraphScoped(GraphSubPattern { graph, triples: part }));
                }
            }
            other => result.push(other),
        }
    }
    result
}

fn linked(a: &IndexSubPattern, b: &IndexSubPattern) -> bool {
    a.triples()
        .iter()
        .any(|x| b.triples().iter().any(|y| shares_variable(x, y)))
}

/// Repeatedly takes the cheapest remaining sub-pattern (unestimable ones
/// count as `u64::MAX`, first minimum wins) followed by every remaining
/// sub-pattern sharing a variable with it.
fn reorder(sub_patterns: Vec<IndexSubPattern>) -> Vec<IndexSubPattern> {
    let mut remaining: Vec<(u64, IndexSubPattern)> = sub_patterns
        .into_iter()
        .map(|p| (p.estimate().unwrap_or(u64::MAX), p))
        .collect();
    let mut reordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let mut min_index = 0;
        let mut min_estimate = u64::MAX;
        for (i, (estimate, _)) in remaining.iter().enumerate() {
            if *estimate < min_estimate {
                min_index = i;
                min_estimate = *estimate;
            }
        }
        let (_, chosen) = remaining.remove(min_index);
        debug!("reorder: next sub-pattern with estimate {}", min_estimate);

        let mut followers = Vec::new();
        let mut i = 0;
        while i < remaining.len() {
            if linked(&chosen, &remaining[i].1) {
                followers.push(remaining.remove(i).1);
            } else {
                i += 1;
            }
        }
        reordered.push(chosen);
        reordered.extend(followers);
    }
    reordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::terms::Term;

    fn t(s: &str, p: u32, o: &str) -> TriplePattern {
        (Term::var(s), Term::Constant(p), Term::var(o))
    }

    #[test]
    fn test_partition_merges_bridged_groups() {
        let triples = vec![
            t("a", 1, "b"),
            t("c", 1, "d"),
            (Term::Constant(5), Term::Constant(1), Term::Constant(6)),
            t("b", 2, "c"),
            t("x", 3, "y"),
        ];
        let parts = partition(triples);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], vec![t("a", 1, "b"), t("c", 1, "d"), t("b", 2, "c")]);
        assert_eq!(parts[1], vec![t("x", 3, "y")]);
        assert_eq!(parts[2].len(), 1);
    }

    #[test]
    fn test_partition_keeps_bgp_order_after_merge() {
        let bgp = vec![t("a", 1, "b"), t("c", 1, "d"), t("a", 1, "e"), t("b", 1, "c")];
        let parts = partition(bgp.clone());
        assert_eq!(parts, vec![bgp]);
    }

    #[test]
    fn test_reorder_appends_linked_after_minimum() {
        let patterns = vec![
            IndexSubPattern::generic(vec![t("a", 1, "b")]),
            IndexSubPattern::generic(vec![t("x", 1, "y")]),
            IndexSubPattern::generic(vec![t("b", 1, "c")]),
        ];
        let reordered = reorder(patterns);
        // all unestimable: first wins, then the pattern linked through ?b
        assert_eq!(reordered[0].triples()[0], t("a", 1, "b"));
        assert_eq!(reordered[1].triples()[0], t("b", 1, "c"));
        assert_eq!(reordered[2].triples()[0], t("x", 1, "y"));
    }
}
