/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Allen's interval relations and the OWL-Time point/interval relations.
//!
//! Every relation is evaluated in two phases: an ordered range probe on the
//! endpoint index that over-approximates the candidates, then [`TemporalRelation::holds`]
//! as the exact inclusion decider.

use crate::temporal::extent::TemporalExtent;
use crate::temporal::index::{ExtentIter, MemoryTemporalIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalRelation {
    Before,
    After,
    Meets,
    MetBy,
    Overlaps,
    OverlappedBy,
    Starts,
    StartedBy,
    During,
    Contains,
    Finishes,
    FinishedBy,
    Equals,
    /// Interval `x` begins at instant `y`.
    HasBeginning,
    /// Instant `x` is the beginning of interval `y`.
    BeginningOf,
    /// Interval `x` ends at instant `y`.
    HasEnd,
    /// Instant `x` is the end of interval `y`.
    EndOf,
    /// Instant `y` lies strictly inside interval `x`.
    Inside,
    /// Instant `x` lies strictly inside interval `y`.
    Within,
}

impl TemporalRelation {
    pub const ALL: [TemporalRelation; 19] = [
        TemporalRelation::Before,
        TemporalRelation::After,
        TemporalRelation::Meets,
        TemporalRelation::MetBy,
        TemporalRelation::Overlaps,
        TemporalRelation::OverlappedBy,
        TemporalRelation::Starts,
        TemporalRelation::StartedBy,
        TemporalRelation::During,
        TemporalRelation::Contains,
        TemporalRelation::Finishes,
        TemporalRelation::FinishedBy,
        TemporalRelation::Equals,
        TemporalRelation::HasBeginning,
        TemporalRelation::BeginningOf,
        TemporalRelation::HasEnd,
        TemporalRelation::EndOf,
        TemporalRelation::Inside,
        TemporalRelation::Within,
    ];

    /// Relation named by an OWL-Time local name.
    pub fn from_local_name(name: &str) -> Option<Self> {
        use TemporalRelation::*;
        Some(match name {
            "before" | "intervalBefore" => Before,
            "after" | "intervalAfter" => After,
            "intervalMeets" => Meets,
            "intervalMetBy" => MetBy,
            "intervalOverlaps" => Overlaps,
            "intervalOverlappedBy" => OverlappedBy,
            "intervalStarts" => Starts,
            "intervalStartedBy" => StartedBy,
            "intervalDuring" => During,
            "intervalContains" => Contains,
            "intervalFinishes" => Finishes,
            "intervalFinishedBy" => FinishedBy,
            "intervalEquals" => Equals,
            "hasBeginning" => HasBeginning,
            "hasEnd" => HasEnd,
            "inside" => Inside,
            _ => return None,
        })
    }

    pub fn inverse(self) -> Self {
        use TemporalRelation::*;
        match self {
            Before => After,
            After => Before,
            Meets => MetBy,
            MetBy => Meets,
            Overlaps => OverlappedBy,
            OverlappedBy => Overlaps,
            Starts => StartedBy,
            StartedBy => Starts,
            During => Contains,
            Contains => During,
            Finishes => FinishedBy,
            FinishedBy => Finishes,
            Equals => Equals,
            HasBeginning => BeginningOf,
            BeginningOf => HasBeginning,
            HasEnd => EndOf,
            EndOf => HasEnd,
            Inside => Within,
            Within => Inside,
        }
    }

    /// Exact test of `x R y`.
    pub fn holds(self, x: &TemporalExtent, y: &TemporalExtent) -> bool {
        use TemporalRelation::*;
        let (xs, xe, ys, ye) = (x.start(), x.end(), y.start(), y.end());
        let intervals = x.is_interval() && y.is_interval();
        match self {
            Before => xe < ys,
            After => xs > ye,
            Meets => intervals && xe == ys,
            MetBy => intervals && xs == ye,
            Overlaps => intervals && xs < ys && ys < xe && xe < ye,
            OverlappedBy => intervals && ys < xs && xs < ye && ye < xe,
            Starts => intervals && xs == ys && xe < ye,
            StartedBy => intervals && xs == ys && xe > ye,
            During => intervals && ys < xs && xe < ye,
            Contains => intervals && xs < ys && ye < xe,
            Finishes => intervals && xe == ye && xs > ys,
            FinishedBy => intervals && xe == ye && xs < ys,
            Equals => intervals && xs == ys && xe == ye,
            HasBeginning => x.is_interval() && y.is_instant() && xs == ys,
            BeginningOf => x.is_instant() && y.is_interval() && xs == ys,
            HasEnd => x.is_interval() && y.is_instant() && xe == ye,
            EndOf => x.is_instant() && y.is_interval() && xe == ye,
            Inside => x.is_interval() && y.is_instant() && xs < ys && ys < xe,
            Within => x.is_instant() && y.is_interval() && ys < xs && xs < ye,
        }
    }

    /// Range probe whose results include every `x` with `x R y`.
    fn candidates<'a>(self, index: &'a MemoryTemporalIndex, y: &TemporalExtent) -> ExtentIter<'a> {
        use TemporalRelation::*;
        let (ys, ye) = (y.start(), y.end());
        match self {
            Before => index.before_finish(ys),
            After => index.after_start(ye),
            Meets => index.at_finish(ys),
            MetBy => index.at_start(ye),
            Overlaps => index.between_finishes(ys, ye),
            OverlappedBy | During => index.between_starts(ys, ye),
            Starts | StartedBy | Equals | HasBeginning | BeginningOf => index.at_start(ys),
            Contains | Inside => index.before_start(ys),
            Finishes | FinishedBy | HasEnd | EndOf => index.at_finish(ye),
            Within => index.between_starts(ys, ye),
        }
    }

    /// Every indexed `x` with `x R y`: the second argument is the bound one.
    pub fn bind_first_var<'a>(self, index: &'a MemoryTemporalIndex, y: TemporalExtent) -> ExtentIter<'a> {
        Box::new(
            self.candidates(index, &y)
                .filter(move |x| self.holds(x, &y)),
        )
    }

    /// Every indexed `y` with `x R y`: the first argument is the bound one.
    pub fn bind_second_var<'a>(self, index: &'a MemoryTemporalIndex, x: TemporalExtent) -> ExtentIter<'a> {
        self.inverse().bind_first_var(index, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TemporalRelation::*;

    fn iv(start: i64, end: i64) -> TemporalExtent {
        TemporalExtent::interval(start, end).unwrap()
    }

    fn at(t: i64) -> TemporalExtent {
        TemporalExtent::instant(t)
    }

    fn index_of(extents: &[TemporalExtent]) -> MemoryTemporalIndex {
        let mut index = MemoryTemporalIndex::new();
        for (node, extent) in extents.iter().enumerate() {
            index.add(node as u32, *extent);
        }
        index
    }

    fn sorted(iter: ExtentIter<'_>) -> Vec<(i64, i64)> {
        let mut v: Vec<(i64, i64)> = iter.map(|e| (e.start(), e.end())).collect();
        v.sort();
        v
    }

    #[test]
    fn test_thirteen_relations_are_exclusive() {
        let y = iv(10, 20);
        let xs = [
            iv(0, 5), iv(0, 10), iv(0, 15), iv(10, 15), iv(12, 15), iv(15, 20),
            iv(10, 20), iv(5, 20), iv(10, 25), iv(5, 25), iv(15, 25), iv(20, 25), iv(22, 30),
        ];
        let allen = &TemporalRelation::ALL[..13];
        for x in xs {
            let matching: Vec<_> = allen.iter().filter(|r| r.holds(&x, &y)).collect();
            assert_eq!(matching.len(), 1, "{:?} vs {:?}: {:?}", x, y, matching);
        }
    }

    #[test]
    fn test_finishes_probe() {
        let index = index_of(&[iv(0, 20), iv(12, 20), iv(10, 20), iv(15, 30)]);
        assert_eq!(sorted(Finishes.bind_first_var(&index, iv(10, 20))), vec![(12, 20)]);
        assert_eq!(sorted(Finishes.bind_second_var(&index, iv(12, 20))), vec![(0, 20), (10, 20)]);
    }

    #[test]
    fn test_before_mixes_instants_and_intervals() {
        let index = index_of(&[iv(0, 5), at(7), iv(8, 12), at(10)]);
        assert_eq!(sorted(Before.bind_first_var(&index, iv(10, 11))), vec![(0, 5), (7, 7)]);
        assert_eq!(sorted(After.bind_first_var(&index, at(7))), vec![(8, 12), (10, 10)]);
    }

    #[test]
    fn test_point_interval_relations() {
        let index = index_of(&[iv(0, 10), iv(0, 4), at(0), at(5), at(10)]);
        assert_eq!(sorted(HasBeginning.bind_first_var(&index, at(0))), vec![(0, 4), (0, 10)]);
        assert_eq!(sorted(HasBeginning.bind_second_var(&index, iv(0, 10))), vec![(0, 0)]);
        assert_eq!(sorted(HasEnd.bind_second_var(&index, iv(0, 10))), vec![(10, 10)]);
        assert_eq!(sorted(Inside.bind_second_var(&index, iv(0, 10))), vec![(5, 5)]);
        assert_eq!(sorted(Inside.bind_first_var(&index, at(5))), vec![(0, 10)]);
    }

    #[test]
    fn test_every_relation_matches_brute_force() {
        let extents = [
            iv(0, 5), iv(0, 10), iv(5, 10), iv(3, 7), iv(5, 5), iv(10, 12), iv(2, 12),
            at(0), at(5), at(10), at(12),
        ];
        let index = index_of(&extents);
        for relation in TemporalRelation::ALL {
            for y in extents {
                let mut expected: Vec<(i64, i64)> = extents
                    .iter()
                    .filter(|x| relation.holds(x, &y))
                    .map(|x| (x.start(), x.end()))
                    .collect();
                expected.sort();
                assert_eq!(sorted(relation.bind_first_var(&index, y)), expected, "{:?} first {:?}", relation, y);
            }
        }
    }

    #[test]
    fn test_local_names() {
        assert_eq!(TemporalRelation::from_local_name("intervalDuring"), Some(During));
        assert_eq!(TemporalRelation::from_local_name("before"), Some(Before));
        assert_eq!(TemporalRelation::from_local_name("inXSDDateTimeStamp"), None);
        for relation in TemporalRelation::ALL {
            assert_eq!(relation.inverse().inverse(), relation);
        }
    }
}
