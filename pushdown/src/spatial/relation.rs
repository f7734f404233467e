/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::spatial::geometry::envelope;
use crate::spatial::index::{MemorySpatialIndex, NodeIter};
use geo::algorithm::relate::IntersectionMatrix;
use geo::{Geometry, Relate};

/// GeoSPARQL topological relations: the simple-features family, the
/// Egenhofer family and RCC8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpatialRelation {
    SfEquals,
    SfDisjoint,
    SfIntersects,
    SfTouches,
    SfWithin,
    SfContains,
    SfOverlaps,
    SfCrosses,
    EhEquals,
    EhDisjoint,
    EhMeet,
    EhOverlap,
    EhCovers,
    EhCoveredBy,
    EhInside,
    EhContains,
    Rcc8Eq,
    Rcc8Dc,
    Rcc8Ec,
    Rcc8Po,
    Rcc8Tppi,
    Rcc8Tpp,
    Rcc8Ntpp,
    Rcc8Ntppi,
}

pub type SpatialNodes<'a> = Box<dyn Iterator<Item = u32> + 'a>;

impl SpatialRelation {
    pub const ALL: [SpatialRelation; 24] = [
        SpatialRelation::SfEquals,
        SpatialRelation::SfDisjoint,
        SpatialRelation::SfIntersects,
        SpatialRelation::SfTouches,
        SpatialRelation::SfWithin,
        SpatialRelation::SfContains,
        SpatialRelation::SfOverlaps,
        SpatialRelation::SfCrosses,
        SpatialRelation::EhEquals,
        SpatialRelation::EhDisjoint,
        SpatialRelation::EhMeet,
        SpatialRelation::EhOverlap,
        SpatialRelation::EhCovers,
        SpatialRelation::EhCoveredBy,
        SpatialRelation::EhInside,
        SpatialRelation::EhContains,
        SpatialRelation::Rcc8Eq,
        SpatialRelation::Rcc8Dc,
        SpatialRelation::Rcc8Ec,
        SpatialRelation::Rcc8Po,
        SpatialRelation::Rcc8Tppi,
        SpatialRelation::Rcc8Tpp,
        SpatialRelation::Rcc8Ntpp,
        SpatialRelation::Rcc8Ntppi,
    ];

    pub fn from_local_name(name: &str) -> Option<Self> {
        use SpatialRelation::*;
        Some(match name {
            "sfEquals" => SfEquals,
            "sfDisjoint" => SfDisjoint,
            "sfIntersects" => SfIntersects,
            "sfTouches" => SfTouches,
            "sfWithin" => SfWithin,
            "sfContains" => SfContains,
            "sfOverlaps" => SfOverlaps,
            "sfCrosses" => SfCrosses,
            "ehEquals" => EhEquals,
            "ehDisjoint" => EhDisjoint,
            "ehMeet" => EhMeet,
            "ehOverlap" => EhOverlap,
            "ehCovers" => EhCovers,
            "ehCoveredBy" => EhCoveredBy,
            "ehInside" => EhInside,
            "ehContains" => EhContains,
            "rcc8eq" => Rcc8Eq,
            "rcc8dc" => Rcc8Dc,
            "rcc8ec" => Rcc8Ec,
            "rcc8po" => Rcc8Po,
            "rcc8tppi" => Rcc8Tppi,
            "rcc8tpp" => Rcc8Tpp,
            "rcc8ntpp" => Rcc8Ntpp,
            "rcc8ntppi" => Rcc8Ntppi,
            _ => return None,
        })
    }

    /// DE-9IM patterns, any of which makes the relation hold. The simple
    /// features family is tested through the named matrix predicates instead,
    /// since overlaps and crosses depend on the operand dimensions.
    fn patterns(self) -> &'static [&'static str] {
        use SpatialRelation::*;
        match self {
            EhEquals | Rcc8Eq => &["TFFFTFFFT"],
            EhDisjoint => &["FF*FF****"],
            EhMeet => &["FT*******", "F**T*****", "F***T****"],
            EhOverlap => &["T*T***T**"],
            EhCovers => &["T*TFT*FF*"],
            EhCoveredBy => &["TFF*TFT**"],
            EhInside => &["TFF*FFT**"],
            EhContains => &["T*TFF*FF*"],
            Rcc8Dc => &["FFTFFTTTT"],
            Rcc8Ec => &["FFTFTTTTT"],
            Rcc8Po => &["TTTTTTTTT"],
            Rcc8Tppi => &["TTTFTTFFT"],
            Rcc8Tpp => &["TFFTTFTTT"],
            Rcc8Ntpp => &["TFFTFFTTT"],
            Rcc8Ntppi => &["TTTFFTFFT"],
            SfEquals | SfDisjoint | SfIntersects | SfTouches | SfWithin | SfContains | SfOverlaps | SfCrosses => &[],
        }
    }

    fn test(self, matrix: &IntersectionMatrix) -> bool {
        use SpatialRelation::*;
        match self {
            SfEquals => matrix.is_equal_topo(),
            SfDisjoint => matrix.is_disjoint(),
            SfIntersects => matrix.is_intersects(),
            SfTouches => matrix.is_touches(),
            SfWithin => matrix.is_within(),
            SfContains => matrix.is_contains(),
            SfOverlaps => matrix.is_overlaps(),
            SfCrosses => matrix.is_crosses(),
            _ => self
                .patterns()
                .iter()
                .any(|pattern| matrix.matches(pattern).unwrap_or(false)),
        }
    }

    /// Exact test of `x R y`.
    pub fn holds(self, x: &Geometry<f64>, y: &Geometry<f64>) -> bool {
        self.test(&x.relate(y))
    }

    /// Whether `x R y` needs the two geometries to share a point, which lets
    /// the bounding-box search stand in for a full scan.
    pub fn implies_intersection(self) -> bool {
        !matches!(
            self,
            SpatialRelation::SfDisjoint | SpatialRelation::EhDisjoint | SpatialRelation::Rcc8Dc
        )
    }

    fn candidates<'a>(self, index: &'a MemorySpatialIndex, other: &Geometry<f64>) -> NodeIter<'a> {
        if !self.implies_intersection() {
            return index.entries();
        }
        match envelope(other) {
            Some(bbox) => index.intersecting(&bbox),
            None => Box::new(std::iter::empty()),
        }
    }

    /// Every indexed `x` with `x R y`: the second argument is the bound one.
    pub fn bind_first_var<'a>(self, index: &'a MemorySpatialIndex, y: Geometry<f64>) -> SpatialNodes<'a> {
        let candidates = self.candidates(index, &y);
        Box::new(candidates.filter(move |(_, x)| self.holds(x, &y)).map(|(node, _)| node))
    }

    /// Every indexed `y` with `x R y`: the first argument is the bound one.
    pub fn bind_second_var<'a>(self, index: &'a MemorySpatialIndex, x: Geometry<f64>) -> SpatialNodes<'a> {
        let candidates = self.candidates(index, &x);
        Box::new(candidates.filter(move |(_, y)| self.holds(&x, y)).map(|(node, _)| node))
    }
}
