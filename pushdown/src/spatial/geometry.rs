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
use geo::{BoundingRect, Geometry};
use rstar::AABB;
use shared::vocab::GEO_WKT_LITERAL;
use std::str::FromStr;

pub type Envelope = AABB<[f64; 2]>;

/// Parses a `geo:wktLiteral` lexical form. A leading CRS IRI such as
/// `<http://www.opengis.net/def/crs/OGC/1.3/CRS84>` is accepted and ignored;
/// coordinates are taken as planar.
pub fn parse_wkt(lexical: &str) -> Result<Geometry<f64>> {
    let text = lexical.trim();
    let text = match text.strip_prefix('<') {
        Some(rest) => match rest.split_once('>') {
            Some((_, wkt)) => wkt.trim_start(),
            None => return Err(Error::Literal(format!("unterminated CRS IRI in {:?}", lexical))),
        },
        None => text,
    };
    let wkt = wkt::Wkt::<f64>::from_str(text).map_err(|e| Error::Literal(format!("{:?}: {}", lexical, e)))?;
    wkt.try_into()
        .map_err(|e: wkt::conversion::Error| Error::Literal(format!("{:?}: {}", lexical, e)))
}

/// Geometry of a literal, `None` unless it is a well-formed WKT literal.
pub fn literal_geometry(lexical: &str, datatype: Option<&str>) -> Option<Result<Geometry<f64>>> {
    (datatype == Some(GEO_WKT_LITERAL)).then(|| parse_wkt(lexical))
}

/// Bounding box of `geometry`; empty geometries have none.
pub fn envelope(geometry: &Geometry<f64>) -> Option<Envelope> {
    let rect = geometry.bounding_rect()?;
    Some(AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}
