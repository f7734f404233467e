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
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use shared::vocab::INTERVAL_DATATYPE;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    Start,
    End,
}

/// Closed interval of milliseconds since the epoch, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemporalInterval {
    start: i64,
    end: i64,
}

impl TemporalInterval {
    pub fn new(start: i64, end: i64) -> Option<Self> {
        (start <= end).then_some(TemporalInterval { start, end })
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn start_instant(&self) -> TemporalInstant {
        TemporalInstant {
            millis: self.start,
            parent: Some((*self, Endpoint::Start)),
        }
    }

    pub fn end_instant(&self) -> TemporalInstant {
        TemporalInstant {
            millis: self.end,
            parent: Some((*self, Endpoint::End)),
        }
    }
}

/// A point in time, optionally one endpoint of a parent interval.
///
/// Instants order by time, then free instants before interval endpoints,
/// then starts before ends, then by parent interval, which makes the order
/// total over every endpoint an index can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemporalInstant {
    millis: i64,
    parent: Option<(TemporalInterval, Endpoint)>,
}

impl TemporalInstant {
    pub fn new(millis: i64) -> Self {
        TemporalInstant { millis, parent: None }
    }

    /// Smallest instant at `millis` in the total order.
    pub(crate) fn lowest_at(millis: i64) -> Self {
        TemporalInstant::new(millis)
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    pub fn parent(&self) -> Option<(TemporalInterval, Endpoint)> {
        self.parent
    }

    pub fn same_as(&self, other: &TemporalInstant) -> bool {
        self.millis == other.millis
    }

    pub fn less_than(&self, other: &TemporalInstant) -> bool {
        self.millis < other.millis
    }

    pub fn greater_than(&self, other: &TemporalInstant) -> bool {
        self.millis > other.millis
    }

    /// The extent this endpoint belongs to.
    pub fn owner(&self) -> TemporalExtent {
        match self.parent {
            Some((interval, _)) => TemporalExtent::Interval(interval),
            None => TemporalExtent::Instant(TemporalInstant::new(self.millis)),
        }
    }

    fn order_key(&self) -> (i64, Option<(Endpoint, TemporalInterval)>) {
        (self.millis, self.parent.map(|(interval, endpoint)| (endpoint, interval)))
    }
}

impl Ord for TemporalInstant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

impl PartialOrd for TemporalInstant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalExtent {
    Instant(TemporalInstant),
    Interval(TemporalInterval),
}

impl TemporalExtent {
    pub fn instant(millis: i64) -> Self {
        TemporalExtent::Instant(TemporalInstant::new(millis))
    }

    pub fn interval(start: i64, end: i64) -> Option<Self> {
        TemporalInterval::new(start, end).map(TemporalExtent::Interval)
    }

    pub fn start(&self) -> i64 {
        match self {
            TemporalExtent::Instant(i) => i.millis,
            TemporalExtent::Interval(i) => i.start,
        }
    }

    pub fn end(&self) -> i64 {
        match self {
            TemporalExtent::Instant(i) => i.millis,
            TemporalExtent::Interval(i) => i.end,
        }
    }

    pub fn is_instant(&self) -> bool {
        matches!(self, TemporalExtent::Instant(_))
    }

    pub fn is_interval(&self) -> bool {
        matches!(self, TemporalExtent::Interval(_))
    }

    /// Instants stored in the ordered endpoint set for this extent.
    pub fn endpoints(&self) -> Vec<TemporalInstant> {
        match self {
            TemporalExtent::Instant(i) => vec![TemporalInstant::new(i.millis)],
            TemporalExtent::Interval(i) => vec![i.start_instant(), i.end_instant()],
        }
    }
}

impl fmt::Display for TemporalExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalExtent::Instant(i) => write!(f, "{}", format_millis(i.millis)),
            TemporalExtent::Interval(i) => {
                write!(f, "{}/{}", format_millis(i.start), format_millis(i.end))
            }
        }
    }
}

fn format_millis(millis: i64) -> String {
    match DateTime::from_timestamp_millis(millis) {
        Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        None => millis.to_string(),
    }
}

/// Parses an xsd:dateTime lexical form; a missing offset means UTC.
pub fn parse_instant(lexical: &str) -> Result<i64> {
    let lexical = lexical.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(lexical) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(lexical, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc().timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(lexical, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc().timestamp_millis());
        }
    }
    Err(Error::Literal(format!("not a dateTime: {}", lexical)))
}

/// Parses `start/end` into an interval.
pub fn parse_interval(lexical: &str) -> Result<TemporalInterval> {
    let (start, end) = lexical
        .split_once('/')
        .ok_or_else(|| Error::Literal(format!("not an interval: {}", lexical)))?;
    let start = parse_instant(start)?;
    let end = parse_instant(end)?;
    TemporalInterval::new(start, end)
        .ok_or_else(|| Error::Literal(format!("interval ends before it starts: {}", lexical)))
}

/// Parses a literal into an extent, as an interval when typed as one or
/// written `start/end`.
pub fn parse_extent(lexical: &str, datatype: Option<&str>) -> Result<TemporalExtent> {
    if datatype == Some(INTERVAL_DATATYPE) || lexical.contains('/') {
        parse_interval(lexical).map(TemporalExtent::Interval)
    } else {
        parse_instant(lexical).map(TemporalExtent::instant)
    }
}
