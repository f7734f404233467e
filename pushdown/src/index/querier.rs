/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::error::Result;
use crate::execution::BindingStream;
use shared::binding::Binding;
use shared::terms::TriplePattern;

/// An index that answers ordinary triples rather than property functions.
pub trait PatternQuerier: Send + Sync {
    fn name(&self) -> &str;

    /// Positions in `triples` this index answers.
    fn examine(&self, triples: &[TriplePattern]) -> Vec<usize>;

    /// Expected matches of one claimed triple under `binding`.
    fn estimate(&self, triple: &TriplePattern, binding: &Binding) -> u64;

    /// Extensions of `binding` matching one claimed triple.
    fn query<'a>(&'a self, triple: &TriplePattern, binding: &Binding) -> Result<BindingStream<'a>>;
}
