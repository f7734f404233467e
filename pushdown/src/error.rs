/*
 * Copyright © 2025 Volodymyr Kadzhaia
 * Copyright © 2025 Pieter Bonte
 * KU Leuven — Stream Intelligence Lab, Belgium
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed pattern: {0}")]
    MalformedPattern(String),

    #[error("constraint variable {variable} out of range (query declares {num_variables} variables)")]
    VariableOutOfRange { variable: usize, num_variables: usize },

    #[error("property function {0} has neither argument bound")]
    DoublyUnbound(String),

    #[error("index probe failed: {0}")]
    Probe(String),

    #[error("invalid literal: {0}")]
    Literal(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
