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
use serde::Deserialize;
use std::path::Path;

/// Which join-order optimizer plans generic triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    #[default]
    Greedy,
    TreeWidth,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub optimizer: OptimizerKind,
    /// Order sub-patterns by their estimates before evaluation.
    pub reorder_sub_patterns: bool,
    /// Split the residual generic pattern into variable-connected components.
    pub split_disconnected: bool,
    /// Enumerate the whole index when a property function has no bound argument.
    pub evaluate_doubly_unbound: bool,
    /// Overrides the store size used to normalise greedy costs.
    pub kb_size: Option<u64>,
    pub stats_sample_size: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            optimizer: OptimizerKind::Greedy,
            reorder_sub_patterns: true,
            split_disconnected: true,
            evaluate_doubly_unbound: true,
            kb_size: None,
            stats_sample_size: 100_000,
        }
    }
}

impl PlannerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PlannerConfig::from_toml_str(
            r#"
            optimizer = "tree_width"
            evaluate_doubly_unbound = false
            "#,
        )
        .unwrap();
        assert_eq!(config.optimizer, OptimizerKind::TreeWidth);
        assert!(!config.evaluate_doubly_unbound);
        assert!(config.reorder_sub_patterns);
        assert_eq!(config.stats_sample_size, 100_000);
        assert_eq!(config.kb_size, None);
    }

    #[test]
    fn test_unknown_optimizer_is_rejected() {
        let err = PlannerConfig::from_toml_str("optimizer = \"volcano\"").unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(PlannerConfig::from_toml_str("").unwrap(), PlannerConfig::default());
    }
}
