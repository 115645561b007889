// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Engine configuration.

use crate::basic::FilterCondition;
use crate::error::{Result, SieveError};
use crate::features::FeatureId;
use crate::symbol::SEQUENCE_LEN;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Master configuration for an engine session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Batch generator settings.
    pub generator: GeneratorConfig,

    /// Mystic optimizer defaults.
    pub mystic: MysticConfig,

    /// Basic range filter presets.
    pub basic: BasicConfig,
}

impl EngineConfig {
    /// Load from a JSON file; missing sections fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SieveError::io(path, e))?;
        Self::from_json(&text)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| SieveError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SieveError::Config(e.to_string()))
    }

    /// Check every section for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if self.generator.batch_size == 0 {
            return Err(SieveError::Config(
                "generator.batch_size must be at least 1".to_string(),
            ));
        }
        self.mystic.params().validate()?;
        if self.mystic.position_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SieveError::Config(
                "mystic.position_weights must be non-negative numbers".to_string(),
            ));
        }
        for preset in &self.basic.presets {
            preset.condition.validate()?;
        }
        Ok(())
    }
}

/// Batch generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Candidates evaluated between two cancellation checks.
    pub batch_size: usize,

    /// Abort the run with an error once this many new candidates exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_new_candidates: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            max_new_candidates: None,
        }
    }
}

impl GeneratorConfig {
    /// Set the batch size (clamped to at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Cap the number of new candidates.
    pub fn with_max_new_candidates(mut self, max: usize) -> Self {
        self.max_new_candidates = Some(max);
        self
    }
}

/// Default tolerance weight of a loss at each position.
pub const DEFAULT_POSITION_WEIGHTS: [f64; SEQUENCE_LEN] = [
    0.8, 0.9, 1.0, 1.1, //
    0.7, 0.8, 0.9, 1.0, //
    0.6, 0.7, 0.5, 0.6, //
    0.4, 0.5,
];

/// Mystic optimizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MysticConfig {
    /// Number of anchor positions (1-14).
    pub anchor_count: usize,

    /// Maximum weighted loss (0-5).
    pub max_tolerance: f64,

    /// Percentage of the ranked pool kept (0-100).
    pub strength: u32,

    /// Sample size for previews.
    pub preview_size: usize,

    /// Weight of a loss at each position.
    pub position_weights: [f64; SEQUENCE_LEN],
}

impl Default for MysticConfig {
    fn default() -> Self {
        Self {
            anchor_count: 5,
            max_tolerance: 3.0,
            strength: 50,
            preview_size: 5,
            position_weights: DEFAULT_POSITION_WEIGHTS,
        }
    }
}

impl MysticConfig {
    /// Run parameters carried by this configuration.
    pub fn params(&self) -> crate::mystic::MysticParams {
        crate::mystic::MysticParams {
            anchor_count: self.anchor_count,
            max_tolerance: self.max_tolerance,
            strength: self.strength,
        }
    }
}

/// A basic filter condition with its default enabled state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConditionPreset {
    pub condition: FilterCondition,
    pub enabled: bool,
}

/// Basic range filter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BasicConfig {
    /// One preset per feature, in display order.
    pub presets: Vec<ConditionPreset>,
}

impl Default for BasicConfig {
    fn default() -> Self {
        let ranges = [
            (FeatureId::WinCount, 5, 7, true),
            (FeatureId::DrawCount, 4, 6, true),
            (FeatureId::LossCount, 3, 6, true),
            (FeatureId::WinStreak, 1, 5, false),
            (FeatureId::DrawStreak, 1, 3, false),
            (FeatureId::LossStreak, 1, 3, false),
            (FeatureId::WinOrDrawStreak, 2, 8, false),
            (FeatureId::WinOrLossStreak, 2, 8, false),
            (FeatureId::DrawOrLossStreak, 0, 7, false),
        ];
        Self {
            presets: ranges
                .iter()
                .map(|&(feature, min, max, enabled)| ConditionPreset {
                    condition: FilterCondition { feature, min, max },
                    enabled,
                })
                .collect(),
        }
    }
}

impl BasicConfig {
    /// Conditions of the enabled presets.
    pub fn active_conditions(&self) -> Vec<FilterCondition> {
        self.presets
            .iter()
            .filter(|p| p.enabled)
            .map(|p| p.condition)
            .collect()
    }

    /// Enable or disable the preset for `feature`.
    pub fn set_enabled(&mut self, feature: FeatureId, enabled: bool) {
        for preset in self.presets.iter_mut() {
            if preset.condition.feature == feature {
                preset.enabled = enabled;
            }
        }
    }
}
