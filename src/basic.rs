// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Basic range filter.
//!
//! Keeps the sequences whose features all fall inside inclusive bounds.

use crate::error::ValidationError;
use crate::features::{FeatureId, FeatureVector};
use crate::symbol::SequenceSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive bounds on one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub feature: FeatureId,
    pub min: u32,
    pub max: u32,
}

impl FilterCondition {
    pub fn new(feature: FeatureId, min: u32, max: u32) -> Self {
        Self { feature, min, max }
    }

    /// Exactly `value`.
    pub fn exactly(feature: FeatureId, value: u32) -> Self {
        Self::new(feature, value, value)
    }

    /// Reject `min > max`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min > self.max {
            return Err(ValidationError::InvertedBounds {
                feature: self.feature,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Whether the feature value lies inside the bounds.
    #[inline]
    pub fn matches(&self, features: &FeatureVector) -> bool {
        let value = features.get(self.feature);
        self.min <= value && value <= self.max
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <= {} <= {}", self.min, self.feature, self.max)
    }
}

/// Validate a condition list: non-empty, every `min <= max`.
pub fn validate_conditions(conditions: &[FilterCondition]) -> Result<(), ValidationError> {
    if conditions.is_empty() {
        return Err(ValidationError::NoConditions);
    }
    conditions.iter().try_for_each(FilterCondition::validate)
}

/// Keep the sequences satisfying every condition (logical AND).
pub fn apply_basic(
    data: &SequenceSet,
    conditions: &[FilterCondition],
) -> Result<SequenceSet, ValidationError> {
    validate_conditions(conditions)?;

    let kept = data.filtered(|sequence| {
        let features = FeatureVector::extract(sequence);
        conditions.iter().all(|c| c.matches(&features))
    });

    log::debug!(
        "basic filter: {} conditions, {} -> {} sequences",
        conditions.len(),
        data.len(),
        kept.len()
    );
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Sequence;

    fn set(texts: &[&str]) -> SequenceSet {
        texts.iter().map(|t| Sequence::parse(t).unwrap()).collect()
    }

    #[test]
    fn test_single_condition() {
        let data = set(&["33333333333333", "31313131313131"]);
        let kept = apply_basic(&data, &[FilterCondition::exactly(FeatureId::WinCount, 14)]).unwrap();
        assert_eq!(kept, set(&["33333333333333"]));
    }

    #[test]
    fn test_conditions_are_anded() {
        let data = set(&["33333331111111", "33311133311100", "00000000000000"]);
        let conditions = [
            FilterCondition::new(FeatureId::WinCount, 6, 7),
            FilterCondition::new(FeatureId::WinStreak, 0, 3),
        ];
        let kept = apply_basic(&data, &conditions).unwrap();
        assert_eq!(kept, set(&["33311133311100"]));
    }

    #[test]
    fn test_empty_conditions_rejected() {
        let data = set(&["33333333333333"]);
        assert_eq!(
            apply_basic(&data, &[]).unwrap_err(),
            ValidationError::NoConditions
        );
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let data = set(&["33333333333333"]);
        let err = apply_basic(&data, &[FilterCondition::new(FeatureId::LossCount, 4, 2)]).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedBounds { min: 4, max: 2, .. }));
    }

    #[test]
    fn test_bounds_inclusive() {
        let data = set(&["33300000000000", "33330000000000"]);
        let kept = apply_basic(&data, &[FilterCondition::new(FeatureId::WinStreak, 3, 4)]).unwrap();
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_display() {
        let c = FilterCondition::new(FeatureId::DrawCount, 4, 6);
        assert_eq!(c.to_string(), "4 <= DRAW_COUNT <= 6");
    }
}
