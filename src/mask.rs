// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Positional wildcard masks.
//!
//! A mask fixes a symbol or a wildcard at each position. A sequence matches
//! a mask list when it matches at least one mask; the filter then keeps
//! either the matching or the non-matching sequences.

use crate::error::ValidationError;
use crate::symbol::{Sequence, SequenceSet, Symbol, SymbolSet, SEQUENCE_LEN};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Text encoding of the wildcard entry
pub const WILDCARD_CHAR: char = '#';

/// One position of a mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskEntry {
    /// Matches any symbol
    Any,
    /// Matches exactly this symbol
    Is(Symbol),
}

impl MaskEntry {
    pub fn from_char(c: char) -> Option<Self> {
        if c == WILDCARD_CHAR {
            Some(MaskEntry::Any)
        } else {
            Symbol::from_char(c).map(MaskEntry::Is)
        }
    }

    pub fn to_char(self) -> char {
        match self {
            MaskEntry::Any => WILDCARD_CHAR,
            MaskEntry::Is(symbol) => symbol.to_char(),
        }
    }

    #[inline(always)]
    pub fn accepts(self, symbol: Symbol) -> bool {
        match self {
            MaskEntry::Any => true,
            MaskEntry::Is(expected) => expected == symbol,
        }
    }
}

/// A per-position pattern of symbols and wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionMask([MaskEntry; SEQUENCE_LEN]);

impl PositionMask {
    /// Mask of wildcards only
    pub fn wildcard() -> Self {
        Self([MaskEntry::Any; SEQUENCE_LEN])
    }

    pub fn from_entries(entries: [MaskEntry; SEQUENCE_LEN]) -> Self {
        Self(entries)
    }

    /// Parse the 14-character text encoding; surrounding whitespace is ignored
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        let actual = text.chars().count();
        if actual != SEQUENCE_LEN {
            return Err(ValidationError::RecordLength {
                expected: SEQUENCE_LEN,
                actual,
            });
        }

        let mut entries = [MaskEntry::Any; SEQUENCE_LEN];
        for (i, c) in text.chars().enumerate() {
            entries[i] = MaskEntry::from_char(c).ok_or(ValidationError::RecordSymbol {
                column: i + 1,
                found: c,
            })?;
        }
        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[MaskEntry; SEQUENCE_LEN] {
        &self.0
    }

    /// Every position is a wildcard or equals the sequence's symbol
    #[inline]
    pub fn matches(&self, sequence: &Sequence) -> bool {
        self.0
            .iter()
            .zip(sequence.symbols())
            .all(|(entry, symbol)| entry.accepts(*symbol))
    }
}

impl FromStr for PositionMask {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PositionMask::parse(s)
    }
}

impl fmt::Display for PositionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.0 {
            write!(f, "{}", entry.to_char())?;
        }
        Ok(())
    }
}

/// Ordered mask list without duplicates
#[derive(Debug, Clone, Default)]
pub struct MaskSet {
    masks: Vec<PositionMask>,
    seen: HashSet<PositionMask>,
}

impl PartialEq for MaskSet {
    fn eq(&self, other: &Self) -> bool {
        self.masks == other.masks
    }
}

impl Eq for MaskSet {}

impl MaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `mask` unless an identical mask is already listed
    pub fn insert(&mut self, mask: PositionMask) -> bool {
        if !self.seen.insert(mask) {
            return false;
        }
        self.masks.push(mask);
        true
    }

    /// Expand per-position choices into masks and append the new ones
    ///
    /// A position with no symbol chosen becomes a wildcard; otherwise each
    /// chosen symbol yields its own mask (Cartesian product). Returns the
    /// number of masks actually added.
    pub fn add_from_choices(&mut self, choices: &[SymbolSet; SEQUENCE_LEN]) -> usize {
        let options: Vec<Vec<MaskEntry>> = choices
            .iter()
            .map(|set| {
                if set.is_empty() {
                    vec![MaskEntry::Any]
                } else {
                    set.symbols().into_iter().map(MaskEntry::Is).collect()
                }
            })
            .collect();

        let mut added = 0;
        let mut digits = [0usize; SEQUENCE_LEN];
        loop {
            let mut entries = [MaskEntry::Any; SEQUENCE_LEN];
            for pos in 0..SEQUENCE_LEN {
                entries[pos] = options[pos][digits[pos]];
            }
            if self.insert(PositionMask(entries)) {
                added += 1;
            }

            // Odometer step, last position fastest
            let mut pos = SEQUENCE_LEN;
            loop {
                if pos == 0 {
                    return added;
                }
                pos -= 1;
                digits[pos] += 1;
                if digits[pos] < options[pos].len() {
                    break;
                }
                digits[pos] = 0;
            }
        }
    }

    /// Remove the mask at `index`
    pub fn remove(&mut self, index: usize) -> Option<PositionMask> {
        if index >= self.masks.len() {
            return None;
        }
        let mask = self.masks.remove(index);
        self.seen.remove(&mask);
        Some(mask)
    }

    pub fn clear(&mut self) {
        self.masks.clear();
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PositionMask> {
        self.masks.iter()
    }

    pub fn contains(&self, mask: &PositionMask) -> bool {
        self.seen.contains(mask)
    }

    /// Matches at least one mask in the list
    pub fn matches(&self, sequence: &Sequence) -> bool {
        self.masks.iter().any(|m| m.matches(sequence))
    }
}

impl FromIterator<PositionMask> for MaskSet {
    fn from_iter<I: IntoIterator<Item = PositionMask>>(iter: I) -> Self {
        let mut set = MaskSet::new();
        for mask in iter {
            set.insert(mask);
        }
        set
    }
}

impl<'a> IntoIterator for &'a MaskSet {
    type Item = &'a PositionMask;
    type IntoIter = std::slice::Iter<'a, PositionMask>;

    fn into_iter(self) -> Self::IntoIter {
        self.masks.iter()
    }
}

/// What the mask filter retains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskMode {
    /// Sequences matching the mask list
    #[default]
    Keep,
    /// Sequences matching none of the masks
    Exclude,
}

impl FromStr for MaskMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keep" => Ok(MaskMode::Keep),
            "exclude" => Ok(MaskMode::Exclude),
            other => Err(format!("unknown mask mode: {}", other)),
        }
    }
}

/// Keep or exclude the sequences matching `masks`
pub fn apply_mask(
    data: &SequenceSet,
    masks: &MaskSet,
    mode: MaskMode,
) -> Result<SequenceSet, ValidationError> {
    if masks.is_empty() {
        return Err(ValidationError::EmptyMaskSet);
    }

    let keep_matching = mode == MaskMode::Keep;
    let kept = data.filtered(|sequence| masks.matches(sequence) == keep_matching);

    log::debug!(
        "mask filter ({:?}, {} masks): {} -> {} sequences",
        mode,
        masks.len(),
        data.len(),
        kept.len()
    );
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(text: &str) -> Sequence {
        Sequence::parse(text).unwrap()
    }

    fn mask(text: &str) -> PositionMask {
        PositionMask::parse(text).unwrap()
    }

    fn data() -> SequenceSet {
        ["33333333333333", "13333333333333", "03333333333330", "11111111111111"]
            .iter()
            .map(|t| seq(t))
            .collect()
    }

    #[test]
    fn test_mask_parse_and_display() {
        let m = mask("3#1#0#########");
        assert_eq!(m.to_string(), "3#1#0#########");
        assert_eq!(m.entries()[1], MaskEntry::Any);
        assert_eq!(m.entries()[2], MaskEntry::Is(Symbol::Draw));
        assert!(PositionMask::parse("3#1#0########").is_err());
        assert!(PositionMask::parse("3#1#0########x").is_err());
    }

    #[test]
    fn test_mask_matching() {
        let m = mask("3#############");
        assert!(m.matches(&seq("33333333333333")));
        assert!(m.matches(&seq("31000000000000")));
        assert!(!m.matches(&seq("13333333333333")));
    }

    #[test]
    fn test_insert_suppresses_duplicates() {
        let mut set = MaskSet::new();
        assert!(set.insert(mask("3#############")));
        assert!(!set.insert(mask("3#############")));
        assert!(set.insert(mask("1#############")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_add_from_choices_expands_product() {
        let mut choices = [SymbolSet::EMPTY; SEQUENCE_LEN];
        choices[0] = SymbolSet::FAVORABLE;
        choices[13] = SymbolSet::of(&[Symbol::Win, Symbol::Loss]);

        let mut set = MaskSet::new();
        set.insert(mask("1############0"));
        let added = set.add_from_choices(&choices);

        // 2 x 2 masks, one of them already listed
        assert_eq!(added, 3);
        assert_eq!(set.len(), 4);
        assert_eq!(set.iter().next().unwrap().to_string(), "1############0");
        assert!(set.contains(&mask("3############3")));

        assert_eq!(set.add_from_choices(&choices), 0);
    }

    #[test]
    fn test_add_from_empty_choices_is_wildcard() {
        let mut set = MaskSet::new();
        assert_eq!(set.add_from_choices(&[SymbolSet::EMPTY; SEQUENCE_LEN]), 1);
        assert_eq!(set.iter().next().unwrap(), &PositionMask::wildcard());
    }

    #[test]
    fn test_remove_allows_reinsert() {
        let mut set: MaskSet = vec![mask("3#############"), mask("1#############")]
            .into_iter()
            .collect();
        assert_eq!(set.remove(0), Some(mask("3#############")));
        assert_eq!(set.remove(5), None);
        assert!(set.insert(mask("3#############")));
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_keep_and_exclude() {
        let masks: MaskSet = vec![mask("3#############"), mask("#############0")]
            .into_iter()
            .collect();
        let kept = apply_mask(&data(), &masks, MaskMode::Keep).unwrap();
        let excluded = apply_mask(&data(), &masks, MaskMode::Exclude).unwrap();

        assert_eq!(kept.len(), 2);
        assert!(kept.contains(&seq("33333333333333")));
        assert!(kept.contains(&seq("03333333333330")));
        assert_eq!(excluded.len(), 2);
        assert!(excluded.contains(&seq("11111111111111")));
    }

    #[test]
    fn test_empty_mask_set_rejected() {
        assert_eq!(
            apply_mask(&data(), &MaskSet::new(), MaskMode::Keep).unwrap_err(),
            ValidationError::EmptyMaskSet
        );
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("KEEP".parse::<MaskMode>(), Ok(MaskMode::Keep));
        assert_eq!("exclude".parse::<MaskMode>(), Ok(MaskMode::Exclude));
        assert!("drop".parse::<MaskMode>().is_err());
    }
}
