// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Core value types
//!
//! This module defines the types every other module works on:
//! - The three-symbol outcome alphabet
//! - Fixed-length outcome sequences and sets of them
//! - Per-position symbol subsets and the generator's position selector

use crate::error::ValidationError;
use std::collections::hash_set;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Number of events (positions) in every sequence
pub const SEQUENCE_LEN: usize = 14;

/// Outcome of a single event
///
/// Variant order matches the order of the text encoding (`'0' < '1' < '3'`),
/// so the derived `Ord` on sequences is the lexicographic order of their text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Symbol {
    /// Loss, encoded `'0'`
    Loss = 0,
    /// Draw, encoded `'1'`
    Draw = 1,
    /// Win, encoded `'3'`
    Win = 2,
}

impl Symbol {
    /// All symbols, in text-encoding order
    pub const ALL: [Symbol; 3] = [Symbol::Loss, Symbol::Draw, Symbol::Win];

    /// Decode from the text encoding
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '3' => Some(Symbol::Win),
            '1' => Some(Symbol::Draw),
            '0' => Some(Symbol::Loss),
            _ => None,
        }
    }

    /// Text encoding of the symbol
    pub fn to_char(self) -> char {
        match self {
            Symbol::Win => '3',
            Symbol::Draw => '1',
            Symbol::Loss => '0',
        }
    }

    /// Dense index in `0..3`
    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Win or draw
    #[inline(always)]
    pub fn is_favorable(self) -> bool {
        !matches!(self, Symbol::Loss)
    }

    #[inline(always)]
    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Win => write!(f, "WIN"),
            Symbol::Draw => write!(f, "DRAW"),
            Symbol::Loss => write!(f, "LOSS"),
        }
    }
}

/// A bitmasked subset of the three symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SymbolSet(u8);

impl SymbolSet {
    /// No symbol chosen
    pub const EMPTY: SymbolSet = SymbolSet(0);
    /// Every symbol
    pub const ALL: SymbolSet = SymbolSet(0b111);
    /// Win or draw
    pub const FAVORABLE: SymbolSet = SymbolSet(0b110);

    /// Subset holding exactly one symbol
    pub fn only(symbol: Symbol) -> Self {
        SymbolSet(symbol.bit())
    }

    /// Subset built from any list of symbols
    pub fn of(symbols: &[Symbol]) -> Self {
        symbols.iter().fold(SymbolSet::EMPTY, |set, s| set.with(*s))
    }

    /// Parse a subset from symbol characters, e.g. `"31"`
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let mut set = SymbolSet::EMPTY;
        for (column, c) in text.chars().enumerate() {
            let symbol = Symbol::from_char(c).ok_or(ValidationError::RecordSymbol {
                column: column + 1,
                found: c,
            })?;
            set = set.with(symbol);
        }
        Ok(set)
    }

    /// Copy of the subset with `symbol` added
    #[inline(always)]
    pub fn with(self, symbol: Symbol) -> Self {
        SymbolSet(self.0 | symbol.bit())
    }

    #[inline(always)]
    pub fn contains(self, symbol: Symbol) -> bool {
        self.0 & symbol.bit() != 0
    }

    #[inline(always)]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of symbols in the subset
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in text-encoding order
    pub fn symbols(self) -> Vec<Symbol> {
        Symbol::ALL
            .iter()
            .copied()
            .filter(|s| self.contains(*s))
            .collect()
    }
}

/// An immutable outcome sequence of exactly [`SEQUENCE_LEN`] symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sequence([Symbol; SEQUENCE_LEN]);

impl Sequence {
    /// Build a sequence from its symbols
    pub fn from_symbols(symbols: [Symbol; SEQUENCE_LEN]) -> Self {
        Self(symbols)
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

        let mut symbols = [Symbol::Loss; SEQUENCE_LEN];
        for (i, c) in text.chars().enumerate() {
            symbols[i] = Symbol::from_char(c).ok_or(ValidationError::RecordSymbol {
                column: i + 1,
                found: c,
            })?;
        }
        Ok(Self(symbols))
    }

    /// The symbols of the sequence
    #[inline(always)]
    pub fn symbols(&self) -> &[Symbol; SEQUENCE_LEN] {
        &self.0
    }

    /// Symbol at `position`
    #[inline(always)]
    pub fn at(&self, position: usize) -> Symbol {
        self.0[position]
    }
}

impl FromStr for Sequence {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sequence::parse(s)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.0 {
            write!(f, "{}", symbol.to_char())?;
        }
        Ok(())
    }
}

/// A collection of unique sequences
///
/// Iteration order is unspecified; use [`SequenceSet::sorted_view`] wherever
/// a stable enumeration is needed. The sorted view is built on first use and
/// kept until the set changes.
#[derive(Clone, Default)]
pub struct SequenceSet {
    items: HashSet<Sequence>,
    sorted: OnceLock<Vec<Sequence>>,
}

impl PartialEq for SequenceSet {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for SequenceSet {}

impl fmt::Debug for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceSet")
            .field("items", &self.items)
            .finish()
    }
}

impl SequenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: HashSet::with_capacity(capacity),
            sorted: OnceLock::new(),
        }
    }

    /// Insert a sequence; returns false if it was already present
    pub fn insert(&mut self, sequence: Sequence) -> bool {
        let inserted = self.items.insert(sequence);
        if inserted {
            self.sorted.take();
        }
        inserted
    }

    pub fn contains(&self, sequence: &Sequence) -> bool {
        self.items.contains(sequence)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> hash_set::Iter<'_, Sequence> {
        self.items.iter()
    }

    /// Lexicographically sorted members, cached until the next insert
    pub fn sorted_view(&self) -> &[Sequence] {
        self.sorted.get_or_init(|| {
            let mut view: Vec<Sequence> = self.items.iter().copied().collect();
            view.sort_unstable();
            view
        })
    }

    /// Owned copy of the sorted view
    pub fn sorted(&self) -> Vec<Sequence> {
        self.sorted_view().to_vec()
    }

    /// One page of the sorted view (1-based); out-of-range pages are empty
    pub fn page(&self, page: usize, page_size: usize) -> &[Sequence] {
        if page == 0 || page_size == 0 {
            return &[];
        }
        let view = self.sorted_view();
        let start = (page - 1).saturating_mul(page_size).min(view.len());
        let end = start.saturating_add(page_size).min(view.len());
        &view[start..end]
    }

    /// Number of pages of `page_size` items (at least 1)
    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 1;
        }
        ((self.len() + page_size - 1) / page_size).max(1)
    }

    /// Subset of members satisfying `predicate`
    pub fn filtered<F>(&self, mut predicate: F) -> SequenceSet
    where
        F: FnMut(&Sequence) -> bool,
    {
        self.items.iter().copied().filter(|s| predicate(s)).collect()
    }

    /// Members shared with `other`
    pub fn intersection(&self, other: &SequenceSet) -> SequenceSet {
        self.filtered(|s| other.contains(s))
    }

    /// Members of `self` not in `other`
    pub fn difference(&self, other: &SequenceSet) -> SequenceSet {
        self.filtered(|s| !other.contains(s))
    }

    /// Members of `self` and `other`
    pub fn union(&self, other: &SequenceSet) -> SequenceSet {
        let mut out = self.clone();
        out.extend(other.iter().copied());
        out
    }
}

impl FromIterator<Sequence> for SequenceSet {
    fn from_iter<I: IntoIterator<Item = Sequence>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
            sorted: OnceLock::new(),
        }
    }
}

impl Extend<Sequence> for SequenceSet {
    fn extend<I: IntoIterator<Item = Sequence>>(&mut self, iter: I) {
        self.items.extend(iter);
        self.sorted.take();
    }
}

impl IntoIterator for SequenceSet {
    type Item = Sequence;
    type IntoIter = hash_set::IntoIter<Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a SequenceSet {
    type Item = &'a Sequence;
    type IntoIter = hash_set::Iter<'a, Sequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Per-position allowed symbols for generation
///
/// Every position holds a non-empty subset: a position with nothing chosen
/// allows all three symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionSelector([SymbolSet; SEQUENCE_LEN]);

impl Default for PositionSelector {
    fn default() -> Self {
        Self::all()
    }
}

impl PositionSelector {
    /// Every symbol allowed at every position
    pub fn all() -> Self {
        Self([SymbolSet::ALL; SEQUENCE_LEN])
    }

    /// The same subset at every position
    pub fn uniform(allowed: SymbolSet) -> Self {
        Self::from_choices([allowed; SEQUENCE_LEN])
    }

    /// Build from raw per-position choices; empty choices become "all"
    pub fn from_choices(choices: [SymbolSet; SEQUENCE_LEN]) -> Self {
        let mut positions = choices;
        for set in positions.iter_mut() {
            if set.is_empty() {
                *set = SymbolSet::ALL;
            }
        }
        Self(positions)
    }

    /// Allow, at each position, the symbols seen there in `templates`
    pub fn from_templates(templates: &[Sequence]) -> Result<Self, ValidationError> {
        if templates.is_empty() {
            return Err(ValidationError::EmptyTemplate);
        }
        let mut choices = [SymbolSet::EMPTY; SEQUENCE_LEN];
        for template in templates {
            for (pos, symbol) in template.symbols().iter().enumerate() {
                choices[pos] = choices[pos].with(*symbol);
            }
        }
        Ok(Self::from_choices(choices))
    }

    /// Replace the subset at `position`; an empty subset means "all"
    pub fn set(&mut self, position: usize, allowed: SymbolSet) {
        self.0[position] = if allowed.is_empty() {
            SymbolSet::ALL
        } else {
            allowed
        };
    }

    /// Allowed symbols at `position`
    pub fn allowed(&self, position: usize) -> SymbolSet {
        self.0[position]
    }

    /// Size of the Cartesian product of all positions
    pub fn universe_size(&self) -> u64 {
        self.0.iter().map(|s| s.len() as u64).product()
    }
}
