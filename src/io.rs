// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Line-delimited persistence.
//!
//! Sequence files and template files are strict: the first malformed line
//! rejects the whole file. Mask files are lenient: malformed lines are
//! skipped and counted. Writes go through a temporary file in the target
//! directory that is renamed over the destination, so a failed write never
//! leaves a truncated file behind.

use crate::error::{Result, SieveError, ValidationError};
use crate::mask::{MaskSet, PositionMask};
use crate::symbol::{PositionSelector, Sequence, SequenceSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Non-blank lines with their 1-based line numbers.
fn records(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SieveError::io(path, e))
}

/// Parse sequences, one per line; blank lines are ignored.
pub fn parse_sequences(text: &str) -> std::result::Result<SequenceSet, ValidationError> {
    let mut set = SequenceSet::new();
    for (line, record) in records(text) {
        let sequence = Sequence::parse(record).map_err(|e| e.at_line(line))?;
        set.insert(sequence);
    }
    Ok(set)
}

pub fn read_sequences(path: impl AsRef<Path>) -> Result<SequenceSet> {
    let path = path.as_ref();
    let set = parse_sequences(&read_text(path)?)?;
    log::info!("loaded {} sequences from {}", set.len(), path.display());
    Ok(set)
}

/// Write `set` in sorted order, one sequence per line.
pub fn write_sequences(path: impl AsRef<Path>, set: &SequenceSet) -> Result<()> {
    let path = path.as_ref();
    write_atomically(path, |out| {
        for sequence in set.sorted_view() {
            writeln!(out, "{}", sequence)?;
        }
        Ok(())
    })?;
    log::info!("saved {} sequences to {}", set.len(), path.display());
    Ok(())
}

/// Outcome of a lenient mask import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaskImport {
    pub masks: MaskSet,
    /// Valid lines added to the list.
    pub accepted: usize,
    /// Valid lines repeating an earlier one.
    pub duplicates: usize,
    /// Malformed lines skipped.
    pub rejected: usize,
}

/// Parse masks, skipping malformed lines.
pub fn parse_masks(text: &str) -> MaskImport {
    let mut import = MaskImport::default();
    for (line, record) in records(text) {
        match PositionMask::parse(record) {
            Ok(mask) => {
                if import.masks.insert(mask) {
                    import.accepted += 1;
                } else {
                    import.duplicates += 1;
                }
            }
            Err(e) => {
                log::warn!("skipping mask: {}", e.at_line(line));
                import.rejected += 1;
            }
        }
    }
    import
}

pub fn read_masks(path: impl AsRef<Path>) -> Result<MaskImport> {
    let path = path.as_ref();
    let import = parse_masks(&read_text(path)?);
    log::info!(
        "imported {} masks from {} ({} rejected)",
        import.accepted,
        path.display(),
        import.rejected
    );
    Ok(import)
}

/// Write masks verbatim, in list order.
pub fn write_masks(path: impl AsRef<Path>, masks: &MaskSet) -> Result<()> {
    let path = path.as_ref();
    write_atomically(path, |out| {
        for mask in masks {
            writeln!(out, "{}", mask)?;
        }
        Ok(())
    })?;
    log::info!("exported {} masks to {}", masks.len(), path.display());
    Ok(())
}

/// Build a selector allowing the symbols seen at each position of the template.
pub fn parse_template(text: &str) -> std::result::Result<PositionSelector, ValidationError> {
    let templates: Vec<Sequence> = records(text)
        .map(|(line, record)| Sequence::parse(record).map_err(|e| e.at_line(line)))
        .collect::<std::result::Result<_, _>>()?;
    PositionSelector::from_templates(&templates)
}

pub fn read_template(path: impl AsRef<Path>) -> Result<PositionSelector> {
    let path = path.as_ref();
    Ok(parse_template(&read_text(path)?)?)
}

fn write_atomically<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> std::io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| SieveError::io(path, e))?;
    {
        let mut out = BufWriter::new(&mut tmp);
        fill(&mut out).map_err(|e| SieveError::io(path, e))?;
        out.flush().map_err(|e| SieveError::io(path, e))?;
    }
    tmp.persist(path).map_err(|e| SieveError::io(path, e.error))?;
    Ok(())
}
