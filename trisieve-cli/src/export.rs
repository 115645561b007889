// Trisieve CLI - Statistics export
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Frequency statistics report in CSV or JSON.

use crate::error::{CliError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;
use trisieve::mystic::TRIGRAM_COUNT;
use trisieve::{FrequencyStats, SEQUENCE_LEN};

/// Output format of the statistics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl FromStr for ReportFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(CliError::InvalidArgument(format!(
                "unknown report format: {}",
                other
            ))),
        }
    }
}

impl ReportFormat {
    /// Guess from the file extension, CSV otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Csv,
        }
    }
}

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    /// `position` or `trigram`.
    pub kind: &'static str,
    /// 1-based position, or the trigram text.
    pub key: String,
    pub count: u64,
    /// Share of sequences (positions) or of all trigrams.
    pub ratio: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub sample_count: u64,
    pub rows: Vec<ReportRow>,
}

impl StatsReport {
    /// Position rows first, then the `top_n` trigrams.
    pub fn from_stats(stats: &FrequencyStats, top_n: usize) -> Self {
        let mut rows: Vec<ReportRow> = (0..SEQUENCE_LEN)
            .map(|p| ReportRow {
                kind: "position",
                key: (p + 1).to_string(),
                count: stats.position_favorable[p],
                ratio: stats.position_ratio(p),
            })
            .collect();

        let trigram_total: u64 = stats.trigram_counts.iter().sum();
        rows.extend(
            stats
                .top_trigrams(top_n.min(TRIGRAM_COUNT))
                .into_iter()
                .map(|(trigram, count)| ReportRow {
                    kind: "trigram",
                    key: trigram.to_string(),
                    count,
                    ratio: if trigram_total == 0 {
                        0.0
                    } else {
                        count as f64 / trigram_total as f64
                    },
                }),
        );

        Self {
            sample_count: stats.sample_count,
            rows,
        }
    }

    pub fn write(&self, path: &Path, format: ReportFormat) -> Result<()> {
        match format {
            ReportFormat::Csv => self.write_csv(path),
            ReportFormat::Json => self.write_json(path),
        }
    }

    fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}
