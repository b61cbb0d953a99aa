//! A line-oriented MGF (Mascot Generic Format) adapter: the one
//! concrete [`SpectrumSource`] kept in-tree as a reference
//! implementation of the reader contract.
//!
//! The header sniff reads exactly 10 lines looking for `BEGIN IONS`,
//! mirroring the documented limitation of a bounded prologue check: a
//! file whose `BEGIN IONS` marker appears after line 10 is rejected
//! rather than accepted after an unbounded scan (Design Note 9-iv).

use std::collections::HashMap;
use std::io::Read;

use super::{RawSpectrumRecord, SpectrumSource};
use crate::error::ClusterError;
use crate::spectrum::Peak;

/// Bounded prologue scan depth, matching the documented 10-line limit.
const SNIFF_LINES: usize = 10;

pub struct MgfReader {
    lines: std::vec::IntoIter<String>,
}

impl MgfReader {
    /// Read all of `reader` and verify a `BEGIN IONS` marker appears
    /// within the first [`SNIFF_LINES`] lines.
    pub fn new(mut reader: impl Read) -> Result<Self, ClusterError> {
        let mut content = String::new();
        reader.read_to_string(&mut content).map_err(ClusterError::StorageIo)?;
        let lines: Vec<String> = content.lines().map(str::to_string).collect();

        let found = lines
            .iter()
            .take(SNIFF_LINES)
            .any(|l| l.trim().eq_ignore_ascii_case("BEGIN IONS"));
        if !found {
            return Err(ClusterError::InputFormat(format!(
                "no BEGIN IONS marker found within the first {SNIFF_LINES} lines"
            )));
        }

        Ok(Self { lines: lines.into_iter() })
    }
}

impl SpectrumSource for MgfReader {
    fn next_record(&mut self) -> Result<Option<RawSpectrumRecord>, ClusterError> {
        let mut in_block = false;
        let mut title = String::new();
        let mut precursor_mz = None;
        let mut precursor_charge = 0i32;
        let mut peaks = Vec::new();
        let mut additional_params = HashMap::new();

        for line in self.lines.by_ref() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("BEGIN IONS") {
                in_block = true;
                continue;
            }
            if !in_block {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("END IONS") {
                let precursor_mz = precursor_mz.ok_or_else(|| {
                    ClusterError::InputFormat("MGF block missing PEPMASS".to_string())
                })?;
                peaks.sort_by(|a: &Peak, b: &Peak| a.mz.partial_cmp(&b.mz).unwrap_or(std::cmp::Ordering::Equal));
                return Ok(Some(RawSpectrumRecord {
                    title,
                    precursor_mz,
                    precursor_charge,
                    peaks,
                    additional_params,
                }));
            }
            if let Some((key, value)) = trimmed.split_once('=') {
                match key.to_ascii_uppercase().as_str() {
                    "TITLE" => title = value.to_string(),
                    "PEPMASS" => {
                        let mz_token = value.split_whitespace().next().unwrap_or(value);
                        precursor_mz = Some(mz_token.parse::<f64>().map_err(|_| {
                            ClusterError::InputFormat(format!("bad PEPMASS value: {value}"))
                        })?);
                    }
                    "CHARGE" => {
                        let digits: String = value.chars().take_while(|c| c.is_ascii_digit()).collect();
                        precursor_charge = digits.parse().unwrap_or(0);
                    }
                    other => {
                        additional_params.insert(other.to_string(), value.to_string());
                    }
                }
                continue;
            }

            let mut fields = trimmed.split_whitespace();
            let mz = fields.next();
            let intensity = fields.next();
            match (mz, intensity) {
                (Some(mz), Some(intensity)) => {
                    let mz: f64 = mz
                        .parse()
                        .map_err(|_| ClusterError::InputFormat(format!("bad peak mz: {mz}")))?;
                    let intensity: f64 = intensity
                        .parse()
                        .map_err(|_| ClusterError::InputFormat(format!("bad peak intensity: {intensity}")))?;
                    peaks.push(Peak::new(mz, intensity));
                }
                _ => {
                    return Err(ClusterError::InputFormat(format!("malformed peak line: {trimmed}")));
                }
            }
        }

        if in_block {
            return Err(ClusterError::InputFormat("unterminated MGF block (missing END IONS)".to_string()));
        }
        Ok(None)
    }
}
