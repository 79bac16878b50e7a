//! `jfm-reduce`: component G, bucketing a raw per-glyph metric table
//! into a class-based reduced metric (§4.7).
//!
//! The input is a plain text table, one glyph per line: `code width
//! height depth`, `#`-comments and blank lines ignored. This toolkit
//! does not read/write the binary JFM container itself (§1 "external
//! collaborators" -- that final step is `opl2ofm`'s job); this command
//! exposes the reduction algorithm directly so its output can be
//! inspected or fed into a JFM-emitting tool.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use tfmkit_jfm::{tfm_reduce, tfm_reduce_jpl, tfm_reduce_jpl_x, RawMetricEntry, ReducedMetric};

use crate::io::{read_text, write_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReduceMode {
    /// `tfm_reduce`: classic fixed-slot-count reduction.
    Classic,
    /// `tfm_reduce_jpl`: independent width/height-depth error bounds.
    Jpl,
    /// `tfm_reduce_jpl_x`: single ratio-balanced error bound.
    JplX,
}

pub fn jfm_reduce(
    input: &Path,
    output: &Path,
    mode: ReduceMode,
    dw: f64,
    d_max: f64,
) -> Result<()> {
    let text = read_text(input)?;
    let raw = parse_raw_metric(&text).with_context(|| format!("parsing raw metric table {}", input.display()))?;
    if raw.is_empty() {
        bail!("raw metric table {} contains no entries", input.display());
    }

    let report = match mode {
        ReduceMode::Classic => {
            let reduced = tfm_reduce(&raw).context("tfm_reduce")?;
            format_report("tfm_reduce", None, None, &reduced)
        }
        ReduceMode::Jpl => {
            let (dw, dh, reduced) = tfm_reduce_jpl(&raw, dw);
            format_report("tfm_reduce_jpl", Some(dw), Some(dh), &reduced)
        }
        ReduceMode::JplX => {
            let (d, reduced) = tfm_reduce_jpl_x(&raw, d_max);
            format_report("tfm_reduce_jpl_x", Some(d), Some(d), &reduced)
        }
    };
    write_text(output, &report)
}

fn parse_raw_metric(text: &str) -> Result<Vec<RawMetricEntry>> {
    let mut out = Vec::new();
    for (lineno, raw_line) in text.lines().enumerate() {
        let line = match raw_line.find('#') {
            Some(i) => &raw_line[..i],
            None => raw_line,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            bail!("line {}: expected `code width height depth`, got {line:?}", lineno + 1);
        }
        let code: u32 = fields[0].parse().with_context(|| format!("line {}: bad code", lineno + 1))?;
        let width: f64 = fields[1].parse().with_context(|| format!("line {}: bad width", lineno + 1))?;
        let height: f64 = fields[2].parse().with_context(|| format!("line {}: bad height", lineno + 1))?;
        let depth: f64 = fields[3].parse().with_context(|| format!("line {}: bad depth", lineno + 1))?;
        out.push(RawMetricEntry { code, width, height, depth });
    }
    Ok(out)
}

fn format_report(algorithm: &str, dw: Option<f64>, dh: Option<f64>, reduced: &ReducedMetric) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {algorithm}\n"));
    if let (Some(dw), Some(dh)) = (dw, dh) {
        out.push_str(&format!("# error bounds: dw={dw} dh={dh}\n"));
    }
    out.push_str(&format!("# {} slots\n", reduced.value_table.len()));
    for (slot, (w, h, d)) in reduced.value_table.iter().enumerate() {
        out.push_str(&format!("slot {slot} {w} {h} {d}\n"));
    }
    let mut codes: Vec<_> = reduced.index_map.iter().collect();
    codes.sort_by_key(|(code, _)| **code);
    for (code, slot) in codes {
        out.push_str(&format!("code {code} -> slot {slot}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_table_and_reduces() {
        let text = "# header\n1 0.5 0.3 0.1\n2 0.5 0.31 0.1\n";
        let raw = parse_raw_metric(text).unwrap();
        assert_eq!(raw.len(), 2);
        let reduced = tfm_reduce(&raw).unwrap();
        assert!(!reduced.value_table.is_empty());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(parse_raw_metric("1 2 3\n").is_err());
    }
}
