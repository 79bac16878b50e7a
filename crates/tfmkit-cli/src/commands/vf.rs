//! `vp-to-vf` / `vf-to-vp`: the toolkit's own VF binary <-> ZPL text
//! codec (components B/C/E/F), exercised end to end rather than
//! shelled out to `vptovf`.

use std::path::Path;

use anyhow::{Context, Result};
use tfmkit_config::Config;
use tfmkit_encoding::Transcoder;
use tfmkit_num::JCodeTranscoder;
use tfmkit_pl::{cook, emit_pl, parse_pl, EmitOptions};
use tfmkit_vf::{emit_vf, parse_vf, tree_to_vf, vf_to_tree};

use crate::io::{read_bytes, read_text, write_bytes, write_text};

pub fn vp_to_vf(cfg: &Config, input: &Path, output: &Path) -> Result<()> {
    let text = read_text(input)?;
    let raw_tree = parse_pl(&text).with_context(|| format!("parsing {}", input.display()))?;
    let transcoder = Transcoder::from_config(cfg).context("building transcoder from config")?;
    let tree = cook(&raw_tree, cfg, Some(&transcoder)).context("cooking VPL tree")?;
    let vf = tree_to_vf(&tree).context("building a VF structure from the VPL tree")?;
    let bytes = emit_vf(&vf).context("emitting VF binary")?;
    write_bytes(output, &bytes)
}

pub fn vf_to_vp(cfg: &Config, input: &Path, output: &Path) -> Result<()> {
    let bytes = read_bytes(input)?;
    let vf = parse_vf(&bytes).with_context(|| format!("parsing VF binary {}", input.display()))?;
    let tree = vf_to_tree(&vf);
    let transcoder = Transcoder::from_config(cfg).context("building transcoder from config")?;
    let chr = |v: i64| transcoder.chr(v);
    let text = emit_pl(&tree, &EmitOptions::default(), Some(&chr)).context("emitting VPL text")?;
    write_text(output, &text)
}
