//! `zvp-divide` / `zvp-compose`: components H/I, splitting a composite
//! ZVP specification into its VF and JFM halves and reassembling them.

use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use tfmkit_config::Config;
use tfmkit_encoding::Transcoder;
use tfmkit_jfm::{compose_zvp, divide_zvp};
use tfmkit_num::JCodeTranscoder;
use tfmkit_pl::{cook, emit_pl, parse_pl, EmitOptions};

use crate::io::{read_text, write_text};

pub fn zvp_divide(cfg: &Config, input: &Path, vf_output: &Path, jfm_output: &Path) -> Result<()> {
    let text = read_text(input)?;
    let raw_tree = parse_pl(&text).with_context(|| format!("parsing {}", input.display()))?;
    let transcoder = Transcoder::from_config(cfg).context("building transcoder from config")?;
    let tree = cook(&raw_tree, cfg, Some(&transcoder)).context("cooking ZVP tree")?;
    let (vf_tree, jfm_tree) = divide_zvp(&tree).context("dividing ZVP tree")?;

    let chr = |v: i64| transcoder.chr(v);
    let vf_text = emit_pl(&vf_tree, &EmitOptions::default(), Some(&chr)).context("emitting VF half")?;
    let jfm_text = emit_pl(&jfm_tree, &EmitOptions::default(), Some(&chr)).context("emitting JFM half")?;
    write_text(vf_output, &vf_text)?;
    write_text(jfm_output, &jfm_text)
}

pub fn zvp_compose(cfg: &Config, vf_input: &Path, jfm_input: &Path, output: &Path) -> Result<()> {
    let transcoder = Transcoder::from_config(cfg).context("building transcoder from config")?;

    let vf_text = read_text(vf_input)?;
    let vf_raw = parse_pl(&vf_text).with_context(|| format!("parsing {}", vf_input.display()))?;
    let vf_tree = cook(&vf_raw, cfg, Some(&transcoder)).context("cooking VF half")?;

    let jfm_text = read_text(jfm_input)?;
    let jfm_raw = parse_pl(&jfm_text).with_context(|| format!("parsing {}", jfm_input.display()))?;
    let jfm_tree = cook(&jfm_raw, cfg, Some(&transcoder)).context("cooking JFM half")?;

    let composed = compose_zvp(&vf_tree, &jfm_tree).context("composing ZVP tree")?;
    let chr = |v: i64| transcoder.chr(v);
    let text = emit_pl(&composed, &EmitOptions::default(), Some(&chr)).context("emitting composed ZVP tree")?;
    write_text(output, &text)
}
