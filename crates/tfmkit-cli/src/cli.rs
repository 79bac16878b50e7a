//! CLI definitions and command dispatch.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tfmkit_config::Config;
use tfmkit_external::load_config_file;

use crate::commands::{
    jfm_reduce, locate, pl_to_tfm, tfm_to_pl, vf_to_vp, vp_to_vf, zvp_compose, zvp_divide, ReduceMode,
};

#[derive(Parser)]
#[command(name = "tfmkit")]
#[command(about = "Read, write, and rebalance TeX font metric data (TFM/JFM/OFM/VF and their PL text forms)")]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,
    #[command(subcommand)]
    pub command: Commands,
}

/// Runtime configuration shared by every subcommand (§5 "Config").
#[derive(Debug, Clone, clap::Args)]
pub struct ConfigArgs {
    /// `ZRTeXtor.cfg`-style config file overlaying command names and
    /// encoding defaults.
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,
    /// Widen non-`R` numeric prefixes to the full signed 32-bit range.
    #[arg(long, global = true)]
    pub free_number: bool,
    /// Prefer `H` over `O` when an `I` alias must be resolved at emission.
    #[arg(long, global = true)]
    pub prefer_hex: bool,
    /// Minimum contiguous run length before a charlist range compacts.
    #[arg(long, global = true)]
    pub rangify_threshold: Option<usize>,
    /// Use the upTeX-family command names instead of classic pTeX ones.
    #[arg(long, global = true)]
    pub uptex: bool,
    /// Downgrade structural warnings to silent drops/DIRECTHEX fallback
    /// instead of hard errors.
    #[arg(long, global = true)]
    pub no_strict: bool,
    /// External encoding for bytes crossing the process boundary.
    #[arg(long, global = true)]
    pub external_encoding: Option<String>,
    /// Internal encoding used for cooked `K`-prefixed numbers.
    #[arg(long, global = true)]
    pub internal_encoding: Option<String>,
}

impl ConfigArgs {
    pub fn resolve(&self) -> Result<Config> {
        let mut cfg = Config::default();
        if let Some(path) = &self.config_file {
            load_config_file(path, &mut cfg)?;
        }
        if self.free_number {
            cfg.free_number = true;
        }
        if self.prefer_hex {
            cfg.prefer_hex = true;
        }
        if let Some(t) = self.rangify_threshold {
            cfg.rangify_threshold = t;
        }
        if self.uptex {
            cfg.use_uptex_tool = true;
        }
        if self.no_strict {
            cfg.vf_strict = false;
        }
        if let Some(enc) = &self.external_encoding {
            cfg.external_encoding = enc.clone();
        }
        if let Some(enc) = &self.internal_encoding {
            cfg.internal_encoding = enc.clone();
        }
        Ok(cfg)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert PL text to binary TFM, via the wrapped `pltotf`/`ppltotf`.
    PlToTfm { input: PathBuf, output: PathBuf },
    /// Convert binary TFM to PL text, via the wrapped `tftopl`/`ptftopl`.
    TfmToPl { input: PathBuf, output: PathBuf },
    /// Convert VPL/ZPL text to binary VF, using this toolkit's own codec.
    VpToVf { input: PathBuf, output: PathBuf },
    /// Convert binary VF to VPL/ZPL text, using this toolkit's own codec.
    VfToVp { input: PathBuf, output: PathBuf },
    /// Reduce a raw per-glyph metric table into a class-based JFM table.
    JfmReduce {
        input: PathBuf,
        output: PathBuf,
        /// Reduction algorithm (§4.7).
        #[arg(long, value_enum, default_value = "classic")]
        mode: ReduceMode,
        /// Width error bound, used by `jpl` mode.
        #[arg(long, default_value_t = 0.0)]
        dw: f64,
        /// Width/height/depth error bound, used by `jpl-x` mode.
        #[arg(long, default_value_t = 20.0)]
        d_max: f64,
    },
    /// Split a composite ZVP specification into its VF and JFM halves.
    ZvpDivide { input: PathBuf, vf_output: PathBuf, jfm_output: PathBuf },
    /// Reassemble a composite ZVP specification from its VF and JFM halves.
    ZvpCompose { vf_input: PathBuf, jfm_input: PathBuf, output: PathBuf },
    /// Locate a file on the TeX search path via `kpsewhich`.
    Locate {
        filename: String,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        dpi: Option<u32>,
        #[arg(long)]
        engine: Option<String>,
        #[arg(long)]
        mode: Option<String>,
        #[arg(long)]
        progname: Option<String>,
        #[arg(long)]
        must_exist: bool,
    },
}

impl Commands {
    pub fn run(self, cfg: &Config) -> Result<()> {
        self.run_inner(cfg).inspect_err(|e| tfmkit_config::report_error("external", e.to_string()))
    }

    fn run_inner(self, cfg: &Config) -> Result<()> {
        match self {
            Commands::PlToTfm { input, output } => pl_to_tfm(cfg, &input, &output)?,
            Commands::TfmToPl { input, output } => tfm_to_pl(cfg, &input, &output)?,
            Commands::VpToVf { input, output } => vp_to_vf(cfg, &input, &output)?,
            Commands::VfToVp { input, output } => vf_to_vp(cfg, &input, &output)?,
            Commands::JfmReduce { input, output, mode, dw, d_max } => {
                jfm_reduce(&input, &output, mode, dw, d_max)?;
            }
            Commands::ZvpDivide { input, vf_output, jfm_output } => {
                zvp_divide(cfg, &input, &vf_output, &jfm_output)?;
            }
            Commands::ZvpCompose { vf_input, jfm_input, output } => {
                zvp_compose(cfg, &vf_input, &jfm_input, &output)?;
            }
            Commands::Locate { filename, format, dpi, engine, mode, progname, must_exist } => {
                match locate(cfg, &filename, format, dpi, engine, mode, progname, must_exist)? {
                    Some(path) => println!("{path}"),
                    None => anyhow::bail!("{filename}: not found"),
                }
            }
        }
        Ok(())
    }
}
