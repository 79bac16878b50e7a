//! The two commands that wrap the external classic-TFM toolchain
//! (§6): this crate implements the PL tree and VF binary format
//! itself, but raw TFM encode/decode is left to `pltotf`/`tftopl`.

use std::path::Path;

use anyhow::{Context, Result};
use tfmkit_config::Config;
use tfmkit_external::{invoke_external, ProcessSpawner};

/// Run `pltotf input.pl output.tfm`.
pub fn pl_to_tfm(cfg: &Config, input: &Path, output: &Path) -> Result<()> {
    run_wrapper(cfg, "pltotf", input, output)
}

/// Run `tftopl input.tfm output.pl`.
pub fn tfm_to_pl(cfg: &Config, input: &Path, output: &Path) -> Result<()> {
    run_wrapper(cfg, "tftopl", input, output)
}

fn run_wrapper(cfg: &Config, logical_command: &str, input: &Path, output: &Path) -> Result<()> {
    let command = cfg.resolve_command(logical_command);
    let args = vec![input.display().to_string(), output.display().to_string()];
    log::debug!("invoking {command} on {}", input.display());
    let spawner = ProcessSpawner;
    invoke_external(&spawner, &command, &args, output)
        .with_context(|| format!("running {command} on {}", input.display()))?;
    Ok(())
}
