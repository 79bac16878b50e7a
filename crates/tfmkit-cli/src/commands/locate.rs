//! `locate`: a thin `kpsewhich` front end (§6 "kpsewhich contract").

use anyhow::{Context, Result};
use tfmkit_config::Config;
use tfmkit_external::{KpseOption, KpsewhichLocator, Locator, ProcessSpawner};

#[allow(clippy::too_many_arguments)]
pub fn locate(
    cfg: &Config,
    filename: &str,
    format: Option<String>,
    dpi: Option<u32>,
    engine: Option<String>,
    mode: Option<String>,
    progname: Option<String>,
    must_exist: bool,
) -> Result<Option<String>> {
    let option = if dpi.is_some() || engine.is_some() || mode.is_some() || progname.is_some() || must_exist {
        KpseOption::Detailed { dpi, engine, mode, progname, format, mustexist: must_exist }
    } else {
        KpseOption::Format(format.unwrap_or_else(|| "tfm".to_string()))
    };
    let spawner = ProcessSpawner;
    let locator = KpsewhichLocator::new(&spawner, cfg);
    let found = locator
        .locate(filename, &option)
        .with_context(|| format!("locating {filename}"))?;
    Ok(found.map(|p| p.display().to_string()))
}
