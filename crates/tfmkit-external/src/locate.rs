//! `kpsewhich` lookup: locating fonts and metric files on the TeX
//! search path (§6 "File lookup").

use std::path::PathBuf;

use tfmkit_config::Config;

use crate::error::Error;
use crate::spawn::Spawner;

/// The two calling conventions `kpsewhich` accepts: a raw `--format`
/// string, or the detailed knob set `ZRTeXtor`-family tools use when
/// resolving a font under a specific engine/mode/dpi.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KpseOption {
    Format(String),
    Detailed {
        dpi: Option<u32>,
        engine: Option<String>,
        mode: Option<String>,
        progname: Option<String>,
        format: Option<String>,
        mustexist: bool,
    },
}

/// Builds the `kpsewhich` argument vector for one lookup.
pub fn build_kpse_args(filename: &str, option: &KpseOption) -> Vec<String> {
    let mut args = Vec::new();
    match option {
        KpseOption::Format(fmt) => {
            args.push(format!("--format={fmt}"));
        }
        KpseOption::Detailed { dpi, engine, mode, progname, format, mustexist } => {
            if let Some(dpi) = dpi {
                args.push(format!("--dpi={dpi}"));
            }
            if let Some(engine) = engine {
                args.push(format!("--engine={engine}"));
            }
            if let Some(mode) = mode {
                args.push(format!("--mode={mode}"));
            }
            if let Some(progname) = progname {
                args.push(format!("--progname={progname}"));
            }
            if let Some(format) = format {
                args.push(format!("--format={format}"));
            }
            if *mustexist {
                args.push("--must-exist".to_string());
            }
        }
    }
    args.push(filename.to_string());
    args
}

/// Abstracts "find this file on the search path" so callers can
/// substitute a fixed answer in tests.
pub trait Locator {
    fn locate(&self, filename: &str, option: &KpseOption) -> Result<Option<PathBuf>, Error>;
}

/// Resolves lookups by shelling out to the `kpsewhich` binary named in
/// [`Config`].
pub struct KpsewhichLocator<'a> {
    pub spawner: &'a dyn Spawner,
    pub config: &'a Config,
}

impl<'a> KpsewhichLocator<'a> {
    pub fn new(spawner: &'a dyn Spawner, config: &'a Config) -> Self {
        KpsewhichLocator { spawner, config }
    }
}

impl<'a> Locator for KpsewhichLocator<'a> {
    fn locate(&self, filename: &str, option: &KpseOption) -> Result<Option<PathBuf>, Error> {
        let command = self.config.resolve_command("kpsewhich");
        let args = build_kpse_args(filename, option);
        let output = self.spawner.spawn(&command, &args)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout.lines().next().map(str::trim).unwrap_or("");
        if first_line.is_empty() {
            return Ok(None);
        }
        let path = PathBuf::from(first_line);
        if path.exists() {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::{SpawnOutput, StubSpawner};

    #[test]
    fn build_kpse_args_formats_detailed_options() {
        let option = KpseOption::Detailed {
            dpi: Some(300),
            engine: Some("ptex".to_string()),
            mode: None,
            progname: None,
            format: Some("tfm".to_string()),
            mustexist: true,
        };
        let args = build_kpse_args("min10", &option);
        assert_eq!(
            args,
            vec!["--dpi=300", "--engine=ptex", "--format=tfm", "--must-exist", "min10"]
        );
    }

    #[test]
    fn locate_returns_none_when_kpsewhich_prints_nothing() {
        let spawner = StubSpawner::default().with("kpsewhich", SpawnOutput::default());
        let config = Config::default();
        let locator = KpsewhichLocator::new(&spawner, &config);
        let found = locator.locate("nosuchfont", &KpseOption::Format("tfm".to_string())).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn locate_returns_none_when_reported_path_does_not_exist() {
        let spawner = StubSpawner::default().with(
            "kpsewhich",
            SpawnOutput { stdout: b"/nonexistent/min10.tfm\n".to_vec(), stderr: Vec::new() },
        );
        let config = Config::default();
        let locator = KpsewhichLocator::new(&spawner, &config);
        let found = locator.locate("min10", &KpseOption::Format("tfm".to_string())).unwrap();
        assert!(found.is_none());
    }
}
