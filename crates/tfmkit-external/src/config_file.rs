//! Loading a `ZRTeXtor`-style config file (`key = value` lines, `#`
//! comments) into a [`Config`] (§6 "Configuration file").

use std::path::Path;

use tfmkit_config::{Config, COMMAND_NAMES};

use crate::error::Error;

/// Parse `path` and apply each recognized key to `cfg`. Unrecognized
/// keys are ignored; command names are matched against
/// [`COMMAND_NAMES`], anything else updates an encoding field.
pub fn load(path: &Path, cfg: &mut Config) -> Result<(), Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::External(format!("reading config file {}: {e}", path.display())))?;
    apply(&text, cfg);
    Ok(())
}

fn apply(text: &str, cfg: &mut Config) {
    for raw_line in text.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if COMMAND_NAMES.contains(&key) {
            cfg.set_command(key, value);
            continue;
        }
        match key {
            "external_encoding" => cfg.external_encoding = value.to_string(),
            "internal_encoding" => cfg.internal_encoding = value.to_string(),
            _ => {}
        }
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_overrides_and_encodings_are_applied() {
        let text = "\
            # sample config\n\
            pltotf = /opt/texlive/bin/pltotf\n\
            external_encoding = sjis\n\
            \n\
            internal_encoding = euc-jp # trailing comment\n";
        let mut cfg = Config::default();
        apply(text, &mut cfg);
        assert_eq!(cfg.resolve_command("pltotf"), "/opt/texlive/bin/pltotf");
        assert_eq!(cfg.external_encoding, "sjis");
        assert_eq!(cfg.internal_encoding, "euc-jp");
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let mut cfg = Config::default();
        let before = cfg.clone();
        apply("nonsense_key = whatever\n", &mut cfg);
        assert_eq!(cfg, before);
    }
}
