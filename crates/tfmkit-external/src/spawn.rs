//! Three-pipe process spawning for the wrapped command-line tools
//! (`tftopl`, `pltotf`, `vptovf`, ...), and the benign-stderr filter
//! that decides whether a run succeeded (§6 "Invoked commands").

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::Error;

/// Captured output of one external command run. Exit status is not
/// part of the success determination (§6): only the expected output
/// file and stderr content are consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Abstracts process spawning so tests can substitute canned output
/// for the real TeX toolchain.
pub trait Spawner {
    fn spawn(&self, command: &str, args: &[String]) -> Result<SpawnOutput, Error>;
}

/// Spawns real child processes via [`std::process::Command`], with
/// stdout and stderr captured into separate buffers.
#[derive(Debug, Default)]
pub struct ProcessSpawner;

impl Spawner for ProcessSpawner {
    fn spawn(&self, command: &str, args: &[String]) -> Result<SpawnOutput, Error> {
        let output = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::External(format!("spawning {command}: {e}")))?;
        log::debug!("spawned {command} with {} argument(s)", args.len());
        Ok(SpawnOutput { stdout: output.stdout, stderr: output.stderr })
    }
}

/// A test double returning pre-recorded output per logical command
/// name, so unit tests never touch a real `tftopl`/`pltotf` binary.
#[derive(Debug, Default)]
pub struct StubSpawner {
    pub responses: std::collections::HashMap<String, SpawnOutput>,
}

impl StubSpawner {
    pub fn with(mut self, command: impl Into<String>, output: SpawnOutput) -> Self {
        self.responses.insert(command.into(), output);
        self
    }
}

impl Spawner for StubSpawner {
    fn spawn(&self, command: &str, _args: &[String]) -> Result<SpawnOutput, Error> {
        self.responses
            .get(command)
            .cloned()
            .ok_or_else(|| Error::External(format!("no stubbed response for {command}")))
    }
}

/// stderr lines the wrapped tools are known to emit on success, which
/// must not be mistaken for failure (§6).
fn is_benign_stderr_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.contains("I had to round some")
        || trimmed.contains("Input file is in kanji")
        || trimmed.contains("LIG")
}

/// Run `command` with `args` and judge success by the presence of
/// `expected_output` and the absence of any non-benign stderr line
/// (§6): exit status is never consulted.
pub fn invoke_external(
    spawner: &dyn Spawner,
    command: &str,
    args: &[String],
    expected_output: &Path,
) -> Result<SpawnOutput, Error> {
    let output = spawner.spawn(command, args)?;
    let stderr_text = String::from_utf8_lossy(&output.stderr);
    for line in stderr_text.lines() {
        if !is_benign_stderr_line(line) {
            return Err(Error::External(format!("{command}: unexpected stderr line: {line}")));
        }
    }
    if !expected_output.exists() {
        return Err(Error::External(format!(
            "{command}: expected output file {} was not produced",
            expected_output.display()
        )));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_stderr_lines_are_ignored() {
        assert!(is_benign_stderr_line("I had to round some dimensions"));
        assert!(is_benign_stderr_line("Input file is in kanji code EUC"));
        assert!(is_benign_stderr_line("LIG/KERN: too many LIG steps"));
        assert!(is_benign_stderr_line(""));
    }

    #[test]
    fn unexpected_stderr_is_not_benign() {
        assert!(!is_benign_stderr_line("Sorry, I can't find that font"));
    }

    #[test]
    fn invoke_external_fails_when_output_file_is_missing() {
        let spawner = StubSpawner::default().with("pltotf", SpawnOutput::default());
        let err = invoke_external(&spawner, "pltotf", &[], Path::new("/nonexistent/out.tfm")).unwrap_err();
        assert!(matches!(err, Error::External(_)));
    }

    #[test]
    fn invoke_external_fails_on_unexpected_stderr() {
        let spawner = StubSpawner::default().with(
            "pltotf",
            SpawnOutput { stdout: Vec::new(), stderr: b"Sorry, unknown property FOO\n".to_vec() },
        );
        let err = invoke_external(&spawner, "pltotf", &[], Path::new("/")).unwrap_err();
        assert!(matches!(err, Error::External(_)));
    }
}
