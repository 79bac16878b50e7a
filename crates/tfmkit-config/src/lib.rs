//! Process-wide runtime configuration for the tfmkit toolkit.
//!
//! The tools this library generalizes (`pltotf`, `tftopl`, `vptovf`, …)
//! traditionally keep this state as module-level globals. Here it is a
//! single value threaded explicitly through every public operation, so
//! that two operations running against different configurations never
//! interfere with each other.

use std::cell::RefCell;
use std::collections::HashMap;

/// Name of an external or internal text encoding (`"jis"`, `"euc-jp"`,
/// `"sjis"`, `"utf-8"`, `"jis0208-raw"`, `"utf-16be"`, ...).
pub type EncodingName = String;

/// Logical names of the external commands this toolkit may shell out to.
pub const COMMAND_NAMES: &[&str] = &[
    "kpsewhich", "tftopl", "ptftopl", "pltotf", "ppltotf", "uptftopl", "uppltotf", "vptovf",
    "opl2ofm",
];

/// Number of contiguous codes below which a charlist leaves codes
/// un-rangified (component J, §4.10).
pub const DEFAULT_RANGIFY_THRESHOLD: usize = 8;

/// Runtime configuration threaded through every public tfmkit operation.
///
/// Construct with [`Config::default`] and override only the fields a
/// caller cares about; this mirrors how the wrapped command-line tools
/// are invoked with a handful of flags on top of sane defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Widen non-`R` numeric prefixes to the full signed 32-bit range
    /// (§4.1 "free-number" flag).
    pub free_number: bool,
    /// Prefer `H` over `O` when an `I` alias must be resolved at emission.
    pub prefer_hex: bool,
    /// Minimum contiguous run length before a charlist range is
    /// compacted into `[s,e]` form (§4.10).
    pub rangify_threshold: usize,
    /// Use the upTeX-family command names (`uptftopl`/`uppltotf`)
    /// instead of the classic pTeX ones when resolving a logical name.
    pub use_uptex_tool: bool,
    /// Force emission of a specific prefix letter regardless of the
    /// fallback table in §4.1. One of `C K D F O H R I`.
    pub forced_prefix_override: Option<char>,
    /// Upgrade structural warnings (§7, unknown property, missing char
    /// packet, CHARWD mismatch) into hard errors. Default `true`.
    pub vf_strict: bool,
    /// External encoding for bytes crossing the process boundary.
    pub external_encoding: EncodingName,
    /// Internal encoding used for cooked `K`-prefixed numbers.
    pub internal_encoding: EncodingName,
    /// Command name overrides, keyed by the logical names in
    /// [`COMMAND_NAMES`].
    pub command_names: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut command_names = HashMap::new();
        for name in COMMAND_NAMES {
            command_names.insert((*name).to_string(), (*name).to_string());
        }
        Config {
            free_number: false,
            prefer_hex: false,
            rangify_threshold: DEFAULT_RANGIFY_THRESHOLD,
            use_uptex_tool: false,
            forced_prefix_override: None,
            vf_strict: true,
            external_encoding: "utf-8".to_string(),
            internal_encoding: "jis0208-raw".to_string(),
            command_names,
        }
    }
}

impl Config {
    /// Resolve a logical command name (e.g. `"pltotf"`) to the actual
    /// executable name, honoring [`Config::use_uptex_tool`] and any
    /// explicit override in [`Config::command_names`].
    pub fn resolve_command(&self, logical: &str) -> String {
        let logical = if self.use_uptex_tool {
            match logical {
                "tftopl" | "ptftopl" => "uptftopl",
                "pltotf" | "ppltotf" => "uppltotf",
                other => other,
            }
        } else {
            logical
        };
        self.command_names
            .get(logical)
            .cloned()
            .unwrap_or_else(|| logical.to_string())
    }

    /// Override a single command name, e.g. from a config file.
    pub fn set_command(&mut self, logical: impl Into<String>, actual: impl Into<String>) {
        self.command_names.insert(logical.into(), actual.into());
    }
}

/// A snapshot of the error that caused an operation's most recent "no
/// value" return, in the vein of the wrapped tools' module-global "last
/// error" slot (§5/§7). Internal code always prefers `Result`/`?`; this
/// exists only so a thin boundary wrapper (the CLI's command dispatch)
/// can offer the documented "read the slot after a failure" retrieval
/// path without every caller threading an extra return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// One of the §7 taxonomy tags: `"syntax"`, `"semantic"`,
    /// `"structural"`, `"external"`, `"internal"`.
    pub category: String,
    pub message: String,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<ErrorReport>> = const { RefCell::new(None) };
}

/// Record an error report in the calling thread's last-error slot.
pub fn report_error(category: impl Into<String>, message: impl Into<String>) {
    LAST_ERROR.with(|cell| {
        *cell.borrow_mut() = Some(ErrorReport { category: category.into(), message: message.into() });
    });
}

/// Take (and clear) the calling thread's last-error slot.
pub fn take_last_error() -> Option<ErrorReport> {
    LAST_ERROR.with(|cell| cell.borrow_mut().take())
}
