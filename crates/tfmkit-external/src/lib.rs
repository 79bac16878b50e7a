//! Component K's external half: wrapped command-line tool invocation,
//! `kpsewhich` lookup, config file loading, and scoped temp files (§6).

mod config_file;
mod error;
mod locate;
mod spawn;
mod tempfile;

pub use error::Error;
pub use locate::{build_kpse_args, KpseOption, KpsewhichLocator, Locator};
pub use spawn::{invoke_external, ProcessSpawner, Spawner, SpawnOutput, StubSpawner};
pub use tempfile::TempFileGuard;

pub use config_file::load as load_config_file;
