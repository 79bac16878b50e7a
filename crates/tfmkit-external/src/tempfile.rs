//! Scoped temporary files for round-tripping through an external tool
//! (§5 "Resource model"): a fixed prefix, the current process id, and
//! a random six-letter infix, removed on drop.

use std::path::{Path, PathBuf};

use rand::Rng;

/// Owns a path to a file that does not yet exist (or may be created by
/// an external tool) and removes it when dropped.
#[derive(Debug)]
pub struct TempFileGuard {
    path: PathBuf,
}

impl TempFileGuard {
    /// Build a guard for a not-yet-created path `dir/{prefix}{pid}{infix}`.
    pub fn new(dir: &Path, prefix: &str) -> Self {
        let name = format!("{prefix}{}{}", std::process::id(), random_infix());
        TempFileGuard { path: dir.join(name) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn random_infix() -> String {
    let mut rng = rand::thread_rng();
    (0..6).map(|_| (b'a' + rng.gen_range(0..26)) as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_infix_is_six_lowercase_letters() {
        let infix = random_infix();
        assert_eq!(infix.len(), 6);
        assert!(infix.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn guard_name_embeds_prefix_and_pid() {
        let guard = TempFileGuard::new(Path::new("/tmp"), "tfmkit");
        let name = guard.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tfmkit"));
        assert!(name.contains(&std::process::id().to_string()));
        assert_eq!(name.len(), "tfmkit".len() + std::process::id().to_string().len() + 6);
    }

    #[test]
    fn guard_removes_the_file_on_drop() {
        let dir = std::env::temp_dir();
        let guard = TempFileGuard::new(&dir, "tfmkit-test-");
        std::fs::write(guard.path(), b"scratch").unwrap();
        let path = guard.path().to_path_buf();
        assert!(path.exists());
        drop(guard);
        assert!(!path.exists());
    }
}
