//! Per-partition scratch space.

use anyhow::{Context, Result};
use log::{info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Create `path` if it does not exist. An existing directory is not an error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => {
            warn!("directory {} already exists", path.display());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("creating directory {}", path.display())),
    }
}

/// A scratch directory owned by one partition attempt.
///
/// The directory tree is removed when the guard is dropped, whether the stage
/// that held it returned normally, returned an error, or unwound.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Ensure `path` exists and take ownership of it. The parent must exist.
    pub fn acquire(path: PathBuf) -> Result<ScratchDir> {
        ensure_dir(&path)?;
        Ok(ScratchDir { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the named subdirectory exists and return its path.
    pub fn subdir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.path.join(name);
        ensure_dir(&dir)?;
        Ok(dir)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => info!("removed scratch directory {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "could not remove scratch directory {}: {e}",
                self.path.display()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dir_is_idempotent() -> Result<()> {
        let root = tempfile::tempdir()?;
        let dir = root.path().join("alignment_S1");
        ensure_dir(&dir)?;
        ensure_dir(&dir)?;
        assert!(dir.is_dir());
        Ok(())
    }

    #[test]
    fn test_ensure_dir_rejects_file() -> Result<()> {
        let root = tempfile::tempdir()?;
        let file = root.path().join("taken");
        fs::write(&file, "x")?;
        assert!(ensure_dir(&file).is_err());
        Ok(())
    }

    #[test]
    fn test_guard_removes_tree() -> Result<()> {
        let root = tempfile::tempdir()?;
        let path = root.path().join("alignment_S1_part0");
        {
            let scratch = ScratchDir::acquire(path.clone())?;
            let out = scratch.subdir("aligner_output")?;
            fs::write(out.join("Log.final.out"), "log")?;
            assert!(out.is_dir());
        }
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_guard_reuses_existing_dir() -> Result<()> {
        let root = tempfile::tempdir()?;
        let path = root.path().join("alignment_S2");
        fs::create_dir(&path)?;
        fs::write(path.join("stale.fq"), "@r\n")?;
        let scratch = ScratchDir::acquire(path.clone())?;
        assert!(scratch.path().join("stale.fq").exists());
        drop(scratch);
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_guard_tolerates_missing_dir() -> Result<()> {
        let root = tempfile::tempdir()?;
        let path = root.path().join("alignment_S3");
        let scratch = ScratchDir::acquire(path.clone())?;
        fs::remove_dir_all(&path)?;
        drop(scratch);
        Ok(())
    }
}
