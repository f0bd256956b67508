//! Path resolution for hookcat data files.
//!
//! Resolved once at startup from: CLI `--data-dir` (or `HOOKCAT_DATA_DIR`,
//! handled by clap) > `~/.hookcat`.

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DataPaths {
    data_dir: PathBuf,
    public_dir: PathBuf,
}

impl DataPaths {
    /// `explicit_data` / `explicit_public` come from the command line.
    pub fn resolve(explicit_data: Option<&Path>, explicit_public: Option<&Path>) -> Self {
        let data_dir = explicit_data
            .map(Path::to_path_buf)
            .unwrap_or_else(default_data_dir);
        let public_dir = explicit_public
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join("public"));
        Self {
            data_dir,
            public_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Create all required directories.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.log_dir())?;
        std::fs::create_dir_all(&self.public_dir)?;
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".hookcat")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_dir_defaults_under_data_dir() {
        let paths = DataPaths::resolve(Some(Path::new("/tmp/hc")), None);
        assert_eq!(paths.public_dir(), Path::new("/tmp/hc/public"));
        assert_eq!(paths.log_dir(), PathBuf::from("/tmp/hc/logs"));
    }

    #[test]
    fn explicit_public_dir_wins() {
        let paths = DataPaths::resolve(Some(Path::new("/tmp/hc")), Some(Path::new("/srv/ui")));
        assert_eq!(paths.public_dir(), Path::new("/srv/ui"));
    }

    #[test]
    fn ensure_dirs_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::resolve(Some(&dir.path().join("data")), None);
        paths.ensure_dirs().unwrap();
        assert!(paths.log_dir().is_dir());
        assert!(paths.public_dir().is_dir());
    }
}
