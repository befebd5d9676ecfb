//! Filesystem locations owned by the supervisor.

use std::path::{Path, PathBuf};

/// Name of the tunnel configuration file inside the state directory.
pub const CONFIG_FILE_NAME: &str = "config.yml";
/// Name of the PID marker file.
pub const PID_FILE_NAME: &str = "tunnel.pid";
/// Name of the tunnel output log.
pub const LOG_FILE_NAME: &str = "tunnel.log";

/// Every path the supervisor reads or writes.
///
/// Built once from settings and handed to each component, so nothing
/// reaches for a process-wide location on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelPaths {
    pub state_dir: PathBuf,
    pub config_file: PathBuf,
    pub pid_file: PathBuf,
    pub log_file: PathBuf,
}

impl TunnelPaths {
    /// Derive all paths from a state directory.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            config_file: state_dir.join(CONFIG_FILE_NAME),
            pid_file: state_dir.join(PID_FILE_NAME),
            log_file: state_dir.join(LOG_FILE_NAME),
            state_dir,
        }
    }

    /// Use a config file outside the state directory.
    pub fn with_config_file(mut self, config_file: impl Into<PathBuf>) -> Self {
        self.config_file = config_file.into();
        self
    }

    /// Resolve every path to its absolute, symlink-free spelling.
    ///
    /// The state directory is created first so it can be resolved. A config
    /// file that does not exist yet keeps its name under a resolved parent.
    pub fn canonicalize(self) -> std::io::Result<Self> {
        self.ensure_state_dir()?;
        let state_dir = std::fs::canonicalize(&self.state_dir)?;
        let config_file = resolve_file(&self.config_file)?;

        Ok(Self::new(state_dir).with_config_file(config_file))
    }

    /// Create the state directory if needed.
    pub fn ensure_state_dir(&self) -> std::io::Result<&Path> {
        std::fs::create_dir_all(&self.state_dir)?;
        Ok(&self.state_dir)
    }
}

fn resolve_file(path: &Path) -> std::io::Result<PathBuf> {
    if let Ok(resolved) = std::fs::canonicalize(path) {
        return Ok(resolved);
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => match std::fs::canonicalize(parent) {
            Ok(parent) => Ok(parent.join(name)),
            Err(_) => Ok(absolute),
        },
        _ => Ok(absolute),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_state_dir() {
        let paths = TunnelPaths::new("/var/lib/tunnelflare");
        assert_eq!(paths.config_file, PathBuf::from("/var/lib/tunnelflare/config.yml"));
        assert_eq!(paths.pid_file, PathBuf::from("/var/lib/tunnelflare/tunnel.pid"));
        assert_eq!(paths.log_file, PathBuf::from("/var/lib/tunnelflare/tunnel.log"));
    }

    #[test]
    fn test_ensure_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = TunnelPaths::new(dir.path().join("nested/state"));
        assert!(paths.ensure_state_dir().is_ok());
        assert!(paths.state_dir.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_canonicalize_resolves_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let via_link = TunnelPaths::new(link.join(".")).canonicalize().unwrap();
        let direct = TunnelPaths::new(&real).canonicalize().unwrap();
        assert_eq!(via_link, direct);
        assert!(direct.state_dir.is_absolute());
        assert_eq!(direct.config_file, direct.state_dir.join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_canonicalize_creates_state_dir() {
        let dir = tempfile::tempdir().unwrap();
        let paths = TunnelPaths::new(dir.path().join("fresh"))
            .canonicalize()
            .unwrap();
        assert!(paths.state_dir.is_dir());
        assert!(paths.pid_file.starts_with(&paths.state_dir));
    }
}
