//! PID marker file.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tunnel_core::fs::write_atomic;

const MARKER_MODE: u32 = 0o600;

/// Plaintext file holding the PID of the running tunnel.
#[derive(Debug, Clone)]
pub struct PidMarker {
    path: PathBuf,
}

impl PidMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the recorded PID.
    ///
    /// `Ok(None)` when there is no marker; `InvalidData` when it does not
    /// hold a positive integer.
    pub fn read(&self) -> io::Result<Option<u32>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        match contents.trim().parse::<u32>() {
            Ok(pid) if pid > 0 => Ok(Some(pid)),
            _ => Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("PID marker {} holds {:?}", self.path.display(), contents.trim()),
            )),
        }
    }

    /// Durably record a PID.
    pub fn write(&self, pid: u32) -> io::Result<()> {
        write_atomic(&self.path, pid.to_string().as_bytes(), MARKER_MODE)
    }

    /// Remove the marker; a missing marker is not an error.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_clear() {
        let dir = tempfile::tempdir().unwrap();
        let marker = PidMarker::new(dir.path().join("tunnel.pid"));

        assert_eq!(marker.read().unwrap(), None);
        marker.write(4242).unwrap();
        assert_eq!(fs::read_to_string(marker.path()).unwrap(), "4242");
        assert_eq!(marker.read().unwrap(), Some(4242));

        marker.clear().unwrap();
        assert!(!marker.exists());
        marker.clear().unwrap();
    }

    #[test]
    fn test_tolerates_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let marker = PidMarker::new(dir.path().join("tunnel.pid"));
        fs::write(marker.path(), "31337\n").unwrap();
        assert_eq!(marker.read().unwrap(), Some(31337));
    }

    #[test]
    fn test_garbage_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let marker = PidMarker::new(dir.path().join("tunnel.pid"));

        fs::write(marker.path(), "not-a-pid").unwrap();
        assert_eq!(marker.read().unwrap_err().kind(), ErrorKind::InvalidData);

        fs::write(marker.path(), "0").unwrap();
        assert_eq!(marker.read().unwrap_err().kind(), ErrorKind::InvalidData);
    }
}
