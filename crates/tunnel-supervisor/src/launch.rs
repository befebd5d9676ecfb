//! Tunnel launch command.

use std::ffi::OsString;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tunnel_core::{TunnelConfig, TunnelResult};

/// Everything needed to launch the tunnel binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub binary: String,
    pub config_file: PathBuf,
    pub credentials_file: PathBuf,
    pub tunnel_id: String,
}

impl LaunchSpec {
    /// Build a launch spec from a loaded configuration.
    ///
    /// Fails with `ConfigInvalid` without a tunnel ID and with
    /// `MissingCredentials` when the credentials file is absent.
    pub fn from_config(
        binary: impl Into<String>,
        config_file: &Path,
        config: &TunnelConfig,
    ) -> TunnelResult<Self> {
        let tunnel_id = config.tunnel_id()?.to_string();
        let credentials_file = config.credentials_path()?.to_path_buf();

        Ok(Self {
            binary: binary.into(),
            config_file: config_file.to_path_buf(),
            credentials_file,
            tunnel_id,
        })
    }

    /// Arguments: `tunnel --config <file> --cred-file <file> run <id>`.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "tunnel".into(),
            "--config".into(),
            self.config_file.clone().into_os_string(),
            "--cred-file".into(),
            self.credentials_file.clone().into_os_string(),
            "run".into(),
            self.tunnel_id.clone().into(),
        ]
    }

    /// Command writing stdout and stderr to `log`, detached from our session.
    pub fn command(&self, log: File) -> io::Result<Command> {
        let stderr = log.try_clone()?;

        let mut command = Command::new(&self.binary);
        command
            .args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr));

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // New session and process group: no controlling terminal, and
            // hangups or signals aimed at our session never reach it.
            // SAFETY: setsid is async-signal-safe and touches no shared state.
            unsafe {
                command.pre_exec(|| {
                    if libc::setsid() == -1 {
                        return Err(io::Error::last_os_error());
                    }
                    Ok(())
                });
            }
        }

        Ok(command)
    }
}
