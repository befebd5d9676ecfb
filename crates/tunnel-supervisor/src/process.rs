//! OS process checks and signalling.

use std::io;
use std::path::Path;

fn raw_pid(pid: u32) -> Option<libc::pid_t> {
    libc::pid_t::try_from(pid).ok().filter(|pid| *pid > 0)
}

/// Check that a process exists, is ours to signal, and has not exited.
///
/// A process owned by another user (`EPERM`) is treated as not ours.
pub fn is_alive(pid: u32) -> bool {
    let Some(raw) = raw_pid(pid) else {
        return false;
    };

    // SAFETY: signal 0 performs the existence and permission checks only.
    let signalable = unsafe { libc::kill(raw, 0) } == 0;
    signalable && !is_zombie(pid)
}

/// Exited but not yet reaped.
#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid)) else {
        return false;
    };
    // `pid (comm) S ...`; comm may itself contain spaces and parentheses.
    stat.rfind(')')
        .and_then(|end| stat[end + 1..].trim_start().chars().next())
        .is_some_and(|state| state == 'Z' || state == 'X')
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: u32) -> bool {
    false
}

/// Check that a live process was launched against `config_file`.
///
/// Guards against a recycled PID now owned by an unrelated program. The
/// `--config` argument must name the same file, however it was spelled;
/// a relative value is resolved against the process's working directory.
/// Without a readable command line this cannot be disproven and holds.
#[cfg(target_os = "linux")]
pub(crate) fn launched_with(pid: u32, config_file: &Path) -> bool {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let Ok(cmdline) = std::fs::read(format!("/proc/{}/cmdline", pid)) else {
        return true;
    };
    let args: Vec<&OsStr> = cmdline
        .split(|b| *b == 0)
        .filter(|arg| !arg.is_empty())
        .map(OsStr::from_bytes)
        .collect();

    let Some(value) = config_arg(&args) else {
        return false;
    };
    let value = Path::new(value);
    if value == config_file {
        return true;
    }

    let value = if value.is_relative() {
        match std::fs::read_link(format!("/proc/{}/cwd", pid)) {
            Ok(cwd) => cwd.join(value),
            Err(_) => return true,
        }
    } else {
        value.to_path_buf()
    };
    same_file(&value, config_file)
}

/// Value of `--config <file>` or `--config=<file>`.
#[cfg(target_os = "linux")]
fn config_arg<'a>(args: &[&'a std::ffi::OsStr]) -> Option<&'a std::ffi::OsStr> {
    use std::os::unix::ffi::OsStrExt;

    args.iter().enumerate().find_map(|(i, arg)| {
        if *arg == "--config" {
            args.get(i + 1).copied()
        } else {
            arg.as_bytes()
                .strip_prefix(b"--config=")
                .map(std::ffi::OsStr::from_bytes)
        }
    })
}

/// Both paths name one file. A file that is gone compares by its
/// resolved spelling.
#[cfg(target_os = "linux")]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    if let (Ok(ma), Ok(mb)) = (std::fs::metadata(a), std::fs::metadata(b)) {
        return ma.dev() == mb.dev() && ma.ino() == mb.ino();
    }
    let parents = (
        std::fs::canonicalize(parent_or(a)),
        std::fs::canonicalize(parent_or(b)),
    );
    match parents {
        (Ok(pa), Ok(pb)) => pa == pb && a.file_name() == b.file_name(),
        _ => a == b,
    }
}

#[cfg(target_os = "linux")]
fn parent_or(path: &Path) -> &Path {
    path.parent().unwrap_or(path)
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn launched_with(_pid: u32, _config_file: &Path) -> bool {
    true
}

/// Ask a process to terminate.
///
/// Signals the whole process group first so helpers spawned by the tunnel
/// go with it, then falls back to the single process. A process that is
/// already gone is not an error.
pub fn terminate(pid: u32) -> io::Result<()> {
    let Some(raw) = raw_pid(pid) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid pid {}", pid),
        ));
    };

    // SAFETY: plain signal delivery, no memory is shared with the target.
    if unsafe { libc::kill(-raw, libc::SIGTERM) } == 0 {
        return Ok(());
    }
    if unsafe { libc::kill(raw, libc::SIGTERM) } == 0 {
        return Ok(());
    }

    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => Ok(()),
        _ => Err(err),
    }
}
