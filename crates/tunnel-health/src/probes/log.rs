//! Log-derived severity.

use async_trait::async_trait;
use std::fs::File;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use tunnel_core::{LogSeverity, Probe, ProbeReading};

const ERROR_MARKERS: &[&str] = &["error", "fail", "terminated"];
const WARNING_MARKERS: &[&str] = &["warn", "retrying"];
/// Level columns of the tunnel binary's own log format.
const ERROR_LEVELS: &[&str] = &["err", "ftl"];
const WARNING_LEVELS: &[&str] = &["wrn"];

/// Scans the end of the tunnel log for error and warning markers.
///
/// Reads at most `tail_bytes` from the end of the file per run, whatever
/// its size.
pub struct LogProbe {
    path: PathBuf,
    tail_bytes: u64,
    tail_lines: usize,
    interval: Duration,
}

impl LogProbe {
    pub fn new(
        path: impl Into<PathBuf>,
        tail_bytes: u64,
        tail_lines: usize,
        interval: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            tail_bytes,
            tail_lines,
            interval,
        }
    }
}

fn scan(path: &Path, tail_bytes: u64, tail_lines: usize) -> io::Result<(LogSeverity, Vec<String>)> {
    let Some((window, partial_first)) = read_tail(path, tail_bytes)? else {
        return Ok((LogSeverity::Ok, Vec::new()));
    };
    Ok(scan_tail(&window, partial_first, tail_lines))
}

#[async_trait]
impl Probe for LogProbe {
    fn name(&self) -> &str {
        "log"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn check(&self) -> ProbeReading {
        let (path, tail_bytes, tail_lines) = (self.path.clone(), self.tail_bytes, self.tail_lines);

        let scanned = tokio::task::spawn_blocking(move || scan(&path, tail_bytes, tail_lines)).await;
        let (severity, tail) = match scanned {
            Ok(Ok(scanned)) => scanned,
            Ok(Err(e)) => {
                debug!(path = %self.path.display(), error = %e, "Cannot read tunnel log");
                (LogSeverity::Warning, Vec::new())
            }
            Err(e) => {
                debug!(error = %e, "Log scan task failed");
                (LogSeverity::Warning, Vec::new())
            }
        };

        ProbeReading::Log { severity, tail }
    }
}

/// Read up to `max_bytes` from the end of a file.
///
/// Returns `None` if the file does not exist, otherwise the window and
/// whether it starts in the middle of a line.
pub fn read_tail(path: &Path, max_bytes: u64) -> io::Result<Option<(Vec<u8>, bool)>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let len = file.metadata()?.len();
    let start = len.saturating_sub(max_bytes);
    let mut partial_first = false;
    if start > 0 {
        file.seek(SeekFrom::Start(start - 1))?;
        let mut before = [0u8; 1];
        file.read_exact(&mut before)?;
        partial_first = before[0] != b'\n';
    }

    // The file may still be growing; never read past the length seen above.
    let mut window = Vec::with_capacity((len - start) as usize);
    file.take(len - start).read_to_end(&mut window)?;
    Ok(Some((window, partial_first)))
}

/// Severity of a single log line.
pub fn classify_line(line: &str) -> LogSeverity {
    let lower = line.to_lowercase();
    let has_word = |levels: &[&str]| {
        lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| levels.contains(&word))
    };

    if ERROR_MARKERS.iter().any(|m| lower.contains(m)) || has_word(ERROR_LEVELS) {
        LogSeverity::Error
    } else if WARNING_MARKERS.iter().any(|m| lower.contains(m)) || has_word(WARNING_LEVELS) {
        LogSeverity::Warning
    } else {
        LogSeverity::Ok
    }
}

/// Worst severity in a tail window, plus its last `keep_lines` lines.
///
/// A cut-off first line is dropped so a marker split by the window edge
/// is not misread.
pub fn scan_tail(window: &[u8], partial_first: bool, keep_lines: usize) -> (LogSeverity, Vec<String>) {
    let text = String::from_utf8_lossy(window);
    let mut lines: Vec<&str> = text.lines().collect();
    if partial_first && !lines.is_empty() {
        lines.remove(0);
    }

    let severity = lines
        .iter()
        .map(|line| classify_line(line))
        .max()
        .unwrap_or_default();

    let skip = lines.len().saturating_sub(keep_lines);
    let tail = lines[skip..].iter().map(|line| line.to_string()).collect();
    (severity, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("2024-01-01T00:00:00Z INF Registered tunnel connection"), LogSeverity::Ok);
        assert_eq!(classify_line("Connection FAILED to edge"), LogSeverity::Error);
        assert_eq!(classify_line("tunnel terminated"), LogSeverity::Error);
        assert_eq!(classify_line("2024-01-01T00:00:00Z ERR Unable to reach origin"), LogSeverity::Error);
        assert_eq!(classify_line("Retrying connection in 2s"), LogSeverity::Warning);
        assert_eq!(classify_line("2024-01-01T00:00:00Z WRN Cannot determine default origin"), LogSeverity::Warning);
        assert_eq!(classify_line("Warning: deprecated flag"), LogSeverity::Warning);
        // Substrings of longer words are not levels.
        assert_eq!(classify_line("Deferred startup of metrics server"), LogSeverity::Ok);
    }

    #[test]
    fn test_scan_takes_worst() {
        let window = b"INF starting\nWRN slow edge\nERR lost connection\nINF reconnected\n";
        let (severity, tail) = scan_tail(window, false, 2);
        assert_eq!(severity, LogSeverity::Error);
        assert_eq!(tail, vec!["ERR lost connection", "INF reconnected"]);
    }

    #[test]
    fn test_scan_clean() {
        let (severity, tail) = scan_tail(b"INF one\nINF two\n", false, 10);
        assert_eq!(severity, LogSeverity::Ok);
        assert_eq!(tail.len(), 2);
    }

    #[test]
    fn test_partial_first_line_ignored() {
        let (severity, tail) = scan_tail(b"ror in previous\nINF ok\n", true, 10);
        assert_eq!(severity, LogSeverity::Ok);
        assert_eq!(tail, vec!["INF ok"]);
    }

    #[test]
    fn test_missing_log() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_tail(&dir.path().join("tunnel.log"), 2000).unwrap().is_none());
    }

    #[test]
    fn test_tail_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnel.log");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "ERR early failure far back in history").unwrap();
        for i in 0..100_000 {
            writeln!(file, "INF heartbeat {}", i).unwrap();
        }
        drop(file);

        let (window, partial) = read_tail(&path, 2000).unwrap().unwrap();
        assert_eq!(window.len(), 2000);
        let (severity, tail) = scan_tail(&window, partial, 200);
        assert_eq!(severity, LogSeverity::Ok);
        assert_eq!(tail.last().unwrap(), "INF heartbeat 99999");
    }

    #[test]
    fn test_short_file_read_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnel.log");
        std::fs::write(&path, "WRN retrying\n").unwrap();

        let (window, partial) = read_tail(&path, 2000).unwrap().unwrap();
        assert!(!partial);
        assert_eq!(window, b"WRN retrying\n");
    }

    #[tokio::test]
    async fn test_probe_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tunnel.log");
        std::fs::write(&path, "INF up\nERR origin down\n").unwrap();

        let probe = LogProbe::new(&path, 2000, 200, Duration::from_secs(3));
        match probe.check().await {
            ProbeReading::Log { severity, tail } => {
                assert_eq!(severity, LogSeverity::Error);
                assert_eq!(tail, vec!["INF up", "ERR origin down"]);
            }
            other => panic!("unexpected reading {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_without_log_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let probe = LogProbe::new(dir.path().join("tunnel.log"), 2000, 200, Duration::from_secs(3));
        assert_eq!(
            probe.check().await,
            ProbeReading::Log {
                severity: LogSeverity::Ok,
                tail: Vec::new()
            }
        );
    }
}
