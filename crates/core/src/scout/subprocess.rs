//! Scraper subprocess management.
//!
//! [`spawn_streaming`] starts the scraper with piped stdout/stderr and turns
//! both pipes into a single ordered stream of [`OutputLine`]s.
//! [`capture`] builds on it for bounded dry runs: it buffers the combined
//! log, feeds stdout to a [`PreviewScanner`], and kills the child once the
//! timeout fires.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use super::preview::PreviewScanner;
use super::ScoutError;

/// Maximum size of the captured log (10 MiB).
///
/// Output beyond this limit is dropped to prevent memory exhaustion from
/// extremely verbose scrapers.
const MAX_LOG_BYTES: usize = 10 * 1024 * 1024;

/// Prefix distinguishing stderr lines in the combined log.
pub const STDERR_PREFIX: &str = "[stderr] ";

/// Which pipe a line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }
}

/// One line of scraper output, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

impl OutputLine {
    /// Line as it appears in the combined log.
    pub fn render(&self) -> String {
        match self.stream {
            OutputStream::Stdout => self.text.clone(),
            OutputStream::Stderr => format!("{STDERR_PREFIX}{}", self.text),
        }
    }
}

/// How a captured run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process exited on its own. `None` when killed by a signal.
    Exited(Option<i32>),
    /// The timeout fired and the process was killed.
    TimedOut,
}

/// Result of a bounded, fully captured scraper run.
#[derive(Debug, Clone)]
pub struct CapturedRun {
    /// Combined stdout/stderr in arrival order, stderr lines prefixed.
    pub log: String,
    /// Preview object from the first `PREVIEW_JSON:` stdout line, if valid.
    pub preview: Option<Map<String, Value>>,
    pub termination: Termination,
    pub duration_ms: u64,
}

/// A spawned scraper whose output is being forwarded line by line.
#[derive(Debug)]
pub struct StreamingChild {
    child: Child,
    lines: mpsc::UnboundedReceiver<OutputLine>,
}

impl StreamingChild {
    /// OS process id, if the process is still running.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Forward every line to `on_line` and wait for the process to exit.
    pub async fn drain<F>(mut self, mut on_line: F) -> std::io::Result<ExitStatus>
    where
        F: FnMut(OutputLine),
    {
        while let Some(line) = self.lines.recv().await {
            on_line(line);
        }
        self.child.wait().await
    }
}

/// Spawn `cmd` with stdout/stderr piped into a line stream.
///
/// Stdin is closed. The caller decides `kill_on_drop` before calling.
pub fn spawn_streaming(cmd: &mut Command) -> Result<StreamingChild, ScoutError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let mut child = cmd
        .spawn()
        .map_err(|source| ScoutError::Spawn { program, source })?;

    let (tx, rx) = mpsc::unbounded_channel();
    forward_lines(child.stdout.take(), OutputStream::Stdout, tx.clone());
    forward_lines(child.stderr.take(), OutputStream::Stderr, tx);

    Ok(StreamingChild { child, lines: rx })
}

/// Run `cmd` to completion, capturing its output, for at most `timeout`.
///
/// On timeout the child is killed and reaped before returning, and the
/// output captured so far is returned with [`Termination::TimedOut`].
pub async fn capture(cmd: &mut Command, timeout: Duration) -> Result<CapturedRun, ScoutError> {
    cmd.kill_on_drop(true);
    let start = Instant::now();
    let mut streaming = spawn_streaming(cmd)?;

    let mut log = LogBuffer::default();
    let mut scanner = PreviewScanner::new();
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            line = streaming.lines.recv() => match line {
                Some(line) => record(&mut log, &mut scanner, &line),
                None => break,
            },
            () = &mut deadline => {
                return kill_timed_out(streaming, log, scanner, start).await;
            }
        }
    }

    // Both pipes closed; the process is exiting.
    let status = tokio::select! {
        status = streaming.child.wait() => status.map_err(ScoutError::Io)?,
        () = &mut deadline => {
            return kill_timed_out(streaming, log, scanner, start).await;
        }
    };

    Ok(CapturedRun {
        log: log.into_string(),
        preview: scanner.finish(),
        termination: Termination::Exited(status.code()),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Kill and reap a timed-out child, keeping any lines already buffered.
async fn kill_timed_out(
    mut streaming: StreamingChild,
    mut log: LogBuffer,
    mut scanner: PreviewScanner,
    start: Instant,
) -> Result<CapturedRun, ScoutError> {
    // No graceful signal first: the dry run is simply over.
    if let Err(e) = streaming.child.start_kill() {
        tracing::warn!(error = %e, "Failed to kill timed-out scraper");
    }
    let _ = streaming.child.wait().await;

    while let Ok(line) = streaming.lines.try_recv() {
        record(&mut log, &mut scanner, &line);
    }

    Ok(CapturedRun {
        log: log.into_string(),
        preview: scanner.finish(),
        termination: Termination::TimedOut,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn record(log: &mut LogBuffer, scanner: &mut PreviewScanner, line: &OutputLine) {
    if line.stream == OutputStream::Stdout {
        scanner.observe(&line.text);
    }
    log.push(&line.render());
}

/// Read `reader` line by line in a background task, sending each line.
///
/// Invalid UTF-8 is replaced rather than aborting the stream.
fn forward_lines<R>(reader: Option<R>, stream: OutputStream, tx: mpsc::UnboundedSender<OutputLine>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(reader) = reader else {
        return;
    };

    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send(OutputLine { stream, text }).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(stream = stream.as_str(), error = %e, "Output stream read failed");
                    break;
                }
            }
        }
    });
}

/// Combined log capped at [`MAX_LOG_BYTES`].
#[derive(Debug, Default)]
struct LogBuffer {
    text: String,
    truncated: bool,
}

impl LogBuffer {
    fn push(&mut self, line: &str) {
        if self.truncated {
            return;
        }
        if self.text.len() + line.len() + 1 > MAX_LOG_BYTES {
            self.truncated = true;
            self.text.push_str("[output truncated]\n");
            return;
        }
        self.text.push_str(line);
        self.text.push('\n');
    }

    fn into_string(self) -> String {
        self.text
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn capture_collects_stdout_and_prefixed_stderr() {
        let run = capture(&mut sh("echo hello; echo oops 1>&2; exit 0"), Duration::from_secs(5))
            .await
            .expect("capture");
        assert_eq!(run.termination, Termination::Exited(Some(0)));
        assert!(run.log.contains("hello\n"));
        assert!(run.log.contains("[stderr] oops\n"));
        assert!(run.preview.is_none());
    }

    #[tokio::test]
    async fn capture_extracts_preview_from_stdout() {
        let script = r#"echo "Navigating"; echo 'PREVIEW_JSON:{"title":"Jazz Night","venue":"Blue Note"}'"#;
        let run = capture(&mut sh(script), Duration::from_secs(5))
            .await
            .expect("capture");
        let preview = run.preview.expect("preview");
        assert_eq!(preview["title"], "Jazz Night");
        assert_eq!(preview["venue"], "Blue Note");
    }

    #[tokio::test]
    async fn preview_on_stderr_is_ignored() {
        let script = r#"echo 'PREVIEW_JSON:{"title":"Hidden"}' 1>&2"#;
        let run = capture(&mut sh(script), Duration::from_secs(5))
            .await
            .expect("capture");
        assert!(run.preview.is_none());
        assert!(run.log.contains("[stderr] PREVIEW_JSON:"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported() {
        let run = capture(&mut sh("echo partial; exit 3"), Duration::from_secs(5))
            .await
            .expect("capture");
        assert_eq!(run.termination, Termination::Exited(Some(3)));
        assert!(run.log.contains("partial"));
    }

    #[tokio::test]
    async fn timeout_kills_and_keeps_partial_log() {
        let started = Instant::now();
        let run = capture(
            &mut sh("echo before-sleep; exec sleep 30"),
            Duration::from_millis(500),
        )
        .await
        .expect("capture");
        assert_eq!(run.termination, Termination::TimedOut);
        assert!(run.log.contains("before-sleep"), "log was: {}", run.log);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let mut cmd = Command::new("/nonexistent/scout-binary");
        let result = capture(&mut cmd, Duration::from_secs(1)).await;
        assert_matches!(result, Err(ScoutError::Spawn { ref program, .. }) if program == "/nonexistent/scout-binary");
    }

    #[tokio::test]
    async fn streaming_child_preserves_order_per_stream() {
        let mut cmd = sh("echo one; echo two; echo three");
        let streaming = spawn_streaming(&mut cmd).expect("spawn");
        let mut lines = Vec::new();
        let status = streaming
            .drain(|line| lines.push(line))
            .await
            .expect("wait");
        assert!(status.success());
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert!(lines.iter().all(|l| l.stream == OutputStream::Stdout));
    }

    #[test]
    fn log_buffer_truncates_once() {
        let mut log = LogBuffer::default();
        let big = "x".repeat(MAX_LOG_BYTES);
        log.push("first");
        log.push(&big);
        log.push("after");
        let text = log.into_string();
        assert_eq!(text, "first\n[output truncated]\n");
    }
}
