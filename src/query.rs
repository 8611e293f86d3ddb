//! WHOIS client invocation — spawns the external client with timeout-kill and
//! an output cap, and recovers every failure into best-effort text.
//!
//! The client is always run with a structured argument vector (never a
//! shell). Query targets and server overrides are allow-listed before they
//! reach the argument vector so they can never be read as client flags.

use std::future::Future;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::config::ClientConfig;
use crate::error::WhoisError;

/// Longest accepted server override (a DNS name is at most 253 octets).
const MAX_SERVER_LEN: usize = 255;

/// Cap on captured stderr, which only feeds failure descriptions.
const MAX_STDERR_BYTES: usize = 16 * 1024;

fn server_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._:-]+$").expect("valid regex"))
}

/// One WHOIS request: a target and an optional server to ask directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoisQuery {
    pub target: String,
    pub server: Option<String>,
}

impl WhoisQuery {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            server: None,
        }
    }

    pub fn with_server(mut self, server: Option<String>) -> Self {
        self.server = server;
        self
    }

    /// Reject input that could be read as a client flag or smuggle control
    /// characters into the client's argument vector.
    pub fn validate(&self) -> crate::Result<()> {
        let target = self.target.trim();
        if target.is_empty() {
            return Err(WhoisError::InvalidQuery(
                self.target.clone(),
                "query target must not be empty".to_string(),
            ));
        }
        if target.starts_with('-') {
            return Err(WhoisError::InvalidQuery(
                self.target.clone(),
                "query target must not start with '-'".to_string(),
            ));
        }
        if target.chars().any(char::is_control) {
            return Err(WhoisError::InvalidQuery(
                self.target.clone(),
                "query target must not contain control characters".to_string(),
            ));
        }

        if let Some(server) = &self.server {
            if server.is_empty() || server.len() > MAX_SERVER_LEN {
                return Err(WhoisError::InvalidQuery(
                    server.clone(),
                    format!("server must be 1-{} characters", MAX_SERVER_LEN),
                ));
            }
            if server.starts_with('-') || !server_pattern().is_match(server) {
                return Err(WhoisError::InvalidQuery(
                    server.clone(),
                    "server must be a hostname or IP address".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Arguments passed to the client after any configured extra flags.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(3);
        if let Some(server) = &self.server {
            args.push("-h".to_string());
            args.push(server.clone());
        }
        args.push(self.target.trim().to_string());
        args
    }
}

/// Why an invocation did not complete cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryFailure {
    /// The client could not be started at all.
    #[error("failed to spawn '{command}': {reason}")]
    Spawn { command: String, reason: String },

    /// The client exited unsuccessfully.
    #[error("whois exited with status {}: {}", exit_label(.code), .stderr.trim())]
    Exit { code: Option<i32>, stderr: String },

    /// The client ran past its deadline and was killed.
    #[error("whois timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Stdout exceeded the cap; the client was killed.
    #[error("whois output exceeded {0} bytes")]
    OutputTooLarge(usize),

    /// Reading pipes or waiting on the child failed.
    #[error("whois I/O error: {0}")]
    Io(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

/// Result of one invocation. Never an error: failures keep whatever stdout
/// was captured so the caller can decide whether it is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Completed(String),
    Failed {
        partial: String,
        failure: QueryFailure,
    },
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Completed(_))
    }

    pub fn failure(&self) -> Option<&QueryFailure> {
        match self {
            QueryOutcome::Completed(_) => None,
            QueryOutcome::Failed { failure, .. } => Some(failure),
        }
    }

    /// Best-effort response text: stdout on success; on failure the partial
    /// stdout when there is any, else the failure description.
    pub fn into_text(self) -> String {
        match self {
            QueryOutcome::Completed(stdout) => stdout,
            QueryOutcome::Failed { partial, failure } => {
                if partial.is_empty() {
                    failure.to_string()
                } else {
                    partial
                }
            }
        }
    }
}

/// Executes a validated query against some WHOIS backend.
pub trait QueryRunner: Send + Sync {
    fn run(&self, query: &WhoisQuery) -> impl Future<Output = QueryOutcome> + Send;
}

/// Runs the system WHOIS client as a subprocess.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    pub command: String,
    /// Extra flags placed before the query arguments.
    pub args: Vec<String>,
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl ProcessRunner {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: config.timeout(),
            max_output_bytes: config.max_output_bytes,
        }
    }

    /// Full argument vector for a query.
    pub fn command_args(&self, query: &WhoisQuery) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend(query.to_args());
        args
    }
}

impl QueryRunner for ProcessRunner {
    /// Spawns `tokio::process::Command` with structured args, drains stdout
    /// and stderr concurrently, and races both the drain and the exit wait
    /// against one deadline. On timeout or output overflow the child is
    /// killed (not just the future dropped).
    async fn run(&self, query: &WhoisQuery) -> QueryOutcome {
        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.timeout;
        let args = self.command_args(query);

        let mut cmd = Command::new(&self.command);
        cmd.args(&args);
        cmd.stdin(std::process::Stdio::null());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let failure = QueryFailure::Spawn {
                    command: self.command.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!(command = %self.command, error = %failure, "whois spawn failed");
                return QueryOutcome::Failed {
                    partial: String::new(),
                    failure,
                };
            }
        };

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let mut stdout_bytes = Vec::new();
        let mut stderr_bytes = Vec::new();

        // Buffers keep whatever was read even if the drain is cut short.
        let drained = tokio::time::timeout_at(deadline, async {
            tokio::join!(
                read_capped(stdout_pipe, self.max_output_bytes, &mut stdout_bytes),
                read_truncated(stderr_pipe, MAX_STDERR_BYTES, &mut stderr_bytes),
            )
        })
        .await;

        let early_failure = match drained {
            Err(_) => Some(QueryFailure::Timeout(self.timeout)),
            Ok((Ok(true), _)) => Some(QueryFailure::OutputTooLarge(self.max_output_bytes)),
            Ok((Err(e), _)) | Ok((_, Err(e))) => Some(QueryFailure::Io(e.to_string())),
            Ok((Ok(false), Ok(()))) => None,
        };

        let failure = match early_failure {
            Some(failure) => {
                let _ = child.kill().await;
                Some(failure)
            }
            None => match tokio::time::timeout_at(deadline, child.wait()).await {
                Err(_) => {
                    let _ = child.kill().await;
                    Some(QueryFailure::Timeout(self.timeout))
                }
                Ok(Err(e)) => Some(QueryFailure::Io(format!("process wait error: {}", e))),
                Ok(Ok(status)) if status.success() => None,
                Ok(Ok(status)) => Some(QueryFailure::Exit {
                    code: status.code(),
                    stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
                }),
            },
        };

        let stdout = String::from_utf8_lossy(&stdout_bytes).into_owned();

        tracing::info!(
            command = %self.command,
            args = ?args,
            ok = %failure.is_none(),
            stdout_bytes = %stdout_bytes.len(),
            duration_ms = %start.elapsed().as_millis(),
            "whois invocation"
        );

        match failure {
            None => QueryOutcome::Completed(stdout),
            Some(failure) => {
                tracing::warn!(
                    command = %self.command,
                    target = %query.target,
                    error = %failure,
                    "whois invocation failed, returning best-effort output"
                );
                QueryOutcome::Failed {
                    partial: stdout,
                    failure,
                }
            }
        }
    }
}

/// Read `pipe` to EOF into `buf`, keeping at most `limit` bytes.
///
/// Returns `Ok(true)` if the stream had more than `limit` bytes. The pipe is
/// dropped on return, so an overflowing writer sees a closed pipe.
async fn read_capped<R: AsyncRead + Unpin>(
    pipe: Option<R>,
    limit: usize,
    buf: &mut Vec<u8>,
) -> std::io::Result<bool> {
    let Some(pipe) = pipe else {
        return Ok(false);
    };
    let mut limited = pipe.take(limit as u64 + 1);
    limited.read_to_end(buf).await?;
    if buf.len() > limit {
        buf.truncate(limit);
        return Ok(true);
    }
    Ok(false)
}

/// Read `pipe` to EOF, keeping the first `limit` bytes in `buf` and
/// discarding the rest. The pipe stays open until the writer closes it.
async fn read_truncated<R: AsyncRead + Unpin>(
    pipe: Option<R>,
    limit: usize,
    buf: &mut Vec<u8>,
) -> std::io::Result<()> {
    let Some(pipe) = pipe else {
        return Ok(());
    };
    let mut head = pipe.take(limit as u64);
    head.read_to_end(buf).await?;
    let mut rest = head.into_inner();
    tokio::io::copy(&mut rest, &mut tokio::io::sink()).await?;
    Ok(())
}
