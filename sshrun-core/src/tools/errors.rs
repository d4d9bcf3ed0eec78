/// Error types for sshrun operations
///
/// Every failed execution reports exactly one phase. The underlying
/// transport or protocol error stays attached as the error source so callers
/// can display it.
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The step of an execution that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Setting up the local runtime for a blocking call
    Setup,
    Validate,
    Dial,
    Authenticate,
    SessionOpen,
    CommandRun,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Validate => write!(f, "validate"),
            Phase::Dial => write!(f, "dial"),
            Phase::Authenticate => write!(f, "authenticate"),
            Phase::SessionOpen => write!(f, "session-open"),
            Phase::CommandRun => write!(f, "command-run"),
        }
    }
}

/// Errors from a single connect-authenticate-run-disconnect cycle
#[derive(Error, Debug)]
pub enum ExecError {
    /// Parameters unusable before anything is dialled
    #[error("Invalid connection parameters: {0}")]
    InvalidParameters(String),

    /// TCP connection to the host could not be established
    #[error("Connection to {addr} failed: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// SSH negotiation or password authentication failed
    #[error("Authentication as {user} failed: {source}")]
    Authentication {
        user: String,
        #[source]
        source: AuthFailure,
    },

    /// The server refused or failed to open a session channel
    #[error("Failed to open session: {0}")]
    Session(#[source] russh::Error),

    /// The remote command could not run or did not exit cleanly
    #[error("Command failed: {0}")]
    Execution(#[from] ExecutionFailure),

    /// No async runtime could be set up for a blocking call
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl ExecError {
    pub fn phase(&self) -> Phase {
        match self {
            ExecError::Runtime(_) => Phase::Setup,
            ExecError::InvalidParameters(_) => Phase::Validate,
            ExecError::Connection { .. } => Phase::Dial,
            ExecError::Authentication { .. } => Phase::Authenticate,
            ExecError::Session(_) => Phase::SessionOpen,
            ExecError::Execution(_) => Phase::CommandRun,
        }
    }
}

/// Why the authenticate phase failed
#[derive(Error, Debug)]
pub enum AuthFailure {
    /// Key exchange or transport negotiation failed
    #[error("SSH handshake failed: {0}")]
    Handshake(#[source] russh::Error),

    /// The host key did not satisfy the configured policy
    #[error("host key rejected for {0}")]
    HostKeyRejected(String),

    /// The server refused the username/password pair
    #[error("server rejected the credentials")]
    Rejected,

    /// Handshake did not finish in time
    #[error("SSH handshake timed out after {0:?}")]
    TimedOut(Duration),
}

/// Why the command-run phase failed
#[derive(Error, Debug)]
pub enum ExecutionFailure {
    /// Channel-level protocol error while running
    #[error("{0}")]
    Channel(#[source] russh::Error),

    /// The server answered the exec request with a failure
    #[error("server refused to execute the command")]
    Refused,

    /// Command exited with a non-zero status
    #[error("{}", exit_message(*code, stderr))]
    ExitStatus { code: u32, stderr: String },

    /// Command was terminated by a signal
    #[error("terminated by signal {}{}", signal, signal_suffix(message))]
    Signal { signal: String, message: String },

    /// Channel closed without reporting an exit status
    #[error("channel closed without an exit status")]
    MissingExitStatus,

    /// Command did not finish in time
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

fn exit_message(code: u32, stderr: &str) -> String {
    let stderr = stderr.trim_end();
    if stderr.is_empty() {
        format!("exited with status {}", code)
    } else {
        format!("exited with status {}: {}", code, stderr)
    }
}

fn signal_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {}", message)
    }
}

/// Errors related to the settings file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read settings file
    #[error("Failed to read settings: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse settings file
    #[error("Invalid settings format: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Home/config directory could not be determined
    #[error("Could not determine config directory")]
    NoConfigDir,
}
