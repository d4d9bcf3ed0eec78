use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

use crate::tools::shell_escape::quote_arg;

pub const DEFAULT_PORT: u16 = 22;

/// Everything needed to reach and log into one remote host.
///
/// Rebuilt by the caller for every invocation; the password lives only in
/// memory and is redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct ConnectionParameters {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl ConnectionParameters {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// `host:port` label used in logs and error messages
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn display_name(&self) -> String {
        format!("{}@{}", self.username, self.address())
    }
}

/// How the server's host key is checked during the handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Accept whatever key the server presents. Vulnerable to interception.
    AcceptAny,
    /// Accept only a key with this SHA-256 fingerprint (`SHA256:...`)
    Pinned(String),
    /// Look the host up in an OpenSSH known_hosts file
    KnownHosts(PathBuf),
}

impl Default for HostKeyPolicy {
    fn default() -> Self {
        HostKeyPolicy::KnownHosts(default_known_hosts_path())
    }
}

pub fn default_known_hosts_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.ssh/known_hosts").to_string())
}

/// What happens to the remote command's standard error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StderrMode {
    #[default]
    Discard,
    /// Collect stderr into `CommandOutput::stderr`, apart from stdout
    Capture,
}

/// Per-call knobs. `Default` gives blocking-forever transport behaviour
/// and known_hosts verification.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub host_key_policy: HostKeyPolicy,
    /// Bound on TCP dial and SSH handshake, each
    pub connect_timeout: Option<Duration>,
    /// Bound on the remote command, from exec request to channel close
    pub command_timeout: Option<Duration>,
    pub stderr: StderrMode,
}

impl ExecOptions {
    pub fn with_host_key_policy(mut self, policy: HostKeyPolicy) -> Self {
        self.host_key_policy = policy;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn with_stderr(mut self, stderr: StderrMode) -> Self {
        self.stderr = stderr;
        self
    }
}

/// How extra arguments are appended to the base command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgumentMode {
    /// Joined with single spaces and handed to the remote shell as-is.
    /// Argument content can inject shell syntax.
    #[default]
    Raw,
    /// Each argument is single-quoted so the remote shell sees it literally
    Quoted,
}

/// A base command plus caller-supplied arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub base: String,
    pub args: Vec<String>,
    pub mode: ArgumentMode,
}

impl CommandLine {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            args: Vec::new(),
            mode: ArgumentMode::Raw,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_mode(mut self, mode: ArgumentMode) -> Self {
        self.mode = mode;
        self
    }

    /// The exact string sent in the exec request.
    ///
    /// Blank arguments are dropped. With nothing left the base command is
    /// returned untouched.
    pub fn render(&self) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .filter(|arg| !arg.is_empty())
            .map(|arg| match self.mode {
                ArgumentMode::Raw => arg.clone(),
                ArgumentMode::Quoted => quote_arg(arg),
            })
            .collect();

        if args.is_empty() {
            self.base.clone()
        } else {
            format!("{} {}", self.base, args.join(" "))
        }
    }
}

impl From<&str> for CommandLine {
    fn from(command: &str) -> Self {
        CommandLine::new(command)
    }
}

impl From<String> for CommandLine {
    fn from(command: String) -> Self {
        CommandLine::new(command)
    }
}

/// Output of a command that exited with status 0
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Everything written to stdout, untrimmed
    pub stdout: String,
    /// Empty unless stderr was captured
    pub stderr: String,
    pub exit_status: u32,
}
