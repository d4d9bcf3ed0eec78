use russh::client::{self};
use russh::keys::ssh_key;
use secrecy::ExposeSecret;
use std::future::Future;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::runtime::RuntimeFlavor;
use tracing::{debug, warn};

use crate::tools::errors::{AuthFailure, ExecError};
use crate::tools::hostkey::{self, Verdict};
use crate::tools::session::RemoteSession;
use crate::tools::types::{CommandLine, CommandOutput, ConnectionParameters, ExecOptions, HostKeyPolicy};
use crate::tools::validation::validate_host;

/// russh client handler that applies a [`HostKeyPolicy`] during key exchange
pub struct HostKeyVerifier {
    host: String,
    port: u16,
    policy: HostKeyPolicy,
    rejection: Arc<Mutex<Option<String>>>,
}

impl client::Handler for HostKeyVerifier {
    type Error = russh::Error;

    async fn check_server_key(&mut self, server_public_key: &ssh_key::PublicKey) -> Result<bool, Self::Error> {
        let verdict = hostkey::evaluate(&self.policy, &self.host, self.port, server_public_key);
        match &verdict {
            Verdict::Unverified => warn!(
                host = %self.host,
                fingerprint = %hostkey::fingerprint(server_public_key),
                "accepting host key without verification"
            ),
            Verdict::Trusted => debug!(host = %self.host, "host key verified"),
            rejected => {
                warn!(host = %self.host, reason = %rejected.reason(), "host key rejected");
                if let Ok(mut slot) = self.rejection.lock() {
                    *slot = Some(rejected.reason());
                }
            }
        }
        Ok(verdict.accepts())
    }
}

/// Runs one command per call over a fresh, password-authenticated SSH
/// connection.
///
/// Each call dials, authenticates, opens a single session channel, runs the
/// command and tears everything down again. Nothing is shared between calls,
/// so one executor (or clones of it) can serve concurrent callers.
///
/// # Example
/// ```no_run
/// use sshrun_core::tools::ssh::CommandExecutor;
/// use sshrun_core::tools::types::{CommandLine, ConnectionParameters, ExecOptions, HostKeyPolicy};
///
/// # async fn example() -> Result<(), sshrun_core::tools::errors::ExecError> {
/// let params = ConnectionParameters::new("192.168.1.10", 22, "admin", "secret");
/// let options = ExecOptions::default().with_host_key_policy(HostKeyPolicy::AcceptAny);
/// let executor = CommandExecutor::new(params, options);
///
/// let output = executor.execute(&CommandLine::new("ls -l").with_args(["-a", "/tmp"])).await?;
/// print!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    params: ConnectionParameters,
    options: ExecOptions,
}

impl CommandExecutor {
    pub fn new(params: ConnectionParameters, options: ExecOptions) -> Self {
        Self { params, options }
    }

    pub fn params(&self) -> &ConnectionParameters {
        &self.params
    }

    /// Run `command` and return its stdout (and stderr, when captured).
    ///
    /// # Errors
    /// * `ExecError::InvalidParameters` if the host is empty; nothing is dialled
    /// * `ExecError::Connection` if the TCP dial fails; no authentication is attempted
    /// * `ExecError::Authentication` if the handshake, host key or credentials fail
    /// * `ExecError::Session` if no session channel can be opened
    /// * `ExecError::Execution` if the command fails; partial output is dropped
    pub async fn execute(&self, command: &CommandLine) -> Result<CommandOutput, ExecError> {
        validate_host(&self.params.host).map_err(|e| ExecError::InvalidParameters(e.to_string()))?;

        let command = command.render();
        let stream = self.dial().await?;
        let mut session = self.authenticate(stream).await?;

        debug!(target_host = %self.params.address(), %command, "executing");
        let result = session.run(&command, &self.options).await;
        session.disconnect().await;

        match &result {
            Ok(output) => debug!(bytes = output.stdout.len(), "command completed"),
            Err(e) => debug!(error = %e, "command failed"),
        }
        result
    }

    /// Run a ready-made command string and return only its stdout
    pub async fn run(&self, command: &str) -> Result<String, ExecError> {
        self.execute(&CommandLine::new(command))
            .await
            .map(|output| output.stdout)
    }

    /// Blocking form of [`execute`](Self::execute).
    ///
    /// Usable from plain threads and from inside a tokio runtime.
    pub fn execute_blocking(&self, command: &CommandLine) -> Result<CommandOutput, ExecError> {
        block_on(self.execute(command))?
    }

    /// Blocking form of [`run`](Self::run)
    pub fn run_blocking(&self, command: &str) -> Result<String, ExecError> {
        block_on(self.run(command))?
    }

    async fn dial(&self) -> Result<TcpStream, ExecError> {
        let addr = self.params.address();
        debug!(%addr, "dialing");

        let connect = TcpStream::connect((self.params.host.as_str(), self.params.port));
        let stream = match self.options.connect_timeout {
            Some(limit) => match tokio::time::timeout(limit, connect).await {
                Ok(stream) => stream,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("timed out after {:?}", limit),
                )),
            },
            None => connect.await,
        };

        stream.map_err(|source| ExecError::Connection { addr, source })
    }

    async fn authenticate(&self, stream: TcpStream) -> Result<RemoteSession, ExecError> {
        let auth_error = |source: AuthFailure| ExecError::Authentication {
            user: self.params.username.clone(),
            source,
        };

        let rejection = Arc::new(Mutex::new(None));
        let handler = HostKeyVerifier {
            host: self.params.host.clone(),
            port: self.params.port,
            policy: self.options.host_key_policy.clone(),
            rejection: Arc::clone(&rejection),
        };
        let config = Arc::new(client::Config::default());

        let handshake = client::connect_stream(config, stream, handler);
        let handshake = match self.options.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, handshake)
                .await
                .map_err(|_| auth_error(AuthFailure::TimedOut(limit)))?,
            None => handshake.await,
        };

        let handle = handshake.map_err(|err| match err {
            russh::Error::UnknownKey => {
                let reason = rejection
                    .lock()
                    .ok()
                    .and_then(|mut slot| slot.take())
                    .unwrap_or_else(|| "unknown host key".to_string());
                auth_error(AuthFailure::HostKeyRejected(format!(
                    "{} ({})",
                    self.params.address(),
                    reason
                )))
            }
            other => auth_error(AuthFailure::Handshake(other)),
        })?;

        let mut session = RemoteSession::new(handle, self.params.address());
        debug!(user = %self.params.username, "authenticating with password");
        match session
            .authenticate_password(&self.params.username, self.params.password.expose_secret())
            .await
        {
            Ok(true) => Ok(session),
            Ok(false) => {
                session.disconnect().await;
                Err(auth_error(AuthFailure::Rejected))
            }
            Err(err) => {
                session.disconnect().await;
                Err(auth_error(AuthFailure::Handshake(err)))
            }
        }
    }
}

/// Drive `future` to completion from synchronous code.
///
/// A multi-thread runtime is borrowed with `block_in_place`. A current-thread
/// runtime cannot be blocked, so the work moves to a scoped thread with its
/// own runtime, as it does when no runtime exists at all.
fn block_on<F>(future: F) -> Result<F::Output, ExecError>
where
    F: Future + Send,
    F::Output: Send,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            Ok(tokio::task::block_in_place(|| handle.block_on(future)))
        }
        Ok(_) => std::thread::scope(|scope| {
            scope
                .spawn(move || block_on_fresh(future))
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        }),
        Err(_) => block_on_fresh(future),
    }
}

fn block_on_fresh<F: Future>(future: F) -> Result<F::Output, ExecError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ExecError::Runtime)?;
    Ok(runtime.block_on(future))
}
