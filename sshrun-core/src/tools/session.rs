/// RemoteSession: one authenticated SSH connection used for exactly one
/// command.
///
/// Owns the russh handle from the end of the handshake until `disconnect`.
/// The session channel opened by `run` is closed before `run` returns, so
/// the caller only has to disconnect.
use russh::client::{Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use tracing::debug;

use crate::tools::errors::{ExecError, ExecutionFailure};
use crate::tools::ssh::HostKeyVerifier;
use crate::tools::types::{CommandOutput, ExecOptions, StderrMode};

/// SSH extended data type code for stderr
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

pub struct RemoteSession {
    handle: Handle<HostKeyVerifier>,
    address: String,
}

impl RemoteSession {
    pub fn new(handle: Handle<HostKeyVerifier>, address: String) -> Self {
        Self { handle, address }
    }

    /// Returns `Ok(false)` when the server refuses the credentials
    pub async fn authenticate_password(&mut self, user: &str, password: &str) -> Result<bool, russh::Error> {
        let result = self.handle.authenticate_password(user, password).await?;
        Ok(result.success())
    }

    /// Open a session channel, execute `command` on it and close it again.
    ///
    /// # Errors
    /// * `ExecError::Session` if the channel cannot be opened
    /// * `ExecError::Execution` for every failure after that; captured
    ///   stdout is discarded
    pub async fn run(&mut self, command: &str, options: &ExecOptions) -> Result<CommandOutput, ExecError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(ExecError::Session)?;
        debug!(address = %self.address, "session channel open");

        let capture_stderr = options.stderr == StderrMode::Capture;
        let outcome = match options.command_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, collect(&mut channel, command, capture_stderr)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ExecutionFailure::TimedOut(limit)),
                }
            }
            None => collect(&mut channel, command, capture_stderr).await,
        };

        if let Err(e) = channel.close().await {
            debug!(address = %self.address, error = %e, "channel already closed");
        }

        outcome.map_err(ExecError::from)
    }

    /// Close the connection. Errors are logged, never returned.
    pub async fn disconnect(self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
        {
            debug!(address = %self.address, error = %e, "disconnect failed");
        }
        debug!(address = %self.address, "connection closed");
    }
}

/// Send the exec request and read the channel until the server closes it
async fn collect(
    channel: &mut Channel<Msg>,
    command: &str,
    capture_stderr: bool,
) -> Result<CommandOutput, ExecutionFailure> {
    channel
        .exec(true, command)
        .await
        .map_err(ExecutionFailure::Channel)?;

    let mut code = None;
    let mut signal = None;
    let mut stdout: Vec<u8> = vec![];
    let mut stderr: Vec<u8> = vec![];

    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { ref data } => {
                stdout.extend_from_slice(data);
            }
            ChannelMsg::ExtendedData { ref data, ext } => {
                if ext == SSH_EXTENDED_DATA_STDERR && capture_stderr {
                    stderr.extend_from_slice(data);
                }
            }
            ChannelMsg::ExitStatus { exit_status } => {
                code = Some(exit_status);
            }
            ChannelMsg::ExitSignal {
                signal_name,
                error_message,
                ..
            } => {
                signal = Some((format!("{:?}", signal_name), error_message));
            }
            ChannelMsg::Failure => return Err(ExecutionFailure::Refused),
            _ => {}
        }
    }

    let stderr = String::from_utf8_lossy(&stderr).into_owned();
    if let Some((signal, message)) = signal {
        return Err(ExecutionFailure::Signal { signal, message });
    }

    match code {
        Some(0) => Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr,
            exit_status: 0,
        }),
        Some(code) => Err(ExecutionFailure::ExitStatus { code, stderr }),
        None => Err(ExecutionFailure::MissingExitStatus),
    }
}
