// One-shot remote command execution
//
// Assemble the command line the caller asked for and run it over a fresh
// connection.

use crate::tools::{
    errors::ExecError,
    ssh::CommandExecutor,
    types::{CommandLine, CommandOutput, ConnectionParameters, ExecOptions},
};

pub async fn execute(
    params: ConnectionParameters,
    command: &CommandLine,
    options: ExecOptions,
) -> Result<CommandOutput, ExecError> {
    ensure_command(command)?;
    CommandExecutor::new(params, options).execute(command).await
}

pub fn execute_blocking(
    params: ConnectionParameters,
    command: &CommandLine,
    options: ExecOptions,
) -> Result<CommandOutput, ExecError> {
    ensure_command(command)?;
    CommandExecutor::new(params, options).execute_blocking(command)
}

fn ensure_command(command: &CommandLine) -> Result<(), ExecError> {
    if command.base.trim().is_empty() {
        return Err(ExecError::InvalidParameters(
            "Command required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::HostKeyPolicy;

    #[tokio::test]
    async fn test_empty_command_is_rejected() {
        let params = ConnectionParameters::new("127.0.0.1", 22, "user", "pass");
        let options = ExecOptions::default().with_host_key_policy(HostKeyPolicy::AcceptAny);

        let err = execute(params, &CommandLine::new("  ").with_args(["-a"]), options)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::InvalidParameters(ref msg) if msg == "Command required"));
    }
}
