// Run the same command against several hosts at once
//
// Every target gets its own executor and its own connection; results come
// back in the order the targets were given.

use futures::future::join_all;

use crate::tools::{
    errors::ExecError,
    ssh::CommandExecutor,
    types::{CommandLine, CommandOutput, ConnectionParameters, ExecOptions},
};

/// Result of one target's execution, labelled `user@host:port`
#[derive(Debug)]
pub struct TargetResult {
    pub label: String,
    pub result: Result<CommandOutput, ExecError>,
}

pub async fn execute_all(
    targets: Vec<ConnectionParameters>,
    command: &CommandLine,
    options: &ExecOptions,
) -> Vec<TargetResult> {
    let runs = targets.into_iter().map(|params| {
        let executor = CommandExecutor::new(params, options.clone());
        async move {
            let result = executor.execute(command).await;
            TargetResult {
                label: executor.params().display_name(),
                result,
            }
        }
    });

    join_all(runs).await
}
