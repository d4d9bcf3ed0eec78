pub mod features;
pub mod tools;

// Re-export the types most callers need at the crate root
pub use tools::errors::{AuthFailure, ExecError, ExecutionFailure, Phase};
pub use tools::ssh::CommandExecutor;
pub use tools::types::{
    ArgumentMode, CommandLine, CommandOutput, ConnectionParameters, ExecOptions, HostKeyPolicy,
    StderrMode,
};
