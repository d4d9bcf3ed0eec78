pub mod errors;
pub mod hostkey;
pub mod macros;
pub mod session;
pub mod shell_escape;
pub mod ssh;
pub mod types;
pub mod validation;
