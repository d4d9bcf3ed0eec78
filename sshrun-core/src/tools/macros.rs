/// Terminal output formatting utilities
///
/// Status lines go to stderr so stdout carries nothing but remote command
/// output and can be piped.
use colored::Colorize;

/// Output level determines the color and prefix of the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLevel {
    /// Informational messages (blue)
    Info,
    /// Success messages (green)
    Success,
    /// Warning messages (yellow)
    Warning,
    /// Error messages (red)
    Error,
}

impl OutputLevel {
    fn color(&self) -> colored::Color {
        match self {
            OutputLevel::Info => colored::Color::Blue,
            OutputLevel::Success => colored::Color::Green,
            OutputLevel::Warning => colored::Color::Yellow,
            OutputLevel::Error => colored::Color::Red,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            OutputLevel::Info => "info",
            OutputLevel::Success => "success",
            OutputLevel::Warning => "warning",
            OutputLevel::Error => "error",
        }
    }
}

/// Render `label: message` with the label colored for `level`
pub fn format_msg(level: OutputLevel, message: impl AsRef<str>) -> String {
    let label = level.label().color(level.color()).bold();
    format!("{}: {}", label, message.as_ref())
}

/// Print a formatted message to stderr
///
/// # Example
/// ```
/// use sshrun_core::tools::macros::{print_msg, OutputLevel};
///
/// print_msg(OutputLevel::Info, "Connecting");
/// print_msg(OutputLevel::Success, &format!("{} hosts done", 3));
/// ```
pub fn print_msg(level: OutputLevel, message: impl AsRef<str>) {
    eprintln!("{}", format_msg(level, message));
}

pub fn print_error(message: impl AsRef<str>) {
    print_msg(OutputLevel::Error, message);
}

pub fn print_info(message: impl AsRef<str>) {
    print_msg(OutputLevel::Info, message);
}

pub fn print_warning(message: impl AsRef<str>) {
    print_msg(OutputLevel::Warning, message);
}

pub fn print_success(message: impl AsRef<str>) {
    print_msg(OutputLevel::Success, message);
}

/// Bold cyan `==> title` separator used when printing several results
pub fn print_header(title: impl AsRef<str>) {
    println!("{} {}", "==>".cyan().bold(), title.as_ref().bold());
}

/// Print an error message and exit with code 1
pub fn exit_error(message: impl AsRef<str>) -> ! {
    print_error(message);
    std::process::exit(1);
}

/// Print error and exit
#[macro_export]
macro_rules! exit_error {
    ($($arg:tt)*) => {
        $crate::tools::macros::exit_error(&format!($($arg)*))
    };
}
