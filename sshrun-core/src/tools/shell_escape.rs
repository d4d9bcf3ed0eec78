/// Shell quoting for arguments appended to a remote command
///
/// The remote side of an SSH exec request always runs the string through the
/// user's login shell. Quoting each argument keeps its content literal.

/// Escape a string for use inside a single-quoted shell word.
///
/// Inside single quotes the only special character is the quote itself, so
/// it is written as close-quote, escaped quote, reopen-quote: `'\''`
///
/// # Example
/// ```
/// use sshrun_core::tools::shell_escape::escape_single_quote;
///
/// assert_eq!(escape_single_quote("my'password"), "my'\\''password");
/// ```
pub fn escape_single_quote(s: &str) -> String {
    s.replace('\'', r"'\''")
}

/// Turn one argument into a single shell word the remote shell will not
/// expand, split or interpret.
///
/// Words made only of characters the shell never treats specially are
/// returned unchanged; everything else is wrapped in single quotes.
///
/// # Example
/// ```
/// use sshrun_core::tools::shell_escape::quote_arg;
///
/// assert_eq!(quote_arg("/tmp"), "/tmp");
/// assert_eq!(quote_arg("a b"), "'a b'");
/// assert_eq!(quote_arg("$(id)"), "'$(id)'");
/// ```
pub fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && arg.chars().all(is_plain_char) {
        return arg.to_string();
    }
    format!("'{}'", escape_single_quote(arg))
}

fn is_plain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | ',' | ':' | '=' | '+' | '@')
}
