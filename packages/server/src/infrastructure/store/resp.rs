//! RESP encoding for mass insertion (`redis-cli --pipe`).
//!
//! A command is `*<argc>\r\n` followed by `$<byte length>\r\n<arg>\r\n` for
//! each argument. Lengths count bytes, not characters.

use std::fmt::Write;

/// Encode one command given as its ordered arguments
pub fn encode_command<S: AsRef<str>>(args: &[S]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write!(out, "*{}\r\n", args.len());
    for arg in args {
        let arg = arg.as_ref();
        let _ = write!(out, "${}\r\n{}\r\n", arg.len(), arg);
    }
    out
}

/// Encode a batch of commands back to back
pub fn encode_commands<S: AsRef<str>>(commands: &[Vec<S>]) -> String {
    commands.iter().map(|cmd| encode_command(cmd)).collect()
}
