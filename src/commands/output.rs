//! Styled one-line messages for command output
//!
//! `colored` already honours `NO_COLOR` and non-tty output, so callers only
//! choose the message kind.

use colored::{ColoredString, Colorize};

fn emit(icon: &str, message: ColoredString) {
    println!("{icon} {message}");
}

pub fn success(message: impl AsRef<str>) {
    emit("✅", message.as_ref().green());
}

pub fn info(message: impl AsRef<str>) {
    emit("ℹ️", message.as_ref().cyan());
}

pub fn action(message: impl AsRef<str>) {
    emit("🚀", message.as_ref().blue());
}

pub fn warn(message: impl AsRef<str>) {
    emit("⚠️", message.as_ref().yellow());
}

pub fn current(message: impl AsRef<str>) {
    emit("➜", message.as_ref().cyan().bold());
}

pub fn reuse(message: impl AsRef<str>) {
    emit("♻️", message.as_ref().blue());
}

pub fn link(message: impl AsRef<str>) {
    emit("🔗", message.as_ref().cyan());
}

pub fn rebase(message: impl AsRef<str>) {
    emit("🔄", message.as_ref().blue());
}

pub fn cleanup(message: impl AsRef<str>) {
    emit("🧹", message.as_ref().blue());
}

/// Render a top-level error for stderr.
pub fn format_error(err: &anyhow::Error) -> String {
    format!("❌ {}", format!("{err:#}").trim()).red().to_string()
}

pub fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
