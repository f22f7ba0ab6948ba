// User-facing console output. Logs go to the log file, never here.

use crossterm::style::Stylize;

pub fn heading(text: &str) {
    println!("\n{}", text.bold());
}

pub fn success(text: &str) {
    println!("{} {text}", "✓".green());
}

pub fn info(text: &str) {
    println!("{} {text}", "•".cyan());
}

pub fn warn(text: &str) {
    println!("{} {text}", "!".yellow());
}

pub fn error(text: &str) {
    eprintln!("{} {text}", "✗".red());
}

/// An error followed by an indented suggestion.
pub fn error_with_fix(text: &str, fix: &str) {
    error(text);
    eprintln!("  {} {fix}", "→".dark_grey());
}

pub fn hint(text: &str) {
    println!("  {}", text.dark_grey());
}

pub fn check_mark(ok: bool) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}
