use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// One compact JSON document per line.
pub fn to_line<T: Serialize>(value: &T) -> Result<String> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    Ok(line)
}

pub fn print_gate(kind: &str, available: bool) {
    let mark = if available {
        "supported".green()
    } else {
        "unsupported".yellow()
    };
    println!("  {:<20} {}", kind, mark);
}
