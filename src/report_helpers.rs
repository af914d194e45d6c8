use serde::Serialize;
use unicode_width::UnicodeWidthStr;

/// Compute the max display width for file names, with a minimum of `min`.
/// Uses unicode display width so non-ASCII paths still align.
pub fn max_name_width<'a>(names: impl Iterator<Item = &'a str>, min: usize) -> usize {
    names
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(min)
        .max(min)
}

/// Print a horizontal separator of box-drawing chars.
pub fn separator(width: usize) -> String {
    "\u{2500}".repeat(width)
}

/// Serialize to pretty JSON and print to stdout.
pub fn print_json_stdout(value: &impl Serialize) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[path = "report_helpers_test.rs"]
mod tests;
