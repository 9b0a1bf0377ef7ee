//! Output formatting for CLI commands.
//!
//! Records are written as JSON lines by the snapshot saver; this module
//! covers everything else a command prints: statistics, degree listings
//! and short status messages, in text or JSON.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers
//! - [`gml`]: Graph export for visualization tools

pub mod color;
pub mod gml;

use crate::domain::Address;
use crate::snapshot::Stats;
use serde::Serialize;
use std::env;
use std::io::{self, Write};

pub use color::{Style, paint, success, warning};

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create an `OutputConfig` by reading from environment variables.
    ///
    /// Reads:
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `MEMDUMP_COLOR`: Set to "0" or "false" to disable colors (default: true)
    #[must_use]
    pub fn from_env() -> Self {
        // Respect NO_COLOR standard (https://no-color.org/)
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("MEMDUMP_COLOR").map_or(true, |v| v != "0" && !v.eq_ignore_ascii_case("false"));
        Self { use_colors }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

impl OutputMode {
    /// `Json` when `json` is set, `Text` otherwise.
    #[must_use]
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

/// One line of the out-degree listing.
#[derive(Debug, Serialize)]
struct DegreeEntry<'a> {
    address: &'a str,
    out_degree: usize,
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print dump statistics in the specified format
pub fn print_stats(stats: &Stats, mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Text => write_stats_text(&mut handle, stats, &OutputConfig::from_env()),
        OutputMode::Json => write_json(&mut handle, stats),
    }
}

/// Print `(address, out-degree)` pairs in the specified format
pub fn print_out_degree(degrees: &[(Address, usize)], mode: OutputMode) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match mode {
        OutputMode::Text => write_out_degree_text(&mut handle, degrees, &OutputConfig::from_env()),
        OutputMode::Json => {
            let entries: Vec<DegreeEntry<'_>> = degrees
                .iter()
                .map(|(address, out_degree)| DegreeEntry {
                    address: address.as_str(),
                    out_degree: *out_degree,
                })
                .collect();
            write_json(&mut handle, &entries)
        }
    }
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{msg}")
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, value)
}

// ============================================================================
// Formatting
// ============================================================================

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

fn write_stats_text<W: Write>(w: &mut W, stats: &Stats, config: &OutputConfig) -> io::Result<()> {
    let entries = stats.sorted_by_count();
    let width = entries
        .first()
        .map_or(1, |(_, count)| count.to_string().len());

    writeln!(
        w,
        "{} {} objects, {} unknown",
        paint("Total:", Style::Heading, config),
        stats.total(),
        stats.unknown
    )?;
    for (class, count) in entries {
        writeln!(w, "  {count:>width$}  {}", paint(class, Style::Identifier, config))?;
    }
    Ok(())
}

fn write_out_degree_text<W: Write>(
    w: &mut W,
    degrees: &[(Address, usize)],
    config: &OutputConfig,
) -> io::Result<()> {
    if degrees.is_empty() {
        return writeln!(w, "{}", paint("No records.", Style::Muted, config));
    }
    for (address, degree) in degrees {
        writeln!(w, "{}  {degree}", paint(address.as_str(), Style::Identifier, config))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;
    use crate::snapshot::Dump;

    fn plain() -> OutputConfig {
        OutputConfig { use_colors: false }
    }

    fn stats() -> Stats {
        Dump::from_records([
            Record::new("0x1").with_class("String"),
            Record::new("0x2").with_class("String"),
            Record::new("0x3").with_type("NODE"),
            Record::new("0x4"),
        ])
        .stats()
    }

    #[test]
    fn stats_text_lists_most_frequent_first() {
        let mut buffer = Vec::new();
        write_stats_text(&mut buffer, &stats(), &plain()).unwrap();
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Total: 4 objects, 1 unknown");
        assert_eq!(lines[1], "  2  String");
        assert_eq!(lines[2], "  1  NODE");
    }

    #[test]
    fn stats_json_has_histogram() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &stats()).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed["unknown"], 1);
        assert_eq!(parsed["by_class"]["String"], 2);
    }

    #[test]
    fn out_degree_text() {
        let degrees = vec![(Address::new("0x1"), 0), (Address::new("0x2"), 3)];
        let mut buffer = Vec::new();
        write_out_degree_text(&mut buffer, &degrees, &plain()).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "0x1  0\n0x2  3\n");

        let mut buffer = Vec::new();
        write_out_degree_text(&mut buffer, &[], &plain()).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "No records.\n");
    }

    #[test]
    fn output_mode_from_flag() {
        assert_eq!(OutputMode::from_flag(true), OutputMode::Json);
        assert_eq!(OutputMode::from_flag(false), OutputMode::Text);
    }
}
