//! Implementations behind the CLI subcommands. Each entity gets a module
//! with `list`/`show` (and `delete` for playbooks); `generate` drives the
//! report builders.

pub mod generate;
pub mod host;
pub mod play;
pub mod playbook;
pub mod record;
pub mod result;
pub mod task;

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

use crate::models::Status;

/// Print an aligned table. Cells are plain text so the column widths stay
/// honest; coloring is reserved for show output.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_line.join("  "));
    println!(
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", line.join("  "));
    }
}

pub(crate) fn colorize_status(status: Status) -> ColoredString {
    let s = status.as_str();
    match status {
        Status::Ok => s.green(),
        Status::Changed => s.yellow(),
        Status::Failed => s.red(),
        Status::Unreachable => s.red().bold(),
        Status::Skipped => s.cyan(),
    }
}

pub(crate) fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

pub(crate) fn duration(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> String {
    match end {
        Some(end) => format!("{:.3}s", (end - start).num_milliseconds() as f64 / 1000.0),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_absent() {
        assert_eq!(format_time(None), "-");
    }

    #[test]
    fn test_duration() {
        let start = Utc::now();
        let end = start + chrono::Duration::milliseconds(1500);
        assert_eq!(duration(start, Some(end)), "1.500s");
        assert_eq!(duration(start, None), "-");
    }
}
