//! Terminal output utilities: notes, tables, and incremental reply printing.

use std::io::Write;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

fn paint(style: &str, s: &str) -> String {
    if supports_color() {
        format!("{style}{s}{RESET}")
    } else {
        s.to_string()
    }
}

pub fn dim(s: &str) -> String {
    paint(DIM, s)
}

pub fn bold(s: &str) -> String {
    paint(BOLD, s)
}

// ---------------------------------------------------------------------------
// Formatted notes
// ---------------------------------------------------------------------------

pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        println!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        println!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// Left-aligned table with a bold header row. Cells are plain text.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell}{}", " ".repeat(width - cell.chars().count())))
            .collect();
        format!("  {}", padded.join("  ").trim_end())
    };

    let mut out = bold(&line(headers.to_vec()));
    out.push('\n');
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&line(separator.iter().map(String::as_str).collect()));
    out.push('\n');
    for row in rows {
        let cells: Vec<&str> = (0..headers.len())
            .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        out.push_str(&line(cells));
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Streaming writer
// ---------------------------------------------------------------------------

/// Turns successive full-text snapshots of a reply into terminal output.
///
/// Appends print only the new suffix. When the text no longer extends what
/// was printed (a reset to the fallback), the line is restarted and the whole
/// text printed again.
#[derive(Debug, Default)]
pub struct DeltaPrinter {
    printed: String,
}

impl DeltaPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// What to write so the terminal shows `text`.
    pub fn delta(&mut self, text: &str) -> String {
        let out = match text.strip_prefix(self.printed.as_str()) {
            Some(suffix) => suffix.to_string(),
            None => format!("\n{text}"),
        };
        self.printed = text.to_string();
        out
    }

    pub fn write(&mut self, writer: &mut impl Write, text: &str) -> std::io::Result<()> {
        let delta = self.delta(text);
        if delta.is_empty() {
            return Ok(());
        }
        writer.write_all(delta.as_bytes())?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_table() {
        let rows = vec![
            vec!["ab12".to_string(), "Trip planning".to_string()],
            vec!["cd34".to_string(), "Budget".to_string()],
        ];
        let table = render_table(&["ID", "Title"], &rows);
        assert!(table.contains("Trip planning"));
        assert!(table.contains("  cd34  Budget"));
        assert_eq!(table.lines().count(), 4);
    }

    #[test]
    fn delta_prints_only_new_text() {
        let mut printer = DeltaPrinter::new();
        assert_eq!(printer.delta(""), "");
        assert_eq!(printer.delta("Sure"), "Sure");
        assert_eq!(printer.delta("Sure! Here"), "! Here");
        assert_eq!(printer.delta("Sure! Here's the data..."), "'s the data...");
    }

    #[test]
    fn delta_restarts_on_reset() {
        let mut printer = DeltaPrinter::new();
        printer.delta("half an ans");
        assert_eq!(
            printer.delta("Sorry, there was an error getting a response."),
            "\nSorry, there was an error getting a response."
        );
    }

    #[test]
    fn write_flushes_delta() {
        let mut out = Vec::new();
        let mut printer = DeltaPrinter::new();
        printer.write(&mut out, "ab").unwrap();
        printer.write(&mut out, "abc").unwrap();
        assert_eq!(out, b"abc");
    }
}
