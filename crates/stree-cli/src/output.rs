//! Output formatting and reporting

use ariadne::{Config, Label, Report, ReportKind, Source};
use colored::*;
use similar::TextDiff;
use std::path::Path;
use std::time::Duration;
use stree_core::ParseError;

/// Character offset of a 1-based line and 0-based character column
fn char_offset(source: &str, line: usize, column: usize) -> usize {
    let before: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(|text| text.chars().count())
        .sum();
    (before + column).min(source.chars().count())
}

/// Render a parse error as a labelled excerpt of the source
pub fn render_parse_error(label: &str, source: &str, err: &ParseError, use_colors: bool) -> String {
    let start = char_offset(source, err.line, err.column);
    let end = (start + 1).min(source.chars().count()).max(start);

    let mut buffer = Vec::new();
    let written = Report::build(ReportKind::Error, (label, start..end))
        .with_config(Config::default().with_color(use_colors))
        .with_message(&err.message)
        .with_label(Label::new((label, start..end)).with_message(&err.message))
        .finish()
        .write((label, Source::from(source)), &mut buffer);

    match written {
        Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
        Err(_) => format!("{label}:{}:{}: {}\n", err.line, err.column, err.message),
    }
}

/// Unified diff between the file on disk and its formatted version
pub fn render_diff(path: &Path, original: &str, formatted: &str) -> String {
    let name = path.display().to_string();
    let diff = TextDiff::from_lines(original, formatted);
    let unified = diff
        .unified_diff()
        .context_radius(3)
        .header(&name, &name)
        .to_string();

    let mut out = String::new();
    for line in unified.split_inclusive('\n') {
        let colored_line = if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else if line.starts_with("@@") {
            line.cyan()
        } else {
            line.normal()
        };
        out.push_str(&colored_line.to_string());
    }
    out
}

/// Counts for a batch run
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub files_checked: usize,
    pub changed: usize,
    pub failed: usize,
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

impl Summary {
    pub fn print_write(&self, elapsed: Duration) {
        eprintln!("{} file{} checked", self.files_checked, plural(self.files_checked));
        if self.changed > 0 {
            eprintln!(
                "{} Formatted {} file{}",
                "✓".green(),
                self.changed,
                plural(self.changed)
            );
        } else if self.failed == 0 {
            eprintln!("{} All files are formatted correctly", "✓".green());
        }
        self.print_failures();
        eprintln!("Completed in {}", utils::format_duration(elapsed));
    }

    pub fn print_check(&self, elapsed: Duration) {
        if self.changed > 0 {
            eprintln!(
                "{} {} of {} file{} need formatting",
                "✗".red(),
                self.changed,
                self.files_checked,
                plural(self.files_checked)
            );
        } else if self.failed == 0 {
            eprintln!("{} All files are formatted correctly", "✓".green());
        }
        self.print_failures();
        eprintln!("Completed in {}", utils::format_duration(elapsed));
    }

    fn print_failures(&self) {
        if self.failed > 0 {
            eprintln!(
                "{} {} file{} could not be formatted",
                "✗".red(),
                self.failed,
                plural(self.failed)
            );
        }
    }
}

/// Utility functions for output formatting
pub mod utils {
    /// Format duration in human-readable format
    pub fn format_duration(duration: std::time::Duration) -> String {
        let total_ms = duration.as_millis();

        if total_ms < 1000 {
            format!("{total_ms}ms")
        } else if total_ms < 60_000 {
            format!("{:.1}s", total_ms as f64 / 1000.0)
        } else {
            let minutes = total_ms / 60_000;
            let seconds = (total_ms % 60_000) as f64 / 1000.0;
            format!("{minutes}m {seconds:.1}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_count_characters() {
        assert_eq!(char_offset("ab\ncd", 2, 1), 4);
        assert_eq!(char_offset("é\nx", 2, 0), 2);
        assert_eq!(char_offset("a", 9, 9), 1);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = ParseError::new("unexpected end-of-input", 1, 4);
        let rendered = render_parse_error("app.rb", "foo(", &err, false);
        assert!(rendered.contains("app.rb"));
        assert!(rendered.contains("unexpected end-of-input"));
    }

    #[test]
    fn diffs_mark_changed_lines() {
        colored::control::set_override(false);
        let rendered = render_diff(Path::new("a.rb"), "x=1\n", "x = 1\n");
        assert!(rendered.contains("-x=1"));
        assert!(rendered.contains("+x = 1"));
    }

    #[test]
    fn durations_are_human_readable() {
        assert_eq!(utils::format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(utils::format_duration(Duration::from_millis(1500)), "1.5s");
    }
}
