//! Audit output: every categorize/move/skip decision goes through here.
//!
//! Output is routed through an explicitly passed [`Reporter`] value rather
//! than ambient process state, so tests can construct a capturing reporter
//! and assert on the emitted lines without touching stdout.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;

/// Destination-aware writer for all user-facing output.
///
/// A stdout reporter prints styled lines (routed above the progress bar while
/// one is active); a capturing reporter buffers plain lines instead.
pub struct Reporter {
    capture: Option<Vec<String>>,
    bar: Option<ProgressBar>,
}

impl Reporter {
    /// Creates a reporter that prints to the terminal.
    pub fn stdout() -> Self {
        Self {
            capture: None,
            bar: None,
        }
    }

    /// Creates a reporter that buffers every line for later inspection.
    pub fn captured() -> Self {
        Self {
            capture: Some(Vec::new()),
            bar: None,
        }
    }

    /// Lines emitted so far. Empty for a stdout reporter.
    pub fn lines(&self) -> &[String] {
        self.capture.as_deref().unwrap_or(&[])
    }

    fn emit(&mut self, plain: String, styled: String) {
        if let Some(lines) = &mut self.capture {
            lines.push(plain);
        } else if let Some(bar) = &self.bar {
            bar.println(styled);
        } else {
            println!("{}", styled);
        }
    }

    /// Prints a success line with a green checkmark.
    pub fn success(&mut self, message: &str) {
        self.emit(format!("✓ {}", message), format!("{} {}", "✓".green(), message));
    }

    /// Prints an error line with a red cross. Goes to stderr on a terminal.
    pub fn error(&mut self, message: &str) {
        if let Some(lines) = &mut self.capture {
            lines.push(format!("✗ {}", message));
        } else {
            eprintln!("{} {}", "✗".red(), message);
        }
    }

    /// Prints a warning line.
    pub fn warning(&mut self, message: &str) {
        self.emit(format!("⚠ {}", message), format!("{} {}", "⚠".yellow(), message));
    }

    /// Prints an informational line.
    pub fn info(&mut self, message: &str) {
        self.emit(message.to_string(), message.cyan().to_string());
    }

    /// Prints an unstyled line.
    pub fn plain(&mut self, message: &str) {
        self.emit(message.to_string(), message.to_string());
    }

    /// Prints a section header.
    pub fn header(&mut self, header: &str) {
        self.emit(format!("\n{}", header), format!("\n{}", header.bold()));
    }

    /// Prints a dry-run preview line.
    pub fn dry_run(&mut self, message: &str) {
        let line = format!("[dry-run] {}", message);
        let styled = line.yellow().to_string();
        self.emit(line, styled);
    }

    /// Starts a progress bar over `total` items. Hidden while capturing.
    pub fn start_progress(&mut self, total: u64) {
        let bar = if self.capture.is_some() {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .expect("Invalid progress bar template")
                    .progress_chars("█▓░"),
            );
            bar
        };
        self.bar = Some(bar);
    }

    /// Advances the active progress bar by one item.
    pub fn advance_progress(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Clears and drops the active progress bar.
    pub fn finish_progress(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    /// Prints a per-category summary table.
    pub fn summary_table(&mut self, category_counts: &HashMap<String, usize>, total_files: usize) {
        self.header("SUMMARY");

        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let width = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        for (category, count) in &categories {
            let file_word = if **count == 1 { "file" } else { "files" };
            self.plain(&format!("{:<width$} | {} {}", category, count, file_word));
        }

        self.plain(&"-".repeat(width + 10));
        self.plain(&format!(
            "{:<width$} | {} {}",
            "Total",
            total_files,
            if total_files == 1 { "file" } else { "files" },
        ));
    }
}
