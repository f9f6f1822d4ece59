//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use owo_colors::OwoColorize;
use webpopt_image::ConversionOutcome;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print a conversion outcome with the matching status glyph
    pub fn outcome(outcome: &ConversionOutcome) {
        let line = describe_outcome(outcome);
        match outcome {
            ConversionOutcome::Converted { .. } => Self::success(&line),
            ConversionOutcome::SkippedNotSmaller | ConversionOutcome::SkippedDisabled => {
                Self::info(&line);
            }
            ConversionOutcome::Failed { .. } => Self::error(&line),
        }
    }
}

/// One-line, uncolored description of a conversion outcome
pub fn describe_outcome(outcome: &ConversionOutcome) -> String {
    match outcome {
        ConversionOutcome::Converted {
            new_path,
            original_size,
            new_size,
        } => format!(
            "Converted to {} ({} → {}, saved {})",
            new_path.display(),
            format_size(*original_size),
            format_size(*new_size),
            format_percent(*original_size, *new_size),
        ),
        ConversionOutcome::SkippedNotSmaller => {
            "Skipped: WebP output was not smaller, original kept".to_string()
        }
        ConversionOutcome::SkippedDisabled => {
            "Skipped: automatic conversion is disabled or the codec is unavailable".to_string()
        }
        ConversionOutcome::Failed { reason } => format!("Failed: {reason}"),
    }
}

/// Format a duration for display
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f32();
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs % 60.0;
        format!("{}m {:.0}s", mins, remaining_secs)
    }
}

/// Format a file size for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format the size reduction from `before` to `after` as a percentage
pub fn format_percent(before: u64, after: u64) -> String {
    if before == 0 {
        return "0%".to_string();
    }
    let saved = before.saturating_sub(after) as f64 / before as f64 * 100.0;
    format!("{:.0}%", saved)
}
