// Output formatting and display for CLI

use crate::config::LoggerConfig;
use crate::reader::DataTail;
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a success message
pub fn print_success_msg(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print the logger settings
pub fn print_config(config: &LoggerConfig, data_path: &str, free_space: Option<u64>) {
    println!("\n{}", "Logger Settings".bold().underline());
    println!();
    println!("  {:<15} {}", "Name:".bold(), config.display_name.cyan());
    println!("  {:<15} {}", "Task:".bold(), config.task_name());
    println!("  {:<15} {}", "Enabled:".bold(), format_enabled(config.enabled));
    println!(
        "  {:<15} {}",
        "Period:".bold(),
        format_period(config.sampling_period_ms)
    );
    println!("  {:<15} {}", "Data file:".bold(), data_path);
    println!("  {:<15} {}", "Date format:".bold(), config.date_format);

    if let Some(bytes) = free_space {
        println!("  {:<15} {}", "Free space:".bold(), format_bytes(bytes));
    }

    println!();
}

/// Print data rows as a table
pub fn print_rows(tail: &DataTail) {
    if tail.rows.is_empty() {
        println!("{}", "No rows logged yet".yellow());
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(tail.titles());
    for row in &tail.rows {
        builder.push_record(
            std::iter::once(row.timestamp.clone())
                .chain(row.values.iter().map(|v| truncate(v, 20))),
        );
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    println!("\n{}\n", table);
    println!(
        "{}",
        format!("Showing {} of {} row(s)", tail.rows.len(), tail.total_rows)
            .dimmed()
            .italic()
    );
}

fn format_enabled(enabled: bool) -> String {
    if enabled {
        "yes".green().to_string()
    } else {
        "no".bright_black().to_string()
    }
}

/// Format a sampling period in human-readable form
fn format_period(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms % 1000 != 0 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let secs = ms / 1000;
        if secs < 60 {
            format!("{}s", secs)
        } else if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}m {}s", secs / 60, secs % 60)
        }
    }
}

/// Format a byte count in human-readable form
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{}B", bytes)
    } else if bytes < MB {
        format!("{:.1}KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1}MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.2}GB", bytes as f64 / GB as f64)
    }
}

/// Truncate a string to a maximum number of characters
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
