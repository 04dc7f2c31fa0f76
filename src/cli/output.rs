// Output formatting and display for CLI

use crate::error::{CorralError, Result};
use crate::process::{ExitReport, ProcessState};
use chrono::{DateTime, Local};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a formatted table of exit reports
pub fn print_report_table(reports: &[ExitReport]) {
    if reports.is_empty() {
        println!("{}", "No processes were supervised".yellow());
        return;
    }

    #[derive(Tabled)]
    struct ReportRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "PID")]
        pid: String,
        #[tabled(rename = "Outcome")]
        outcome: String,
        #[tabled(rename = "Exit Code")]
        exit_code: String,
        #[tabled(rename = "Runtime")]
        runtime: String,
        #[tabled(rename = "Started")]
        started: String,
    }

    let rows: Vec<ReportRow> = reports
        .iter()
        .map(|r| {
            let started: DateTime<Local> = r.launched_at.into();
            ReportRow {
                id: r.id.to_string(),
                name: truncate(&r.name, 20),
                pid: r.pid.to_string(),
                outcome: format_outcome_colored(r),
                exit_code: r
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                runtime: format_duration(&r.runtime),
                started: started.format("%H:%M:%S").to_string(),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    println!("\n{}\n", table);
    println!(
        "{}",
        format!("Total: {} process(es)", reports.len())
            .dimmed()
            .italic()
    );
}

/// Print exit reports as pretty JSON
pub fn print_report_json(reports: &[ExitReport]) -> Result<()> {
    let json = serde_json::to_string_pretty(reports)
        .map_err(|e| CorralError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Format a report's outcome with color coding
fn format_outcome_colored(report: &ExitReport) -> String {
    match report.state {
        ProcessState::Running => report.state.to_string().yellow().to_string(),
        ProcessState::Exited => {
            if report.exit_code == Some(0) {
                report.state.to_string().green().to_string()
            } else {
                report.state.to_string().red().to_string()
            }
        }
        ProcessState::TimedOut => report.state.to_string().yellow().bold().to_string(),
        ProcessState::Halted => report.state.to_string().bright_black().to_string(),
        ProcessState::Lost => report.state.to_string().red().bold().to_string(),
    }
}

/// Format a duration in human-readable form
pub(crate) fn format_duration(duration: &Duration) -> String {
    if duration.as_secs() == 0 {
        return format!("{}ms", duration.as_millis());
    }

    let secs = duration.as_secs();

    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        let mins = secs / 60;
        let secs = secs % 60;
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}h", hours)
        }
    }
}

/// Truncate a string to a maximum length
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}

/// Create a spinner for long operations
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Finish a spinner with success
pub fn finish_progress_success(pb: ProgressBar, message: &str) {
    pb.finish_with_message(format!("{} {}", "✓".green(), message));
}

/// Finish a spinner with error
pub fn finish_progress_error(pb: ProgressBar, message: &str) {
    pb.finish_with_message(format!("{} {}", "✗".red(), message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(&Duration::from_millis(450)), "450ms");
        assert_eq!(format_duration(&Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(&Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(&Duration::from_secs(3700)), "1h 1m");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a very long string", 10), "this is...");
    }
}
