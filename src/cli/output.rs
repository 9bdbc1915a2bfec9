//! CLI output formatting utilities.

use crate::lecture::Lecture;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a titled block of text.
    pub fn section(title: &str, body: &str) {
        println!("\n{}", style(title).bold());
        if body.is_empty() {
            println!("  {}", style("(not generated yet)").dim());
        } else {
            for line in body.lines() {
                println!("  {}", line);
            }
        }
    }

    /// Print a one-line lecture summary.
    pub fn lecture_item(lecture: &Lecture) {
        println!(
            "  {} {} ({}, {}, {})",
            style("*").cyan(),
            style(preview(&lecture.transcription, 60)).bold(),
            style(&lecture.id).dim(),
            lecture.user_id,
            lecture.created_at.format("%Y-%m-%d %H:%M"),
        );
    }

    /// Print a lecture with all of its generated material.
    pub fn lecture_detail(lecture: &Lecture) {
        Output::header(&format!("Lecture {}", lecture.id));
        Output::kv("User", &lecture.user_id);
        Output::kv("Created", &lecture.created_at.to_rfc3339());
        Output::kv("Updated", &lecture.updated_at.to_rfc3339());
        Output::section("Transcription", &lecture.transcription);
        Output::section("Simple Text", &lecture.simple_text);
        Output::section("Detailed Steps", &lecture.detailed_steps);
        Output::section("Mind Map", &lecture.mind_map);
        Output::section("Summary", &lecture.summary);
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Collapse newlines and truncate to `max_chars` characters with an ellipsis.
fn preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
