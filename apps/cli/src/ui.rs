use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// A countdown bar whose message is the remaining `mm:ss`.
pub fn create_clock(total_secs: u32) -> ProgressBar {
    let pb = ProgressBar::new(total_secs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:>6} [{bar:40.cyan/blue}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}

pub fn ok(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn fail(msg: &str) {
    println!("{} {}", style("✗").red().bold(), msg);
}

pub fn warn_line(msg: &str) {
    println!("{} {}", style("!").yellow().bold(), msg);
}

pub fn rule() -> String {
    style("─".repeat(60)).dim().to_string()
}
