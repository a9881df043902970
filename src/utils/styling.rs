//! Terminal styling for the human-readable command output

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SEED: Emoji<'_, '_> = Emoji("🎲 ", "");
pub static TREE: Emoji<'_, '_> = Emoji("🌲 ", "");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
    ╔╦╗╔═╗╔╦╗╦╔═╗╔═╗╔╗╔╔═╗╔═╗
    ║║║║╣  ║║║╚═╗║╣ ║║║╚═╗║╣
    ╩ ╩╚═╝═╩╝╩╚═╝╚═╝╝╚╝╚═╝╚═╝
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {}",
        style("Dementia group classification on longitudinal MRI records").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print the training configuration card
pub fn print_config(store: &Path, seed: u64, test_size: f64, rounds: usize, learning_rate: f64) {
    println!("    {}", style("Configuration").cyan().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!("      {}Store:          {}", FOLDER, truncate_path(store, 34));
    println!("      {}Seed:           {}", SEED, style(seed).yellow());
    println!(
        "      {}Validation:     {}",
        CHART,
        style(format!("{:.0}%", test_size * 100.0)).yellow()
    );
    println!(
        "      {}Boosting:       {} rounds @ {}",
        TREE,
        style(rounds).yellow(),
        style(learning_rate).yellow()
    );
}

/// Print a step header
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print elapsed time for a step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("⏱ {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print a styled count line
pub fn print_count(description: &str, count: usize) {
    println!("      {} {}", style(count).yellow().bold(), description);
}

pub fn print_completion(message: &str) {
    println!();
    println!("    {} {}", SPARKLE, style(message).green().bold());
    println!();
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string_keeps_short_values() {
        assert_eq!(truncate_string("data/store", 20), "data/store");
    }

    #[test]
    fn test_truncate_string_keeps_tail() {
        assert_eq!(truncate_string("/very/long/path/to/store", 10), "...o/store");
    }
}
