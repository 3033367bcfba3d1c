//! Colorful console output for solve runs.

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::time::Duration;

use crate::domain::{Solution, SolveStatus};

/// ASCII art banner for server startup.
pub fn print_banner() {
    let banner = r#"
  _____          _ _ _ _           _                    _   _
 |  ___|_ _  ___(_) (_) |_ _   _  | |    ___   ___ __ _| |_(_) ___  _ __
 | |_ / _` |/ __| | | | __| | | | | |   / _ \ / __/ _` | __| |/ _ \| '_ \
 |  _| (_| | (__| | | | |_| |_| | | |__| (_) | (_| (_| | |_| | (_) | | | |
 |_|  \__,_|\___|_|_|_|\__|\__, | |_____\___/ \___\__,_|\__|_|\___/|_| |_|
                           |___/
"#;
    println!("{}", banner.cyan().bold());
    println!(
        "  {} {}\n",
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black(),
        "Capacitated Facility Location".bright_cyan()
    );
}

/// Prints the instance dimensions before a solve.
pub fn print_config(customers: usize, sites: usize, total_demand: f64, total_capacity: f64) {
    println!(
        "{} {} {} Problem: customers ({}), sites ({}), demand ({}), capacity ({}), variables ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        customers.to_formatted_string(&Locale::en).bright_yellow(),
        sites.to_formatted_string(&Locale::en).bright_yellow(),
        format_amount(total_demand).bright_yellow(),
        format_amount(total_capacity).bright_yellow(),
        (sites + sites * customers)
            .to_formatted_string(&Locale::en)
            .bright_magenta()
    );
}

/// Prints solve completion with the cost breakdown.
pub fn print_solving_ended(solution: &Solution) {
    let duration = Duration::from_secs_f64(solution.solve_time_seconds.max(0.0));

    println!(
        "{} {} {} Solving ended: time spent ({}), status ({}), open sites ({})",
        timestamp().bright_black(),
        "INFO".bright_green(),
        "[Solver]".bright_cyan(),
        format_duration(duration).yellow(),
        solution.status.as_str().white().bold(),
        solution.open_sites.len().to_string().white()
    );

    // Summary box (60 chars wide, 56 char content area)
    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════╗".bright_cyan());

    let status_text = match solution.status {
        SolveStatus::Optimal => "✓ OPTIMAL SOLUTION FOUND",
        SolveStatus::Infeasible => "✗ INFEASIBLE",
        SolveStatus::NotSolved => "✗ NOT SOLVED TO OPTIMALITY",
    };
    let status_colored = if solution.is_optimal() {
        status_text.bright_green().bold().to_string()
    } else {
        status_text.bright_red().bold().to_string()
    };
    let status_padding = 56usize.saturating_sub(status_text.chars().count());
    let left_pad = status_padding / 2;
    let right_pad = status_padding - left_pad;
    println!(
        "{}{}{}{}{}",
        "║".bright_cyan(),
        " ".repeat(left_pad),
        status_colored,
        " ".repeat(right_pad),
        "║".bright_cyan()
    );

    println!("{}", "╠══════════════════════════════════════════════════════════╣".bright_cyan());

    if solution.is_optimal() {
        print_row("Fixed Costs:", &format_amount(solution.fixed_costs));
        print_row("Variable Costs:", &format_amount(solution.variable_costs));
        print_row("Total Costs:", &format_amount(solution.total_costs()));
        print_row(
            "Open Sites:",
            &format!(
                "{} of {}",
                solution.open_sites.len(),
                solution.instance.sites().len()
            ),
        );
    } else {
        print_row("Message:", &truncate(&solution.message, 36));
    }
    print_row("Solving Time:", &format!("{:.2}s", duration.as_secs_f64()));

    println!("{}", "╚══════════════════════════════════════════════════════════╝".bright_cyan());
    println!();
}

fn print_row(label: &str, value: &str) {
    println!(
        "{}  {:<18}{:>36}  {}",
        "║".bright_cyan(),
        label,
        value,
        "║".bright_cyan()
    );
}

/// Formats a cost or volume rounded to whole units with thousands separators.
///
/// ```
/// use facility_location::console::format_amount;
///
/// assert_eq!(format_amount(4_512_345.6), "4,512,346");
/// assert_eq!(format_amount(-12.0), "-12");
/// ```
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    (value.round() as i64).to_formatted_string(&Locale::en)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

/// Formats a duration nicely.
fn format_duration(d: Duration) -> String {
    let total_ms = d.as_millis();
    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        let mins = total_ms / 60_000;
        let secs = (total_ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

/// Returns a timestamp string.
fn timestamp() -> String {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| format!("{}.{:03}", d.as_secs(), d.subsec_millis()))
        .unwrap_or_else(|_| "0.000".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_handles_non_finite() {
        assert_eq!(format_amount(f64::NAN), "n/a");
        assert_eq!(format_amount(0.4), "0");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
