//! Terminal output formatting.

use colored::{ColoredString, Colorize};
use mom_core::analysis::model::RiskLevel;
use mom_core::geo::Coordinate;
use mom_core::locator::model::{Category, HealthcareProvider};
use mom_core::notice::{Notice, NoticeVariant};
use mom_core::report::{ScanReport, NEXT_STEPS};

/// Print a notice the way the app shows a toast.
pub fn print_notice(notice: &Notice) {
    match notice.variant {
        NoticeVariant::Default => {
            println!("{} {}", "✓".green().bold(), notice.title.bold());
            println!("  {}", notice.description.dimmed());
        }
        NoticeVariant::Destructive => {
            eprintln!("{} {}", "✗".red().bold(), notice.title.red().bold());
            eprintln!("  {}", notice.description);
        }
    }
}

fn badge(level: RiskLevel) -> ColoredString {
    let text = format!(" {} ", level.badge());
    match level {
        RiskLevel::Low => text.black().on_green(),
        RiskLevel::Moderate => text.black().on_yellow(),
        RiskLevel::High => text.white().on_red(),
    }
}

/// Print the results screen.
pub fn print_results(report: &ScanReport) {
    println!();
    println!("{}", "Scan Results".magenta().bold());
    println!(
        "{}",
        format!(
            "{}x{} photo from {}",
            report.image_width,
            report.image_height,
            report.source.label().to_lowercase()
        )
        .dimmed()
    );
    println!();
    println!(
        "{}  {}",
        badge(report.result.risk_level),
        report.confidence_line()
    );
    println!();

    println!("{}", "Key Findings".bold());
    for finding in &report.result.findings {
        println!("  {} {}", "•".magenta(), finding);
    }
    println!();

    println!("{}", "Recommendations".bold());
    for (i, rec) in report.result.recommendations.iter().enumerate() {
        println!("  {}. {}", i + 1, rec);
    }
    println!();

    println!("{}", "Next Steps".bold());
    println!("  {}", NEXT_STEPS.join(" · ").dimmed());
}

/// Print providers as a table.
pub fn print_providers(category: Category, origin: Coordinate, providers: &[HealthcareProvider]) {
    println!();
    println!(
        "{} {}",
        category.plural().magenta().bold(),
        format!("near {origin}").dimmed()
    );

    if providers.is_empty() {
        println!("{}", "No providers found nearby.".dimmed());
        return;
    }

    println!(
        "{:<3} {:<32} {:<6} {:<9} {}",
        "#", "Name", "Rating", "Distance", "Address"
    );
    println!("{}", "─".repeat(90));

    for (i, p) in providers.iter().enumerate() {
        let rating = format!("{:.1}", p.rating);
        let rating = if p.rating >= 4.0 {
            rating.green()
        } else if p.rating > 0.0 {
            rating.yellow()
        } else {
            rating.dimmed()
        };
        println!(
            "{:<3} {:<32} {:<6} {:<9} {}",
            i + 1,
            truncate(&p.name, 30),
            rating,
            p.distance,
            p.address
        );
        if let Some(hours) = &p.hours {
            println!("    {}", hours.dimmed());
        }
        if let Some(phone) = &p.phone {
            println!("    {} {}", "☎".cyan(), phone);
        }
        println!("    {}", p.directions_url().dimmed());
    }

    println!();
    println!("{} provider(s) found", providers.len());
}

/// Truncate a string to `max` characters.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(2)).collect();
        format!("{cut}..")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Skin Clinic", 30), "Skin Clinic");
        assert_eq!(truncate("Dermatology Associates of Greater Paris", 12), "Dermatolog..");
    }
}
