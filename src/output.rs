//! CLI output formatting for a generation run.
//!
//! Output is information-first: each page leads with its presentation index
//! and title, with the file it produced after the arrow. Off-site campaigns
//! show where they link instead of a path.
//!
//! ```text
//! Home → index.html
//! 001 Parques → parques/index.html
//! 002 Ruido → ruido/index.html
//!     Stats: zeroed
//!
//! External
//! Encuesta ↗ https://forms.example/encuesta
//!
//! Assets
//!     css: 1a2b3c4d
//!     js: 5e6f7a8b
//!
//! Removed
//!     old-campaign/
//!
//! Flagged for review
//!     drafts/
//!
//! Warnings
//!     stats for 'ruido' unavailable, using zeroed stats: ...
//!
//! Generated 2 campaign pages, 1 external link, removed 1 directory
//! ```
//!
//! `format_*` functions are pure and return lines; `print_*` wrappers write
//! them to stdout.

use crate::generate::GenerateReport;

fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Push a titled section of indented items, skipping it when empty.
fn section(lines: &mut Vec<String>, title: &str, items: impl IntoIterator<Item = String>) {
    let items: Vec<String> = items.into_iter().collect();
    if items.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(title.to_string());
    lines.extend(items.into_iter().map(|item| format!("{}{}", indent(1), item)));
}

/// Format the summary of a finished run.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = Vec::new();

    let mut position = 0;
    for page in &report.pages {
        let path = page.path.display();
        match &page.slug {
            None => lines.push(format!("Home → {path}")),
            Some(_) => {
                position += 1;
                lines.push(format!("{} {} → {path}", format_index(position), page.title));
                if page.stats_defaulted {
                    lines.push(format!("{}Stats: zeroed", indent(1)));
                }
            }
        }
    }

    if !report.external.is_empty() {
        lines.push(String::new());
        lines.push("External".to_string());
        for link in &report.external {
            lines.push(format!("{} ↗ {}", link.title, link.url));
        }
    }

    section(
        &mut lines,
        "Assets",
        report
            .asset_versions
            .iter()
            .map(|(name, tag)| format!("{name}: {tag}")),
    );
    section(
        &mut lines,
        "Removed",
        report.reconcile.deleted.iter().map(|d| format!("{d}/")),
    );
    section(
        &mut lines,
        "Flagged for review",
        report.reconcile.flagged.iter().map(|d| format!("{d}/")),
    );
    section(
        &mut lines,
        "Warnings",
        report.warnings.iter().map(ToString::to_string),
    );

    let campaign_pages = report.campaign_pages().count();
    let mut summary = format!(
        "Generated {}, {}",
        plural(campaign_pages, "campaign page", "campaign pages"),
        plural(report.external.len(), "external link", "external links"),
    );
    if !report.reconcile.deleted.is_empty() {
        summary.push_str(&format!(
            ", removed {}",
            plural(report.reconcile.deleted.len(), "directory", "directories")
        ));
    }
    lines.push(String::new());
    lines.push(summary);

    lines
}

pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{line}");
    }
}
