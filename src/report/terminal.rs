use std::path::PathBuf;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::{CrawlReport, DocsOutcome, DocumentationResult};

/// Render the dependency report, one table per language.
pub fn render_dependencies(report: &CrawlReport, roots: &[PathBuf], quiet: bool) {
    if quiet {
        let per_language: Vec<String> = report
            .iter()
            .map(|(lang, records)| format!("{}: {}", lang, records.len()))
            .collect();
        println!(
            "Total: {}  {}",
            report.total().to_string().bold(),
            per_language.join("  ")
        );
        return;
    }

    println!("\n {} v{}", "dep-docs".bold(), env!("CARGO_PKG_VERSION"));
    for root in roots {
        println!(" Scanning: {}", root.display());
    }
    println!();

    if report.is_empty() {
        println!(" {} No supported package manifests found\n", "[INFO]".yellow().bold());
        return;
    }

    for (language, records) in report.iter() {
        println!(
            " {} {} dependencies\n",
            format!("[{}]", language).cyan().bold(),
            records.len()
        );

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Name").add_attribute(Attribute::Bold),
                Cell::new("Version").add_attribute(Attribute::Bold),
                Cell::new("Found in").add_attribute(Attribute::Bold),
            ]);

        for record in records {
            table.add_row(vec![
                Cell::new(&record.name),
                Cell::new(display_version(&record.version)),
                Cell::new(&record.found_in_filepath).fg(Color::DarkGrey),
            ]);
        }

        println!("{}\n", table);
    }

    println!(" Total dependencies: {}\n", report.total().to_string().bold());
}

/// Render documentation lookup results with a link or the reason none was found.
pub fn render_documentation(results: &[DocumentationResult], quiet: bool) {
    let found = results.iter().filter(|r| r.link_str().is_some()).count();

    if quiet {
        println!("Docs: {}  Missing: {}", found, results.len() - found);
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("Documentation").add_attribute(Attribute::Bold),
        ]);

    for result in results {
        let outcome = match &result.outcome {
            DocsOutcome::Link(link) => Cell::new(link).fg(Color::Green),
            DocsOutcome::Error(reason) => Cell::new(format!("✗ {}", reason)).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&result.package.name),
            Cell::new(display_version(&result.package.version)),
            outcome,
        ]);
    }

    println!(" {} Documentation links\n", "[DOCS]".green().bold());
    println!("{}\n", table);
    println!(
        " {} found, {} without documentation\n",
        found.to_string().green(),
        (results.len() - found).to_string().red()
    );
}

fn display_version(version: &str) -> &str {
    if version.is_empty() {
        "-"
    } else {
        version
    }
}
