//! `dep-docs` — discover the dependencies declared across a workspace and
//! resolve documentation links for them.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and install logging ([`logging`]).
//! 2. Load config ([`config::load_config`]).
//! 3. Walk the workspace roots ([`workspace`]).
//! 4. Run every ecosystem crawler over the file listing ([`aggregator`], [`crawler`]).
//! 5. Optionally look up documentation links for selected dependencies (`--docs`, [`docs`]).
//! 6. Render the requested report ([`report`]).

mod aggregator;
mod cli;
mod config;
mod crawler;
mod docs;
mod logging;
mod models;
mod registry;
mod report;
mod workspace;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use aggregator::{build_crawl_report, FsReader};
use cli::{Cli, ReportFormat};
use config::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    let roots = workspace::list_workspace_roots(&cli.paths);
    if roots.is_empty() {
        eprintln!("No workspace directories found");
        std::process::exit(1);
    }

    let config = load_config(&roots[0], cli.config.as_deref())?;

    let mut excluded = config.crawl.exclude_languages.clone();
    excluded.extend(cli.exclude_lang.iter().map(|l| l.tag().to_string()));

    let client = registry::build_client(config.http.timeout_secs, &config.http.user_agent)?;
    let crawlers = crawler::all_crawlers(&config, &client, &excluded);

    let files = workspace::collect_files(&roots, &config.crawl.ignore_dirs).await?;
    let crawl_report = build_crawl_report(&crawlers, &files, &FsReader).await;
    info!(
        languages = crawl_report.languages().count(),
        dependencies = crawl_report.total(),
        "crawl finished"
    );

    let documentation = if cli.docs {
        let selected = docs::select(&crawl_report, &cli.select);
        let pb = progress_bar(docs::lookup_count(&selected), cli.quiet || cli.report == ReportFormat::Json)?;
        let results = docs::resolve_all(&crawlers, &selected, config.http.batch_size, pb.as_ref()).await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        Some(results)
    } else {
        None
    };

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render_dependencies(&crawl_report, &roots, cli.quiet);
            if let Some(results) = &documentation {
                report::terminal::render_documentation(results, cli.quiet);
            }
        }
        ReportFormat::Json => {
            println!("{}", report::json::to_string(&crawl_report, documentation.as_deref())?);
        }
    }

    Ok(())
}

fn progress_bar(len: usize, hidden: bool) -> Result<Option<ProgressBar>> {
    if hidden {
        return Ok(None);
    }

    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("resolving documentation");
    Ok(Some(pb))
}
