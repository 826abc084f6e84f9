use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "dep-docs",
    about = "Discover workspace dependencies and resolve their documentation links",
    version
)]
pub struct Cli {
    /// Workspace roots to crawl
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Config file [default: ./.dep-docs/config.toml, fallback ~/.config/dep-docs/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Look up documentation links in package registries
    #[arg(long)]
    pub docs: bool,

    /// Only look up documentation for this package (repeatable)
    #[arg(long = "select", value_name = "NAME", requires = "docs")]
    pub select: Vec<String>,

    /// Exclude an ecosystem from crawling (repeatable)
    #[arg(long = "exclude-lang", value_name = "LANG")]
    pub exclude_lang: Vec<LanguageArg>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary lines
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LanguageArg {
    Typescript,
    Python,
    Rust,
}

impl LanguageArg {
    /// The crawler language tag this argument refers to.
    pub fn tag(self) -> &'static str {
        match self {
            LanguageArg::Typescript => "typescript",
            LanguageArg::Python => "python",
            LanguageArg::Rust => "rust",
        }
    }
}
