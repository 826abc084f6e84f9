//! Report renderers for crawl and documentation results.
//!
//! - [`terminal`] — colored, tabular output per language; respects `--quiet`.
//! - [`json`] — machine-readable output for `--report json`.

pub mod json;
pub mod terminal;
