//! apidoc-from-source - Command-line tool for generating OpenAPI documents.
//!
//! This binary scans source files for `@api` comment annotations and writes
//! one OpenAPI 3.0 document per documentation group.
//!
//! # Usage
//!
//! ```bash
//! apidoc-from-source [OPTIONS] <SOURCE_PATH>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation for a Go service:
//! ```bash
//! apidoc-from-source ./service -r -o openapi.yaml
//! ```
//!
//! Generate JSON from PHP sources only:
//! ```bash
//! apidoc-from-source ./app -r -l php -f json -o openapi.json
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! apidoc-from-source ./service -v
//! ```

use anyhow::Result;
use apidoc_from_source::cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    // Parse once so the verbose flag can configure the logger before validation logs anything
    let parsed = cli::CliArgs::parse();

    let log_level = if parsed.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("apidoc-from-source starting...");

    let args = cli::parse_args_from_parsed(parsed)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
