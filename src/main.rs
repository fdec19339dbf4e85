//! OpenAPI from routes - command-line front end.
//!
//! Builds the OpenAPI document for the bundled pet store route table, and either prints
//! it or serves it over HTTP.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-routes [OPTIONS] <COMMAND>
//! ```
//!
//! # Examples
//!
//! Print the document as YAML:
//! ```bash
//! openapi-from-routes dump
//! ```
//!
//! Write JSON to a file, with a custom title:
//! ```bash
//! openapi-from-routes dump -f json -o openapi.json --title "My Pets"
//! ```
//!
//! Serve it at `/openapi` with verbose logging:
//! ```bash
//! openapi-from-routes serve --addr 127.0.0.1:8000 -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_routes::cli;

fn main() -> Result<()> {
    // Parse first so the logger level can follow the verbose flag
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI from routes starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    Ok(())
}
