use crate::config::OpenApiConfig;
use crate::demo::pet_store_routes;
use crate::endpoint::OpenApi;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use axum::Router;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// OpenAPI from routes - generate and serve OpenAPI documents from a declared route table
#[derive(Parser, Debug)]
#[command(name = "openapi-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Override the API title
    #[arg(long = "title", global = true)]
    pub title: Option<String>,

    /// Override the path the document is served at
    #[arg(long = "api-url", value_name = "PATH", global = true)]
    pub api_url: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the document once and print it or write it to a file
    Dump {
        /// Output format (yaml or json)
        #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
        output_format: OutputFormat,

        /// Output file path (if not specified, outputs to stdout)
        #[arg(short = 'o', long = "output", value_name = "FILE")]
        output_path: Option<PathBuf>,
    },
    /// Serve the document over HTTP
    Serve {
        /// Address to listen on
        #[arg(long = "addr", default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if let Some(ref config) = args.config {
        if !config.is_file() {
            anyhow::bail!("Configuration file does not exist: {}", config.display());
        }
        info!("Configuration file: {}", config.display());
    }

    Ok(args)
}

/// Load the configuration file, if any, and apply command-line overrides
pub fn load_config(args: &CliArgs) -> Result<OpenApiConfig> {
    let mut config = match &args.config {
        Some(path) => OpenApiConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration: {}", path.display()))?,
        None => OpenApiConfig::new("Pet Store", "1.0").with_description("Demo pet store API"),
    };

    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.clone();
    }

    Ok(config)
}

/// Run the selected subcommand against the demo route table
pub fn run(args: CliArgs) -> Result<()> {
    let config = load_config(&args)?;

    let routes = Arc::new(pet_store_routes().context("Failed to register demo routes")?);
    info!("Registered {} routes", routes.len());

    let openapi = OpenApi::register(config, routes).context("Failed to register OpenAPI route")?;

    match args.command {
        Command::Dump {
            output_format,
            output_path,
        } => dump(&openapi, output_format, output_path),
        Command::Serve { addr } => serve(Arc::new(openapi), addr),
    }
}

fn dump(openapi: &OpenApi, format: OutputFormat, output_path: Option<PathBuf>) -> Result<()> {
    info!("Building OpenAPI document...");
    let document = openapi
        .document()
        .context("Failed to build OpenAPI document")?;

    info!("Serializing to {:?} format...", format);
    let content = match format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    if let Some(output_path) = &output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}

fn serve(openapi: Arc<OpenApi>, addr: SocketAddr) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let api_url = openapi.api_url().to_string();
        let app: Router = openapi.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("Listening on http://{}{}", addr, api_url);

        axum::serve(listener, app).await.context("Server error")?;
        Ok::<(), anyhow::Error>(())
    })
}
