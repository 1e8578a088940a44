pub mod commands;
pub mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "exam-gateway")]
#[command(about = "Exam Gateway - authentication and routing front door for the exam platform")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Route file to load (overrides GATEWAY_CONFIG)")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the gateway HTTP server (default)")]
    Serve {
        #[arg(long, help = "Bind host (overrides GATEWAY_HOST)")]
        host: Option<String>,
        #[arg(long, help = "Bind port (overrides GATEWAY_PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Load and validate the route file without serving")]
    Check,

    #[command(about = "Print the resolved route table")]
    Routes,

    #[command(about = "Show which route a request would select")]
    Match {
        #[arg(help = "HTTP method, e.g. GET")]
        method: String,
        #[arg(help = "Request path, e.g. /api/exams/5")]
        path: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let mut app = AppConfig::from_env();
    if let Some(path) = cli.config {
        app.gateway_file = path;
    }

    let command = cli.command.unwrap_or(Commands::Serve { host: None, port: None });

    match command {
        Commands::Serve { host, port } => commands::serve::handle(app, host, port).await,
        Commands::Check => commands::check::handle(&app, output_format),
        Commands::Routes => commands::routes::handle(&app, output_format),
        Commands::Match { method, path } => commands::match_route::handle(&app, &method, &path, output_format),
    }
}
