use clap::Parser;
use exam_gateway::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so JWT_SECRET, GATEWAY_CONFIG, etc. work under cargo run
    let _ = dotenvy::dotenv();

    exam_gateway::logging::init("info");

    let cli = Cli::parse();

    if let Err(e) = cli::run(cli).await {
        match std::env::var("GATEWAY_VERBOSE_ERRORS").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
