use chat_api::{
    cli::{self, Cli},
    config::Environment,
    logging,
};
use clap::Parser;

#[tokio::main]
async fn main() {
    // Load .env if present so local runs pick up POSTGRES_*, JWT_SECRET, etc.
    let dotenv = dotenvy::dotenv();

    logging::init(Environment::from_env());
    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    let cli = Cli::parse();

    if let Err(e) = cli::run(cli).await {
        tracing::error!(error = %format!("{e:#}"), "Fatal error");
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}
