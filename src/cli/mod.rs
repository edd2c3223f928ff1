pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chat-api")]
#[command(about = "Chat API - REST backend for users, rooms and messages")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Apply pending migrations before serving")]
        migrate: bool,
    },

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Print a random value suitable for JWT_SECRET")]
    Secret {
        #[arg(
            long,
            default_value_t = 32,
            value_parser = clap::value_parser!(u16).range(16..=1024),
            help = "Bytes of entropy"
        )]
        bytes: u16,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { migrate: false }) {
        Commands::Serve { migrate } => commands::serve::handle(migrate).await,
        Commands::Migrate => commands::migrate::handle().await,
        Commands::Secret { bytes } => commands::secret::handle(bytes),
    }
}
