use clap::{Parser, Subcommand};
use hope_foundation::config::Config;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the web server (default).
    Serve,
    /// Create the bootstrap admin or reset its payment methods.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load()?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => hope_foundation::start_server(config).await,
        Command::Seed => hope_foundation::run_seed(config).await,
    }
}
