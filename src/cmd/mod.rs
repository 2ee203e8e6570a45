use crate::{conf::Settings, pkg::server::listen, prelude::Result};
use clap::{Parser, Subcommand};

mod migrate;

#[derive(Parser)]
#[command(about = "jobs board api over postgres")]
struct Cmd {
    #[command(subcommand)]
    command: Option<SubCommandType>,
}

#[derive(Subcommand)]
enum SubCommandType {
    /// Serve the jobs api
    Listen {
        /// Overrides LISTEN_PORT
        #[arg(long)]
        port: Option<String>,
    },
    /// Apply pending migrations from ./migrations
    Migrate,
}

pub async fn run() -> Result<()> {
    let cmd = Cmd::parse();
    // the lazy `settings` global panics on a bad environment, report it here first
    Settings::new()?;
    match cmd.command {
        Some(SubCommandType::Listen { port }) => listen(port).await?,
        Some(SubCommandType::Migrate) => migrate::apply().await?,
        None => tracing::error!("no subcommand passed, expected `listen` or `migrate`"),
    }
    Ok(())
}
