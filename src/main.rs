//! CSVQL - a minimal SQL-like engine over CSV files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use csvql::executor::Executor;
use csvql::server::Server;
use std::path::PathBuf;

/// CSVQL - a minimal SQL-like engine over CSV files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory under which databases are resolved
    #[arg(short = 'D', long, default_value = ".")]
    data_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the interactive REPL
    Repl,
    /// Run the line-oriented TCP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "7878")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Command::Repl => {
            let mut executor = Executor::new(args.data_dir);
            csvql::repl::run(&mut executor)?;
        }
        Command::Serve { host, port } => {
            let addr = std::net::SocketAddr::from((
                host.parse::<std::net::IpAddr>().context("invalid host address")?,
                port,
            ));
            Server::new(args.data_dir).run(addr).await?;
        }
    }

    Ok(())
}
