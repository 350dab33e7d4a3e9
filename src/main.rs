mod cli;
mod db;
mod error;
mod filter;
mod fingerprint;
mod importer;
mod ledger;
mod models;
mod remote;
mod row;
mod settings;
mod transform;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let settings = cli.settings.as_deref();

    let result = match cli.command {
        Commands::Import(args) => cli::import::run(settings, &args),
        Commands::Status { store } => cli::status::run(settings, store),
        Commands::Lookup { fingerprint, store } => cli::status::lookup(settings, &fingerprint, store),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
