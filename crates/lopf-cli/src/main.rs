use clap::Parser;
use lopf_cli::cli::{Cli, Commands};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: could not install log subscriber: {err}");
    }

    let result = match &cli.command {
        Commands::Run(args) => commands::run::handle(args),
        Commands::Config { config } => commands::config::handle(config.as_deref()),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}
