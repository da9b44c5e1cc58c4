use clap::Parser;
use tracing_subscriber::EnvFilter;

use panel_augment::cli::commands::{cmd_classify, cmd_replay, cmd_run};
use panel_augment::cli::config::{Cli, Commands, load_config, resolve_config};

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // CLI > config > env > defaults
    let config = resolve_config(
        &cli,
        load_config(cli.config.as_deref()),
        std::env::var("PANEL_API_TOKEN").ok(),
    );

    match cli.command {
        Commands::Run { url, bridge } => {
            cmd_run(&config, &url, bridge.as_deref())?;
        }
        Commands::Replay {
            fixture,
            path,
            output,
        } => {
            cmd_replay(&config, &fixture, &path, output.as_deref())?;
        }
        Commands::Classify { path, heading } => {
            println!("{}", cmd_classify(&path, &heading));
        }
    }

    Ok(())
}
