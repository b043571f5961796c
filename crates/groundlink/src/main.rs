mod cli;
mod commands;
mod error;
mod output;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, OutputFormat};
use crate::error::CliError;
use crate::output::Printer;

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries replay output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(&args),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "groundlink", &mut std::io::stdout());
            Ok(())
        }

        Command::Replay(args) => {
            let config = groundlink_config::load_config()?;
            let format = cli.global.output.unwrap_or_else(|| {
                OutputFormat::from_str(&config.defaults.output, true)
                    .unwrap_or(OutputFormat::Plain)
            });
            tracing::debug!(script = %args.script.display(), ?format, "starting replay");
            commands::replay::handle(&args, &config, Printer::new(format))
        }
    }
}
