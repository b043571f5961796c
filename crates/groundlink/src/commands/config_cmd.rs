//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand};
use crate::error::CliError;

pub fn handle(args: &ConfigArgs) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            println!("{}", groundlink_config::config_path().display());
        }
        ConfigCommand::Show => {
            let cfg = groundlink_config::load_config()?;
            print!("{}", toml::to_string_pretty(&cfg)?);
            println!("# settings file: {}", cfg.settings_path().display());
        }
    }
    Ok(())
}
