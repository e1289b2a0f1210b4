//! Init command - write a configuration file.

use std::path::PathBuf;

use csl_ondemand::config::{config_file_path, ConfigFile};

use crate::error::CliError;
use crate::runner::GlobalOptions;

/// Run the init command.
pub fn run(options: &GlobalOptions) -> Result<(), CliError> {
    let path: PathBuf = options.config.clone().unwrap_or_else(config_file_path);
    let config = options.load_config().unwrap_or_else(|_| {
        let mut config = ConfigFile::default();
        config.resources.root = options.resources.clone();
        config
    });
    config.save_to(&path)?;

    println!("Configuration file: {}", path.display());
    match &config.resources.root {
        Some(root) => println!("Resources root:     {}", root.display()),
        None => {
            println!();
            println!("No resources root configured yet.");
            println!("Set root in the [resources] section or pass --resources.");
        }
    }
    println!();
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
