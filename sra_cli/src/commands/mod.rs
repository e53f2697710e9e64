pub mod read;
pub mod recommend;
pub mod search;
pub mod tools;

use indicatif::{ProgressBar, ProgressStyle};
use sra_core::connectors::sra::SraConnector;
use sra_core::Config;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Core(#[from] sra_core::ConnectorError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;

pub fn create_connector() -> Result<SraConnector> {
    let config = Config::from_env()?;
    Ok(SraConnector::new(&config)?)
}

/// Spinner on stderr; cleared once the command has its data.
pub fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}
