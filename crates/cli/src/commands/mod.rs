//! CLI subcommands.

pub mod checkout;
pub mod currency;
pub mod leads;
pub mod location;
pub mod subscription;

use concierge_companion::api::ApiError;
use concierge_companion::config::{CompanionConfig, ConfigError};
use concierge_companion::error::AppError;
use concierge_companion::state::{Companion, StateError};
use concierge_companion::storage::StorageError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    State(#[from] StateError),

    #[error("{}", .0.user_message())]
    App(#[from] AppError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the runtime from the loaded configuration.
pub fn load(config: Result<CompanionConfig, ConfigError>) -> Result<Companion, CommandError> {
    Ok(Companion::new(config?)?)
}

/// Report an application error before handing it to the caller.
pub fn reported(err: AppError) -> CommandError {
    err.report();
    CommandError::App(err)
}
