use sigval_core::{PlotError, SignalError, ValidationError};
use sigval_warehouse::WarehouseError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error("invalid input document: {0}")]
    Input(String),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Plot(#[from] PlotError),

    #[error("warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("strict mode failed: warnings={warning_count}, errors={error_count}")]
    StrictModeViolation {
        warning_count: usize,
        error_count: usize,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Command(_) | Self::Input(_) => 2,
            Self::Signal(_) | Self::Plot(_) => 3,
            Self::Warehouse(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Serialization(_) | Self::Io(_) => 10,
        }
    }
}
