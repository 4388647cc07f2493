use histo::core::catalogue::CatalogueLoadError;
use histo::core::store::StoreError;
use histo::workflows::BatchError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Catalogue error: {0}")]
    Catalogue(#[from] CatalogueLoadError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data management error: {0}")]
    Data(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("{failed} of {total} item(s) failed step '{step}'")]
    StepFailed {
        step: String,
        failed: usize,
        total: usize,
    },

    #[error("Structure '{0}' has no record; run the 'initialise' step first")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
