use crate::data::DataManager;
use std::path::PathBuf;

/// Locations used when neither the command line nor the config file names one.
pub struct DefaultsConfig {
    pub store: PathBuf,
    pub source_dir: PathBuf,
    /// Only set when catalogues were installed into the data directory.
    pub catalogue_dir: Option<PathBuf>,
}

impl DefaultsConfig {
    pub fn from_data(data_manager: &DataManager) -> Self {
        let catalogue_dir = data_manager.catalogue_dir();
        Self {
            store: data_manager.default_store_path(),
            source_dir: data_manager.default_source_dir(),
            catalogue_dir: catalogue_dir.is_dir().then_some(catalogue_dir),
        }
    }
}
