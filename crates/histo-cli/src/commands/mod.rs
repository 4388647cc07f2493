pub mod canonical;
pub mod data;
pub mod run;
pub mod set;
pub mod show;
pub mod step;

use crate::cli::WorkspaceArgs;
use crate::config::{self, AppConfig};
use crate::data::DataManager;
use crate::error::Result;
use histo::core::catalogue::Catalogues;
use histo::core::source::DirectorySource;
use histo::core::store::FilesystemStore;
use histo::workflows::Pipeline;
use tracing::{debug, info};

/// Everything a command needs to run the pipeline against one store.
pub struct Workspace {
    pub config: AppConfig,
    pub store: FilesystemStore,
    pub source: DirectorySource,
    pub catalogues: Catalogues,
}

impl Workspace {
    pub fn open(args: &WorkspaceArgs) -> Result<Self> {
        info!("Initializing data manager...");
        let data_manager = DataManager::new()?;
        Self::open_with(args, &data_manager)
    }

    pub fn open_with(args: &WorkspaceArgs, data_manager: &DataManager) -> Result<Self> {
        let config = config::build_config(args, data_manager)?;
        debug!(
            store = ?config.store_path,
            source = ?config.source_dir,
            "Resolved workspace locations."
        );

        let catalogues = match &config.catalogue_dir {
            Some(dir) => {
                info!("Loading catalogues from {:?}", dir);
                Catalogues::load_from_dir(dir)?
            }
            None => Catalogues::builtin()?,
        };

        Ok(Self {
            store: FilesystemStore::new(&config.store_path),
            source: DirectorySource::new(&config.source_dir),
            catalogues,
            config,
        })
    }

    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(&self.store, &self.source, &self.catalogues, &self.config.pipeline)
            .with_publications(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use histo::workflows::PipelineStep;
    use once_cell::sync::Lazy;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    static TEST_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().expect("Failed to create temp dir"));

    fn data_manager(name: &str) -> DataManager {
        DataManager::with_custom_path(TEST_DIR.path().join(name))
    }

    #[test]
    fn opens_with_builtin_catalogues_when_none_installed() {
        let manager = data_manager("fresh");
        let workspace = Workspace::open_with(&WorkspaceArgs::default(), &manager).unwrap();

        assert!(workspace.config.catalogue_dir.is_none());
        assert!(!workspace.catalogues.alleles.is_empty());
        assert_eq!(workspace.config.store_path, manager.default_store_path());
    }

    #[test]
    fn picks_up_installed_catalogues() {
        let manager = data_manager("installed");
        manager.install_catalogues(false).unwrap();

        let workspace = Workspace::open_with(&WorkspaceArgs::default(), &manager).unwrap();
        assert_eq!(workspace.config.catalogue_dir, Some(manager.catalogue_dir()));
        assert!(!workspace.catalogues.alleles.is_empty());
    }

    #[test]
    fn missing_catalogue_dir_is_a_config_error() {
        let manager = data_manager("missing");
        let args = WorkspaceArgs {
            catalogue_dir: Some(PathBuf::from("/definitely/not/here")),
            ..Default::default()
        };
        let result = Workspace::open_with(&args, &manager);
        assert!(matches!(result, Err(crate::error::CliError::Config(_))));
    }

    #[test]
    fn pipeline_writes_into_the_configured_store() {
        let manager = data_manager("pipeline");
        let store_dir = TEST_DIR.path().join("pipeline-store");
        let args = WorkspaceArgs {
            store: Some(store_dir.clone()),
            ..Default::default()
        };
        let workspace = Workspace::open_with(&args, &manager).unwrap();

        let outcome = workspace
            .pipeline()
            .run_step("1ABC", PipelineStep::Initialise, false);
        assert!(outcome.success);

        let record = workspace.pipeline().load_record("1abc").unwrap();
        assert!(record.is_some());
        assert!(store_dir.is_dir());
    }
}
