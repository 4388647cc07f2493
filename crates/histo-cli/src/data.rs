use crate::error::{CliError, Result};
use directories::ProjectDirs;
use histo::core::catalogue;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CATALOGUE_DIR: &str = "catalogues";
const STORE_DIR: &str = "store";
const STRUCTURES_DIR: &str = "structures";

/// Outcome of writing one built-in catalogue into the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    Written(PathBuf),
    Kept(PathBuf),
}

#[derive(Debug)]
pub struct DataManager {
    base_path: PathBuf,
}

impl DataManager {
    pub fn new() -> Result<Self> {
        let path = Self::determine_data_path()?;
        debug!("DataManager initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    pub fn with_custom_path(path: PathBuf) -> Self {
        Self { base_path: path }
    }

    pub fn get_data_path(&self) -> &Path {
        &self.base_path
    }

    pub fn catalogue_dir(&self) -> PathBuf {
        self.base_path.join(CATALOGUE_DIR)
    }

    pub fn default_store_path(&self) -> PathBuf {
        self.base_path.join(STORE_DIR)
    }

    pub fn default_source_dir(&self) -> PathBuf {
        self.base_path.join(STRUCTURES_DIR)
    }

    /// Writes the built-in catalogues to `<data>/catalogues/`. Existing files
    /// are kept unless `force` is set.
    pub fn install_catalogues(&self, force: bool) -> Result<Vec<InstallStatus>> {
        let dir = self.catalogue_dir();
        fs::create_dir_all(&dir)?;
        info!("Installing built-in catalogues to {:?}", &dir);

        catalogue::builtin_files()
            .into_iter()
            .map(|(name, contents)| -> Result<InstallStatus> {
                let path = dir.join(name);
                if path.exists() && !force {
                    debug!("Keeping existing catalogue {:?}", &path);
                    return Ok(InstallStatus::Kept(path));
                }
                fs::write(&path, contents)?;
                Ok(InstallStatus::Written(path))
            })
            .collect()
    }

    pub fn set_custom_path(path: &Path) -> Result<()> {
        let path_str = path.to_str().ok_or_else(|| {
            CliError::Argument(format!("Data path {:?} is not valid UTF-8", path))
        })?;
        let config_path = Self::get_path_config_file()?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, path_str).map_err(CliError::from)
    }

    pub fn reset_path() -> Result<()> {
        if let Ok(config_path) = Self::get_path_config_file() {
            if config_path.exists() {
                fs::remove_file(config_path)?;
            }
        }
        Ok(())
    }

    fn determine_data_path() -> Result<PathBuf> {
        match Self::get_path_config_file() {
            Ok(config_path) if config_path.exists() => {
                let custom_path_str = fs::read_to_string(&config_path)?.trim().to_string();
                if custom_path_str.is_empty() {
                    warn!("Custom path config file is empty, falling back to default path.");
                    Self::get_default_data_path()
                } else {
                    Ok(PathBuf::from(custom_path_str))
                }
            }
            _ => Self::get_default_data_path(),
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "histo", "histo")
    }

    fn get_path_config_file() -> Result<PathBuf> {
        Self::project_dirs()
            .map(|dirs| dirs.config_dir().join("path.conf"))
            .ok_or_else(|| CliError::Data("Could not determine config directory path.".to_string()))
    }

    fn get_default_data_path() -> Result<PathBuf> {
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                CliError::Data("Could not determine default data directory path.".to_string())
            })
    }
}
