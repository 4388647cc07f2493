use histo::engine::config::PipelineConfig;
use std::path::PathBuf;

pub struct AppConfig {
    pub store_path: PathBuf,
    pub source_dir: PathBuf,
    /// `None` selects the catalogues compiled into the library.
    pub catalogue_dir: Option<PathBuf>,
    pub pipeline: PipelineConfig,
}
