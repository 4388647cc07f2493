use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePipelineConfig {
    pub peptide_length_cutoff: Option<usize>,
    pub contact_cutoff: Option<f64>,
    /// Inclusive `[start, end]` residue numbers.
    pub alignment_window: Option<[isize; 2]>,
    pub allele_truncation: Option<usize>,
    pub signal_peptide_threshold: Option<usize>,
    pub min_allele_length: Option<usize>,
    pub fuzzy_threshold: Option<f64>,
    pub possible_complex_threshold: Option<f64>,
    pub exposure_limit: Option<usize>,
    pub cleft_residue_limit: Option<isize>,
    pub privacy: Option<String>,
    pub canonical_class: Option<String>,
    pub canonical_chain: Option<char>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub store: Option<PathBuf>,
    pub source_dir: Option<PathBuf>,
    pub catalogue_dir: Option<PathBuf>,
    pub pipeline: Option<FilePipelineConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn kebab_case_file_is_parsed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("histo.toml");
        fs::write(
            &path,
            r#"
            store = "/srv/histo/store"
            source-dir = "/srv/histo/pdb"

            [pipeline]
            contact-cutoff = 4.5
            alignment-window = [1, 182]
            canonical-chain = "A"
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.store, Some(PathBuf::from("/srv/histo/store")));
        assert_eq!(config.catalogue_dir, None);
        let pipeline = config.pipeline.unwrap();
        assert_eq!(pipeline.contact_cutoff, Some(4.5));
        assert_eq!(pipeline.alignment_window, Some([1, 182]));
        assert_eq!(pipeline.canonical_chain, Some('A'));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("histo.toml");
        fs::write(&path, "[pipeline]\ncontact-radius = 4.0\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }
}
