//! Read-only reference catalogues shared by every pipeline step.
//!
//! Each catalogue can be loaded from a file or from the copy compiled into
//! the library. Declaration order is preserved; several algorithms break ties
//! by it.

pub mod alleles;
pub mod chains;
pub mod complexes;

use std::path::Path;
use thiserror::Error;

pub use alleles::{AlleleCatalogue, AlleleRecord};
pub use chains::{ChainCatalogue, ChainRole};
pub use complexes::{ComplexCatalogue, ComplexType};

pub const CHAINS_FILE: &str = "chains.toml";
pub const COMPLEXES_FILE: &str = "complexes.toml";
pub const ALLELES_FILE: &str = "alleles.csv";

/// File name and contents of every catalogue compiled into the library.
pub fn builtin_files() -> [(&'static str, &'static str); 3] {
    [
        (CHAINS_FILE, chains::BUILTIN_CHAINS),
        (COMPLEXES_FILE, complexes::BUILTIN_COMPLEXES),
        (ALLELES_FILE, alleles::BUILTIN_ALLELES),
    ]
}

#[derive(Debug, Error)]
pub enum CatalogueLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Invalid catalogue '{path}': {message}")]
    Invalid { path: String, message: String },
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, CatalogueLoadError> {
    std::fs::read_to_string(path).map_err(|e| CatalogueLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

#[derive(Debug, Clone, Default)]
pub struct Catalogues {
    pub chains: ChainCatalogue,
    pub complexes: ComplexCatalogue,
    pub alleles: AlleleCatalogue,
}

impl Catalogues {
    pub fn builtin() -> Result<Self, CatalogueLoadError> {
        Ok(Self {
            chains: ChainCatalogue::builtin()?,
            complexes: ComplexCatalogue::builtin()?,
            alleles: AlleleCatalogue::builtin()?,
        })
    }

    /// Loads each catalogue file present in `dir`, using the builtin copy for
    /// any that are absent.
    pub fn load_from_dir(dir: &Path) -> Result<Self, CatalogueLoadError> {
        let chains_path = dir.join(CHAINS_FILE);
        let complexes_path = dir.join(COMPLEXES_FILE);
        let alleles_path = dir.join(ALLELES_FILE);

        Ok(Self {
            chains: if chains_path.is_file() {
                ChainCatalogue::load(&chains_path)?
            } else {
                ChainCatalogue::builtin()?
            },
            complexes: if complexes_path.is_file() {
                ComplexCatalogue::load(&complexes_path)?
            } else {
                ComplexCatalogue::builtin()?
            },
            alleles: if alleles_path.is_file() {
                AlleleCatalogue::load(&alleles_path)?
            } else {
                AlleleCatalogue::builtin()?
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_from_dir_prefers_files_over_builtin_copies() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(ALLELES_FILE),
            "locus,allele_group,allele,id,sequence\nX,x_01,X*01:01,x_01_01,ACDE\n",
        )
        .unwrap();

        let catalogues = Catalogues::load_from_dir(dir.path()).unwrap();
        assert_eq!(catalogues.alleles.alleles().len(), 1);
        assert_eq!(catalogues.alleles.alleles()[0].id, "x_01_01");
        assert_eq!(catalogues.chains, ChainCatalogue::builtin().unwrap());
    }

    #[test]
    fn builtin_files_load_back_from_a_directory() {
        let dir = tempdir().unwrap();
        for (name, contents) in builtin_files() {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        let loaded = Catalogues::load_from_dir(dir.path()).unwrap();
        let builtin = Catalogues::builtin().unwrap();
        assert_eq!(loaded.chains, builtin.chains);
        assert_eq!(loaded.alleles.alleles().len(), builtin.alleles.alleles().len());
    }

    #[test]
    fn broken_file_in_dir_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CHAINS_FILE), "[[role]]\nrole = 1\n").unwrap();
        assert!(matches!(
            Catalogues::load_from_dir(dir.path()),
            Err(CatalogueLoadError::Toml { .. })
        ));
    }
}
