//! Where raw structures and their descriptive metadata come from.

use crate::core::io::pdb::{PdbError, PdbFile, PdbMetadata};
use crate::core::io::traits::MolecularFile;
use crate::core::models::facets::{Organism, Publication, StructureInfo};
use crate::core::store::{JsonStoreExt, KeyProvider, RecordStore, StoreError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Structure '{0}' is not available from this source")]
    NotFound(String),
    #[error("File I/O error for '{path}': {source}")]
    Io { path: String, source: io::Error },
    #[error("JSON parsing error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Structure '{pdb_code}' could not be parsed: {source}")]
    Pdb {
        pdb_code: String,
        source: PdbError,
    },
    #[error("Cache error: {0}")]
    Store(#[from] StoreError),
}

pub trait StructureSource: Send + Sync {
    /// Raw PDB text of the structure.
    fn fetch(&self, pdb_code: &str) -> Result<String, SourceError>;

    fn get_info(&self, pdb_code: &str) -> Result<StructureInfo, SourceError>;
}

/// Optional enrichment with publication details.
pub trait PublicationSource: Send + Sync {
    fn publication(&self, pdb_code: &str) -> Result<Option<Publication>, SourceError>;
}

/// Descriptive metadata recovered from a PDB header alone.
pub fn info_from_header(metadata: &PdbMetadata) -> StructureInfo {
    StructureInfo {
        title: metadata.title.clone(),
        organism: metadata
            .organism_scientific
            .as_ref()
            .map(|name| Organism {
                scientific_name: Some(name.clone()),
                common_name: None,
            }),
        resolution: metadata.resolution,
        assembly_count: Some(metadata.assembly_count),
        ..Default::default()
    }
}

/// Reads `<code>.pdb` files from a directory.
///
/// Metadata comes from `<code>.json` when present and from the PDB header
/// otherwise. Publications are read from `publications/<code>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn existing(&self, pdb_code: &str, extension: &str) -> Option<PathBuf> {
        [pdb_code.to_ascii_lowercase(), pdb_code.to_ascii_uppercase()]
            .iter()
            .map(|name| self.root.join(format!("{}.{}", name, extension)))
            .find(|p| p.is_file())
    }

    fn read(path: &Path) -> Result<String, SourceError> {
        fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
        let content = Self::read(path)?;
        serde_json::from_str(&content).map_err(|e| SourceError::Json {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }
}

impl StructureSource for DirectorySource {
    fn fetch(&self, pdb_code: &str) -> Result<String, SourceError> {
        let path = self
            .existing(pdb_code, "pdb")
            .ok_or_else(|| SourceError::NotFound(pdb_code.to_string()))?;
        debug!(pdb_code, path = %path.display(), "Reading structure from directory");
        Self::read(&path)
    }

    fn get_info(&self, pdb_code: &str) -> Result<StructureInfo, SourceError> {
        if let Some(path) = self.existing(pdb_code, "json") {
            return Self::read_json(&path);
        }
        let text = self.fetch(pdb_code)?;
        let (_, metadata) = PdbFile::read_from_str(&text).map_err(|e| SourceError::Pdb {
            pdb_code: pdb_code.to_string(),
            source: e,
        })?;
        Ok(info_from_header(&metadata))
    }
}

impl PublicationSource for DirectorySource {
    fn publication(&self, pdb_code: &str) -> Result<Option<Publication>, SourceError> {
        let path = self
            .root
            .join("publications")
            .join(format!("{}.json", pdb_code.to_ascii_lowercase()));
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_json(&path).map(Some)
    }
}

/// Serves structures from the record store, filling it from `inner` on a miss.
pub struct CachedSource<'a> {
    store: &'a dyn RecordStore,
    keys: KeyProvider,
    inner: &'a dyn StructureSource,
}

impl<'a> CachedSource<'a> {
    pub fn new(store: &'a dyn RecordStore, keys: KeyProvider, inner: &'a dyn StructureSource) -> Self {
        Self { store, keys, inner }
    }
}

impl StructureSource for CachedSource<'_> {
    fn fetch(&self, pdb_code: &str) -> Result<String, SourceError> {
        let key = self.keys.file_key("raw", pdb_code);
        if let Some(text) = self.store.get_text(&key)? {
            debug!(pdb_code, key, "Structure served from cache");
            return Ok(text);
        }
        let text = self.inner.fetch(pdb_code)?;
        self.store.put(&key, text.as_bytes())?;
        Ok(text)
    }

    fn get_info(&self, pdb_code: &str) -> Result<StructureInfo, SourceError> {
        let key = self.keys.cache_key(pdb_code, "info");
        if let Some(info) = self.store.get_json(&key)? {
            return Ok(info);
        }
        let info = self.inner.get_info(pdb_code)?;
        self.store.put_json(&key, &info)?;
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    const PDB: &str = "\
HEADER    IMMUNE SYSTEM                           01-JAN-00   1ABC
SOURCE   2 ORGANISM_SCIENTIFIC: HOMO SAPIENS;
REMARK   2 RESOLUTION.    2.10 ANGSTROMS.
ATOM      1  CA  GLY A   1       0.000   0.000   0.000  1.00 20.00           C
END
";

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl StructureSource for CountingSource {
        fn fetch(&self, _pdb_code: &str) -> Result<String, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(PDB.to_string())
        }

        fn get_info(&self, _pdb_code: &str) -> Result<StructureInfo, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(StructureInfo::default())
        }
    }

    #[test]
    fn directory_source_falls_back_to_header_metadata() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("1abc.pdb"), PDB).unwrap();
        let source = DirectorySource::new(dir.path());

        assert_eq!(source.fetch("1ABC").unwrap(), PDB);
        let info = source.get_info("1abc").unwrap();
        assert_eq!(info.resolution, Some(2.10));
        assert_eq!(info.assembly_count, Some(1));
        assert_eq!(
            info.organism.unwrap().scientific_name.as_deref(),
            Some("HOMO SAPIENS")
        );
        assert!(source.publication("1abc").unwrap().is_none());
    }

    #[test]
    fn directory_source_prefers_json_metadata() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("1abc.pdb"), PDB).unwrap();
        fs::write(
            dir.path().join("1abc.json"),
            r#"{"title": "From json", "resolution": 1.5, "assembly_count": 2}"#,
        )
        .unwrap();
        let info = DirectorySource::new(dir.path()).get_info("1abc").unwrap();
        assert_eq!(info.title.as_deref(), Some("From json"));
        assert_eq!(info.assembly_count, Some(2));
    }

    #[test]
    fn missing_structure_is_not_found() {
        let dir = tempdir().unwrap();
        let result = DirectorySource::new(dir.path()).fetch("9zzz");
        assert!(matches!(result, Err(SourceError::NotFound(code)) if code == "9zzz"));
    }

    #[test]
    fn cached_source_only_asks_inner_source_once() {
        let store = MemoryStore::new();
        let inner = CountingSource {
            calls: AtomicUsize::new(0),
        };
        let cached = CachedSource::new(&store, KeyProvider::default(), &inner);

        cached.fetch("1abc").unwrap();
        cached.fetch("1abc").unwrap();
        cached.get_info("1abc").unwrap();
        cached.get_info("1abc").unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(store.exists("structures/files/public/raw/1abc.pdb").unwrap());
    }
}
