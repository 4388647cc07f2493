use super::{CatalogueLoadError, read_to_string};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

pub(crate) const BUILTIN_CHAINS: &str = include_str!("../../../data/catalogues/chains.toml");

/// A biological role a polypeptide chain can play in a complex.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChainRole {
    pub role: String,
    pub label: String,
    pub expected_length: usize,
    /// Offsets from `expected_length`; both bounds are exclusive.
    pub length_window: [isize; 2],
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    pub threshold: f64,
}

impl ChainRole {
    pub fn accepts_length(&self, length: usize) -> bool {
        let expected = self.expected_length as isize;
        let length = length as isize;
        length > expected + self.length_window[0] && length < expected + self.length_window[1]
    }
}

#[derive(Debug, Deserialize)]
struct RawChainCatalogue {
    #[serde(default)]
    role: Vec<ChainRole>,
}

/// Ordered chain-role catalogue. Declaration order breaks scoring ties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainCatalogue {
    roles: Vec<ChainRole>,
}

impl ChainCatalogue {
    pub fn new(roles: Vec<ChainRole>) -> Self {
        Self { roles }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogueLoadError> {
        let content = read_to_string(path)?;
        Self::from_toml_str(&content, &path.to_string_lossy())
    }

    pub fn builtin() -> Result<Self, CatalogueLoadError> {
        Self::from_toml_str(BUILTIN_CHAINS, "<builtin chains.toml>")
    }

    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, CatalogueLoadError> {
        let raw: RawChainCatalogue =
            toml::from_str(content).map_err(|e| CatalogueLoadError::Toml {
                path: origin.to_string(),
                source: e,
            })?;

        let mut seen = HashSet::new();
        for role in &raw.role {
            if !seen.insert(role.role.as_str()) {
                return Err(CatalogueLoadError::Invalid {
                    path: origin.to_string(),
                    message: format!("role '{}' is declared more than once", role.role),
                });
            }
            if role.length_window[0] >= role.length_window[1] {
                return Err(CatalogueLoadError::Invalid {
                    path: origin.to_string(),
                    message: format!("role '{}' has an empty length window", role.role),
                });
            }
        }
        Ok(Self { roles: raw.role })
    }

    pub fn roles(&self) -> &[ChainRole] {
        &self.roles
    }

    pub fn get(&self, role: &str) -> Option<&ChainRole> {
        self.roles.iter().find(|r| r.role == role)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
