use super::{CatalogueLoadError, read_to_string};
use serde::Deserialize;
use std::path::Path;

pub(crate) const BUILTIN_COMPLEXES: &str = include_str!("../../../data/catalogues/complexes.toml");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComplexType {
    pub label: String,
    pub slug: String,
    /// Required roles; the first is the principal chain.
    pub components: Vec<String>,
    pub chain_count: usize,
}

#[derive(Debug, Deserialize)]
struct RawComplexCatalogue {
    #[serde(default)]
    complex: Vec<ComplexType>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexCatalogue {
    complexes: Vec<ComplexType>,
}

impl ComplexCatalogue {
    pub fn new(complexes: Vec<ComplexType>) -> Self {
        Self { complexes }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogueLoadError> {
        let content = read_to_string(path)?;
        Self::from_toml_str(&content, &path.to_string_lossy())
    }

    pub fn builtin() -> Result<Self, CatalogueLoadError> {
        Self::from_toml_str(BUILTIN_COMPLEXES, "<builtin complexes.toml>")
    }

    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, CatalogueLoadError> {
        let raw: RawComplexCatalogue =
            toml::from_str(content).map_err(|e| CatalogueLoadError::Toml {
                path: origin.to_string(),
                source: e,
            })?;
        if let Some(bad) = raw
            .complex
            .iter()
            .find(|c| c.components.len() != c.chain_count)
        {
            return Err(CatalogueLoadError::Invalid {
                path: origin.to_string(),
                message: format!(
                    "complex '{}' lists {} components but declares {} chains",
                    bad.slug,
                    bad.components.len(),
                    bad.chain_count
                ),
            });
        }
        Ok(Self {
            complexes: raw.complex,
        })
    }

    pub fn complexes(&self) -> &[ComplexType] {
        &self.complexes
    }

    /// Entries declaring exactly `chain_count` unique chains, with their declaration index.
    pub fn with_chain_count(&self, chain_count: usize) -> impl Iterator<Item = (usize, &ComplexType)> {
        self.complexes
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.chain_count == chain_count)
    }

    pub fn get(&self, slug: &str) -> Option<&ComplexType> {
        self.complexes.iter().find(|c| c.slug == slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_entries_by_chain_count() {
        let catalogue = ComplexCatalogue::builtin().unwrap();
        let three: Vec<_> = catalogue
            .with_chain_count(3)
            .map(|(_, c)| c.slug.as_str())
            .collect();
        assert!(three.contains(&"class_i_with_peptide"));
        assert!(catalogue.with_chain_count(4).next().is_none());
    }

    #[test]
    fn component_count_must_match_chain_count() {
        let text = r#"
            [[complex]]
            label = "Broken"
            slug = "broken"
            components = ["a", "b"]
            chain_count = 3
        "#;
        let result = ComplexCatalogue::from_toml_str(text, "test");
        assert!(matches!(result, Err(CatalogueLoadError::Invalid { .. })));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let result = ComplexCatalogue::from_toml_str("[[complex]\nlabel=", "test");
        assert!(matches!(result, Err(CatalogueLoadError::Toml { .. })));
    }
}
