use crate::core::models::facets::Facet;

pub const DEFAULT_PRIVACY: &str = "public";

/// Builds store keys for one privacy scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyProvider {
    privacy: String,
}

impl Default for KeyProvider {
    fn default() -> Self {
        Self::new(DEFAULT_PRIVACY)
    }
}

impl KeyProvider {
    pub fn new(privacy: &str) -> Self {
        Self {
            privacy: privacy.to_string(),
        }
    }

    pub fn privacy(&self) -> &str {
        &self.privacy
    }

    pub fn facet_key(&self, pdb_code: &str, facet: Facet) -> String {
        format!(
            "structures/{}/{}/{}/{}.json",
            facet.domain(),
            self.privacy,
            pdb_code,
            facet.name()
        )
    }

    /// Key of a coordinate file, e.g. `structures/files/public/aligned/1abc_1.pdb`.
    pub fn file_key(&self, contents: &str, name: &str) -> String {
        format!("structures/files/{}/{}/{}.pdb", self.privacy, contents, name)
    }

    pub fn set_key(&self, context: &str, slug: &str) -> String {
        format!(
            "sets/{}/{}",
            context.to_ascii_lowercase(),
            slug.to_ascii_lowercase()
        )
    }

    pub fn set_prefix(&self, context: Option<&str>) -> String {
        match context {
            Some(context) => format!("sets/{}/", context.to_ascii_lowercase()),
            None => "sets/".to_string(),
        }
    }

    /// Key for values cached on behalf of a structure source.
    pub fn cache_key(&self, pdb_code: &str, name: &str) -> String {
        format!("structures/cache/{}/{}/{}.json", self.privacy, pdb_code, name)
    }

    pub fn canonical_key(&self, class: &str) -> String {
        format!("structures/canonical/{}.pdb", class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_store_layout() {
        let keys = KeyProvider::default();
        assert_eq!(
            keys.facet_key("1abc", Facet::Chains),
            "structures/info/public/1abc/chains.json"
        );
        assert_eq!(
            keys.facet_key("1abc", Facet::PeptideFeatures),
            "structures/features/public/1abc/peptide_features.json"
        );
        assert_eq!(
            keys.file_key("aligned", "1abc_1"),
            "structures/files/public/aligned/1abc_1.pdb"
        );
        assert_eq!(
            keys.set_key("Complex_Type", "Class_I_With_Peptide"),
            "sets/complex_type/class_i_with_peptide"
        );
        assert_eq!(
            keys.canonical_key("class_i"),
            "structures/canonical/class_i.pdb"
        );
    }

    #[test]
    fn privacy_scope_is_part_of_every_structure_key() {
        let keys = KeyProvider::new("private");
        assert!(keys.facet_key("1abc", Facet::Core).contains("/private/"));
        assert!(keys.file_key("raw", "1abc").contains("/private/"));
    }
}
