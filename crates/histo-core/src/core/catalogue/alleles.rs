use super::CatalogueLoadError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

pub(crate) const BUILTIN_ALLELES: &str = include_str!("../../../data/catalogues/alleles.csv");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlleleRecord {
    pub locus: String,
    pub allele_group: String,
    pub allele: String,
    pub id: String,
    pub sequence: String,
}

/// Reference allele sequences in file order.
///
/// The first allele listed for a group is that group's representative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlleleCatalogue {
    alleles: Vec<AlleleRecord>,
}

impl AlleleCatalogue {
    pub fn new(alleles: Vec<AlleleRecord>) -> Self {
        Self { alleles }
    }

    pub fn load(path: &Path) -> Result<Self, CatalogueLoadError> {
        let origin = path.to_string_lossy().to_string();
        let reader = csv::Reader::from_path(path).map_err(|e| CatalogueLoadError::Csv {
            path: origin.clone(),
            source: e,
        })?;
        Self::from_reader(reader, &origin)
    }

    pub fn builtin() -> Result<Self, CatalogueLoadError> {
        Self::from_csv_str(BUILTIN_ALLELES, "<builtin alleles.csv>")
    }

    pub fn from_csv_str(content: &str, origin: &str) -> Result<Self, CatalogueLoadError> {
        Self::from_reader(csv::Reader::from_reader(content.as_bytes()), origin)
    }

    fn from_reader<R: std::io::Read>(
        mut reader: csv::Reader<R>,
        origin: &str,
    ) -> Result<Self, CatalogueLoadError> {
        let mut alleles = Vec::new();
        for result in reader.deserialize::<AlleleRecord>() {
            let mut record = result.map_err(|e| CatalogueLoadError::Csv {
                path: origin.to_string(),
                source: e,
            })?;
            record.sequence = record.sequence.trim().to_ascii_uppercase();
            // Matching slices sequences by byte offset.
            if !record.sequence.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CatalogueLoadError::Invalid {
                    path: origin.to_string(),
                    message: format!(
                        "allele '{}' has a sequence with non-letter characters",
                        record.id
                    ),
                });
            }
            alleles.push(record);
        }
        Ok(Self { alleles })
    }

    pub fn alleles(&self) -> &[AlleleRecord] {
        &self.alleles
    }

    pub fn group_representatives(&self) -> Vec<&AlleleRecord> {
        let mut seen = HashSet::new();
        self.alleles
            .iter()
            .filter(|a| seen.insert(a.allele_group.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }
}
