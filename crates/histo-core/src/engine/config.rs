use crate::core::store::keys::DEFAULT_PRIVACY;
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Chains shorter than this are peptides regardless of sequence.
    pub peptide_length_cutoff: usize,
    pub contact_cutoff: f64,
    pub alignment_window: RangeInclusive<isize>,
    pub allele_truncation: usize,
    pub signal_peptide_threshold: usize,
    pub min_allele_length: usize,
    pub fuzzy_threshold: f64,
    pub possible_complex_threshold: f64,
    /// Peptide positions with at most this many receptor contacts are exposed.
    pub exposure_limit: usize,
    /// Receptor residues below this number are measured by `measure_angles`.
    pub cleft_residue_limit: isize,
    pub privacy: String,
    pub canonical_class: String,
    pub canonical_chain: char,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            peptide_length_cutoff: 20,
            contact_cutoff: 5.0,
            alignment_window: 3..=180,
            allele_truncation: 275,
            signal_peptide_threshold: 175,
            min_allele_length: 175,
            fuzzy_threshold: 0.97,
            possible_complex_threshold: 0.6,
            exposure_limit: 3,
            cleft_residue_limit: 180,
            privacy: DEFAULT_PRIVACY.to_string(),
            canonical_class: "class_i".to_string(),
            canonical_chain: 'A',
        }
    }
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    peptide_length_cutoff: Option<usize>,
    contact_cutoff: Option<f64>,
    alignment_window: Option<RangeInclusive<isize>>,
    allele_truncation: Option<usize>,
    signal_peptide_threshold: Option<usize>,
    min_allele_length: Option<usize>,
    fuzzy_threshold: Option<f64>,
    possible_complex_threshold: Option<f64>,
    exposure_limit: Option<usize>,
    cleft_residue_limit: Option<isize>,
    privacy: Option<String>,
    canonical_class: Option<String>,
    canonical_chain: Option<char>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peptide_length_cutoff(mut self, cutoff: usize) -> Self {
        self.peptide_length_cutoff = Some(cutoff);
        self
    }
    pub fn contact_cutoff(mut self, cutoff: f64) -> Self {
        self.contact_cutoff = Some(cutoff);
        self
    }
    pub fn alignment_window(mut self, window: RangeInclusive<isize>) -> Self {
        self.alignment_window = Some(window);
        self
    }
    pub fn allele_truncation(mut self, length: usize) -> Self {
        self.allele_truncation = Some(length);
        self
    }
    pub fn signal_peptide_threshold(mut self, length: usize) -> Self {
        self.signal_peptide_threshold = Some(length);
        self
    }
    pub fn min_allele_length(mut self, length: usize) -> Self {
        self.min_allele_length = Some(length);
        self
    }
    pub fn fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = Some(threshold);
        self
    }
    pub fn possible_complex_threshold(mut self, threshold: f64) -> Self {
        self.possible_complex_threshold = Some(threshold);
        self
    }
    pub fn exposure_limit(mut self, limit: usize) -> Self {
        self.exposure_limit = Some(limit);
        self
    }
    pub fn cleft_residue_limit(mut self, limit: isize) -> Self {
        self.cleft_residue_limit = Some(limit);
        self
    }
    pub fn privacy(mut self, privacy: impl Into<String>) -> Self {
        self.privacy = Some(privacy.into());
        self
    }
    pub fn canonical_class(mut self, class: impl Into<String>) -> Self {
        self.canonical_class = Some(class.into());
        self
    }
    pub fn canonical_chain(mut self, chain: char) -> Self {
        self.canonical_chain = Some(chain);
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            peptide_length_cutoff: self
                .peptide_length_cutoff
                .unwrap_or(defaults.peptide_length_cutoff),
            contact_cutoff: self.contact_cutoff.unwrap_or(defaults.contact_cutoff),
            alignment_window: self.alignment_window.unwrap_or(defaults.alignment_window),
            allele_truncation: self.allele_truncation.unwrap_or(defaults.allele_truncation),
            signal_peptide_threshold: self
                .signal_peptide_threshold
                .unwrap_or(defaults.signal_peptide_threshold),
            min_allele_length: self.min_allele_length.unwrap_or(defaults.min_allele_length),
            fuzzy_threshold: self.fuzzy_threshold.unwrap_or(defaults.fuzzy_threshold),
            possible_complex_threshold: self
                .possible_complex_threshold
                .unwrap_or(defaults.possible_complex_threshold),
            exposure_limit: self.exposure_limit.unwrap_or(defaults.exposure_limit),
            cleft_residue_limit: self
                .cleft_residue_limit
                .unwrap_or(defaults.cleft_residue_limit),
            privacy: self.privacy.unwrap_or(defaults.privacy),
            canonical_class: self.canonical_class.unwrap_or(defaults.canonical_class),
            canonical_chain: self.canonical_chain.unwrap_or(defaults.canonical_chain),
        };
        config.validate()?;
        Ok(config)
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &'static str, reason: &str| ConfigError::InvalidParameter {
            name,
            reason: reason.to_string(),
        };
        if !(self.contact_cutoff.is_finite() && self.contact_cutoff > 0.0) {
            return Err(invalid("contact_cutoff", "must be a positive distance"));
        }
        if self.alignment_window.is_empty() {
            return Err(invalid("alignment_window", "start must not exceed end"));
        }
        for (name, value) in [
            ("fuzzy_threshold", self.fuzzy_threshold),
            ("possible_complex_threshold", self.possible_complex_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(name, "must lie within [0, 1]"));
            }
        }
        if self.peptide_length_cutoff == 0 {
            return Err(invalid("peptide_length_cutoff", "must be greater than zero"));
        }
        if self.allele_truncation == 0 {
            return Err(invalid("allele_truncation", "must be greater than zero"));
        }
        if self.privacy.is_empty() || self.privacy.contains('/') {
            return Err(invalid("privacy", "must be a single path segment"));
        }
        if self.canonical_class.is_empty() || self.canonical_class.contains('/') {
            return Err(invalid("canonical_class", "must be a single path segment"));
        }
        Ok(())
    }
}
