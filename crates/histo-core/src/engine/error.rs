use crate::core::io::pdb::PdbError;
use crate::core::source::SourceError;
use crate::core::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable, machine-readable failure categories reported by pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnmatchedChain,
    NoAlikeChains,
    UnableToLoadStructure,
    UnassignedChains,
    StructureNotSplit,
    NoSplitComplexes,
    FirstMatchFailure,
    SecondMatchFailure,
    ThirdMatchFailure,
    NoMatchPossible,
    MissingAlignedStructure,
    NoNeighbourInfo,
    NoPeptideChainIds,
    NoMatchingComplexTypes,
    UnableToMatchComplexTypeExactly,
    NotInitialised,
    MissingFacet,
    AtomCountMismatch,
    MissingCanonicalStructure,
    AmbiguousComplexTypeCatalogue,
    NoPeptideStructures,
    UnableToBuildCAlphaSet,
    NoOrganismFound,
    IndirectMapping,
    NoSequence,
    StoreFailure,
    SourceFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnmatchedChain => "unmatched_chain",
            ErrorKind::NoAlikeChains => "no_alike_chains",
            ErrorKind::UnableToLoadStructure => "unable_to_load_structure",
            ErrorKind::UnassignedChains => "unassigned_chains",
            ErrorKind::StructureNotSplit => "structure_not_split",
            ErrorKind::NoSplitComplexes => "no_split_complexes",
            ErrorKind::FirstMatchFailure => "first_match_failure",
            ErrorKind::SecondMatchFailure => "second_match_failure",
            ErrorKind::ThirdMatchFailure => "third_match_failure",
            ErrorKind::NoMatchPossible => "no_match_possible",
            ErrorKind::MissingAlignedStructure => "missing_aligned_structure",
            ErrorKind::NoNeighbourInfo => "no_neighbour_info",
            ErrorKind::NoPeptideChainIds => "no_peptide_chain_ids",
            ErrorKind::NoMatchingComplexTypes => "no_matching_complex_types",
            ErrorKind::UnableToMatchComplexTypeExactly => "unable_to_match_complex_type_exactly",
            ErrorKind::NotInitialised => "not_initialised",
            ErrorKind::MissingFacet => "missing_facet",
            ErrorKind::AtomCountMismatch => "atom_count_mismatch",
            ErrorKind::MissingCanonicalStructure => "missing_canonical_structure",
            ErrorKind::AmbiguousComplexTypeCatalogue => "ambiguous_complex_type_catalogue",
            ErrorKind::NoPeptideStructures => "no_peptide_structures",
            ErrorKind::UnableToBuildCAlphaSet => "unable_to_build_c_alpha_set",
            ErrorKind::NoOrganismFound => "no_organism_found",
            ErrorKind::IndirectMapping => "indirect_mapping",
            ErrorKind::NoSequence => "no_sequence",
            ErrorKind::StoreFailure => "store_failure",
            ErrorKind::SourceFailure => "source_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed step: its category plus a human-readable explanation.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind}: {message}")]
pub struct StepError {
    pub kind: ErrorKind,
    pub message: String,
    /// Structured context, e.g. the candidate list of an inexact complex match.
    pub detail: Option<serde_json::Value>,
}

impl StepError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl From<StoreError> for StepError {
    fn from(e: StoreError) -> Self {
        StepError::new(ErrorKind::StoreFailure, e.to_string())
    }
}

impl From<SourceError> for StepError {
    fn from(e: SourceError) -> Self {
        StepError::new(ErrorKind::SourceFailure, e.to_string())
    }
}

impl From<PdbError> for StepError {
    fn from(e: PdbError) -> Self {
        StepError::new(ErrorKind::UnableToLoadStructure, e.to_string())
    }
}
