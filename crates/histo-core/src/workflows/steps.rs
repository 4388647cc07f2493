use crate::core::models::facets::Facet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown pipeline step '{0}'")]
pub struct ParseStepError(pub String);

/// The pipeline steps, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    Initialise,
    Fetch,
    AssignChains,
    ClusterAlikeChains,
    AssignComplexType,
    MatchAllele,
    Align,
    ExtractPeptide,
    FindContacts,
    DeriveFeatures,
    MeasureAngles,
    ExtractBindingDomain,
    MeasureDistances,
    MeasurePeptideAngles,
    MapPockets,
}

impl PipelineStep {
    pub const ALL: [PipelineStep; 15] = [
        PipelineStep::Initialise,
        PipelineStep::Fetch,
        PipelineStep::AssignChains,
        PipelineStep::ClusterAlikeChains,
        PipelineStep::AssignComplexType,
        PipelineStep::MatchAllele,
        PipelineStep::Align,
        PipelineStep::ExtractPeptide,
        PipelineStep::FindContacts,
        PipelineStep::DeriveFeatures,
        PipelineStep::MeasureAngles,
        PipelineStep::ExtractBindingDomain,
        PipelineStep::MeasureDistances,
        PipelineStep::MeasurePeptideAngles,
        PipelineStep::MapPockets,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            PipelineStep::Initialise => "initialise",
            PipelineStep::Fetch => "fetch",
            PipelineStep::AssignChains => "assign_chains",
            PipelineStep::ClusterAlikeChains => "cluster_alike_chains",
            PipelineStep::AssignComplexType => "assign_complex_type",
            PipelineStep::MatchAllele => "match_allele",
            PipelineStep::Align => "align",
            PipelineStep::ExtractPeptide => "extract_peptide",
            PipelineStep::FindContacts => "find_contacts",
            PipelineStep::DeriveFeatures => "derive_features",
            PipelineStep::MeasureAngles => "measure_angles",
            PipelineStep::ExtractBindingDomain => "extract_binding_domain",
            PipelineStep::MeasureDistances => "measure_distances",
            PipelineStep::MeasurePeptideAngles => "measure_peptide_angles",
            PipelineStep::MapPockets => "map_pockets",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineStep::Initialise => "Initialise record",
            PipelineStep::Fetch => "Fetch structure",
            PipelineStep::AssignChains => "Assign chain roles",
            PipelineStep::ClusterAlikeChains => "Cluster alike chains",
            PipelineStep::AssignComplexType => "Assign complex type",
            PipelineStep::MatchAllele => "Match allele",
            PipelineStep::Align => "Align to canonical frame",
            PipelineStep::ExtractPeptide => "Extract peptide",
            PipelineStep::FindContacts => "Find peptide contacts",
            PipelineStep::DeriveFeatures => "Derive peptide features",
            PipelineStep::MeasureAngles => "Measure cleft angles",
            PipelineStep::ExtractBindingDomain => "Extract binding domain",
            PipelineStep::MeasureDistances => "Measure C-alpha distances",
            PipelineStep::MeasurePeptideAngles => "Measure peptide angles",
            PipelineStep::MapPockets => "Map cleft pockets",
        }
    }

    /// The step that runs after this one, `None` for the last.
    pub fn next(&self) -> Option<PipelineStep> {
        let index = Self::ALL.iter().position(|s| s == self)?;
        Self::ALL.get(index + 1).copied()
    }

    /// The facet written on success.
    pub fn facet(&self) -> Facet {
        match self {
            PipelineStep::Initialise => Facet::Core,
            PipelineStep::Fetch => Facet::Source,
            PipelineStep::AssignChains => Facet::Chains,
            PipelineStep::ClusterAlikeChains => Facet::AlikeChains,
            PipelineStep::AssignComplexType => Facet::ComplexType,
            PipelineStep::MatchAllele => Facet::AlleleMatch,
            PipelineStep::Align => Facet::Aligned,
            PipelineStep::ExtractPeptide => Facet::PeptideStructures,
            PipelineStep::FindContacts => Facet::PeptideNeighbours,
            PipelineStep::DeriveFeatures => Facet::PeptideFeatures,
            PipelineStep::MeasureAngles => Facet::CleftAngles,
            PipelineStep::ExtractBindingDomain => Facet::BindingDomainStructures,
            PipelineStep::MeasureDistances => Facet::CAlphaDistances,
            PipelineStep::MeasurePeptideAngles => Facet::PeptideAngles,
            PipelineStep::MapPockets => Facet::Pockets,
        }
    }

    /// Steps that rewrite shared item sets as well as their own facet.
    pub fn updates_item_sets(&self) -> bool {
        matches!(self, PipelineStep::AssignComplexType | PipelineStep::DeriveFeatures)
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for PipelineStep {
    type Err = ParseStepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .find(|step| step.slug() == normalised)
            .copied()
            .ok_or_else(|| ParseStepError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_chain_in_declaration_order() {
        let mut step = PipelineStep::Initialise;
        let mut visited = vec![step];
        while let Some(next) = step.next() {
            visited.push(next);
            step = next;
        }
        assert_eq!(visited, PipelineStep::ALL.to_vec());
        assert_eq!(PipelineStep::MeasureAngles.next(), Some(PipelineStep::ExtractBindingDomain));
        assert_eq!(PipelineStep::MapPockets.next(), None);
    }

    #[test]
    fn every_step_writes_a_distinct_facet() {
        let facets: std::collections::HashSet<_> =
            PipelineStep::ALL.iter().map(PipelineStep::facet).collect();
        assert_eq!(facets.len(), Facet::ALL.len());
    }

    #[test]
    fn slugs_parse_with_either_separator() {
        assert_eq!("match_allele".parse(), Ok(PipelineStep::MatchAllele));
        assert_eq!("Cluster-Alike-Chains".parse(), Ok(PipelineStep::ClusterAlikeChains));
        assert!("superpose".parse::<PipelineStep>().is_err());
        assert_eq!(PipelineStep::FindContacts.to_string(), "find_contacts");
        assert_eq!("measure-peptide-angles".parse(), Ok(PipelineStep::MeasurePeptideAngles));
    }

    #[test]
    fn only_set_writing_steps_need_the_set_lock() {
        let writers: Vec<_> = PipelineStep::ALL
            .into_iter()
            .filter(PipelineStep::updates_item_sets)
            .collect();
        assert_eq!(
            writers,
            vec![PipelineStep::AssignComplexType, PipelineStep::DeriveFeatures]
        );
    }
}
