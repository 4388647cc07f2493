use super::facets::*;
use crate::core::store::{JsonStoreExt, KeyProvider, RecordStore, StoreError};
use crate::core::utils::sequence::length_class;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const PEPTIDE_ROLE: &str = "peptide";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeptideDescriptor {
    pub sequence: Option<String>,
    pub length: Option<usize>,
    pub length_class: Option<String>,
    pub n_terminal_extension: Option<bool>,
    pub c_terminal_extension: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexClassification {
    pub label: String,
    pub slug: String,
    pub confidence: f64,
}

/// Read-only view of every facet stored for one structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureRecord {
    pub core: CoreFacet,
    pub source: Option<SourceFacet>,
    pub chains: Option<ChainsFacet>,
    pub alike_chains: Option<AlikeChainsFacet>,
    pub complex_type: Option<ComplexTypeFacet>,
    pub allele_match: Option<AlleleMatchFacet>,
    pub aligned: Option<AlignedFacet>,
    pub peptide_structures: Option<PeptideStructuresFacet>,
    pub peptide_neighbours: Option<PeptideNeighboursFacet>,
    pub peptide_features: Option<PeptideFeaturesFacet>,
    pub cleft_angles: Option<CleftAnglesFacet>,
    pub binding_domain_structures: Option<BindingDomainStructuresFacet>,
    pub c_alpha_distances: Option<CAlphaDistancesFacet>,
    pub peptide_angles: Option<PeptideAnglesFacet>,
    pub pockets: Option<PocketsFacet>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSummary {
    pub pdb_code: String,
    pub organism: Option<Organism>,
    pub resolution: Option<f64>,
    pub assembly_count: Option<usize>,
    pub complex_type: Option<ComplexClassification>,
    pub allele: Option<String>,
    pub peptide: PeptideDescriptor,
    pub facets: Vec<Facet>,
}

impl StructureRecord {
    /// `None` when the structure was never initialised.
    pub fn load(
        store: &dyn RecordStore,
        keys: &KeyProvider,
        pdb_code: &str,
    ) -> Result<Option<Self>, StoreError> {
        fn facet<T: DeserializeOwned>(
            store: &dyn RecordStore,
            keys: &KeyProvider,
            pdb_code: &str,
            facet: Facet,
        ) -> Result<Option<T>, StoreError> {
            store.get_json(&keys.facet_key(pdb_code, facet))
        }

        let Some(core) = facet(store, keys, pdb_code, Facet::Core)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            core,
            source: facet(store, keys, pdb_code, Facet::Source)?,
            chains: facet(store, keys, pdb_code, Facet::Chains)?,
            alike_chains: facet(store, keys, pdb_code, Facet::AlikeChains)?,
            complex_type: facet(store, keys, pdb_code, Facet::ComplexType)?,
            allele_match: facet(store, keys, pdb_code, Facet::AlleleMatch)?,
            aligned: facet(store, keys, pdb_code, Facet::Aligned)?,
            peptide_structures: facet(store, keys, pdb_code, Facet::PeptideStructures)?,
            peptide_neighbours: facet(store, keys, pdb_code, Facet::PeptideNeighbours)?,
            peptide_features: facet(store, keys, pdb_code, Facet::PeptideFeatures)?,
            cleft_angles: facet(store, keys, pdb_code, Facet::CleftAngles)?,
            binding_domain_structures: facet(store, keys, pdb_code, Facet::BindingDomainStructures)?,
            c_alpha_distances: facet(store, keys, pdb_code, Facet::CAlphaDistances)?,
            peptide_angles: facet(store, keys, pdb_code, Facet::PeptideAngles)?,
            pockets: facet(store, keys, pdb_code, Facet::Pockets)?,
        }))
    }

    pub fn pdb_code(&self) -> &str {
        &self.core.pdb_code
    }

    pub fn organism(&self) -> Option<&Organism> {
        self.source.as_ref().and_then(|s| s.info.organism.as_ref())
    }

    pub fn resolution(&self) -> Option<f64> {
        self.source.as_ref().and_then(|s| s.info.resolution)
    }

    pub fn assembly_count(&self) -> Option<usize> {
        self.source.as_ref().map(|s| s.assembly_count)
    }

    pub fn publication(&self) -> Option<&Publication> {
        self.source.as_ref().and_then(|s| s.info.publication.as_ref())
    }

    pub fn classification(&self) -> Option<ComplexClassification> {
        self.complex_type.as_ref().map(|c| ComplexClassification {
            label: c.label.clone(),
            slug: c.slug.clone(),
            confidence: c.confidence,
        })
    }

    /// Sequence from the chain assignment; extension flags from the first
    /// assembly with derived features.
    pub fn peptide(&self) -> PeptideDescriptor {
        let sequence = self
            .chains
            .as_ref()
            .and_then(|c| c.first_with_role(PEPTIDE_ROLE))
            .map(|a| a.sequence.clone());
        let features = self
            .peptide_features
            .as_ref()
            .and_then(|f| f.assemblies.values().next());

        let length = sequence.as_ref().map(String::len);
        PeptideDescriptor {
            length,
            length_class: length.map(length_class),
            sequence,
            n_terminal_extension: features.map(|f| f.n_terminal_extension),
            c_terminal_extension: features.map(|f| f.c_terminal_extension),
        }
    }

    pub fn facets_present(&self) -> Vec<Facet> {
        let present = [
            (Facet::Core, true),
            (Facet::Source, self.source.is_some()),
            (Facet::Chains, self.chains.is_some()),
            (Facet::AlikeChains, self.alike_chains.is_some()),
            (Facet::ComplexType, self.complex_type.is_some()),
            (Facet::AlleleMatch, self.allele_match.is_some()),
            (Facet::Aligned, self.aligned.is_some()),
            (Facet::PeptideStructures, self.peptide_structures.is_some()),
            (Facet::PeptideNeighbours, self.peptide_neighbours.is_some()),
            (Facet::PeptideFeatures, self.peptide_features.is_some()),
            (Facet::CleftAngles, self.cleft_angles.is_some()),
            (Facet::BindingDomainStructures, self.binding_domain_structures.is_some()),
            (Facet::CAlphaDistances, self.c_alpha_distances.is_some()),
            (Facet::PeptideAngles, self.peptide_angles.is_some()),
            (Facet::Pockets, self.pockets.is_some()),
        ];
        present
            .into_iter()
            .filter_map(|(facet, is_present)| is_present.then_some(facet))
            .collect()
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            pdb_code: self.pdb_code().to_string(),
            organism: self.organism().cloned(),
            resolution: self.resolution(),
            assembly_count: self.assembly_count(),
            complex_type: self.classification(),
            allele: self.allele_match.as_ref().map(|a| a.matched.allele.clone()),
            peptide: self.peptide(),
            facets: self.facets_present(),
        }
    }
}
