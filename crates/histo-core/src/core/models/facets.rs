//! Serializable slices of a structure record.
//!
//! Each pipeline step produces exactly one of these and stores it under its
//! own key; later steps read the facets they depend on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    Core,
    Source,
    Chains,
    AlikeChains,
    ComplexType,
    AlleleMatch,
    Aligned,
    PeptideStructures,
    PeptideNeighbours,
    PeptideFeatures,
    CleftAngles,
    BindingDomainStructures,
    CAlphaDistances,
    PeptideAngles,
    Pockets,
}

impl Facet {
    pub const ALL: [Facet; 15] = [
        Facet::Core,
        Facet::Source,
        Facet::Chains,
        Facet::AlikeChains,
        Facet::ComplexType,
        Facet::AlleleMatch,
        Facet::Aligned,
        Facet::PeptideStructures,
        Facet::PeptideNeighbours,
        Facet::PeptideFeatures,
        Facet::CleftAngles,
        Facet::BindingDomainStructures,
        Facet::CAlphaDistances,
        Facet::PeptideAngles,
        Facet::Pockets,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Facet::Core => "core",
            Facet::Source => "source",
            Facet::Chains => "chains",
            Facet::AlikeChains => "alike_chains",
            Facet::ComplexType => "complex_type",
            Facet::AlleleMatch => "allele_match",
            Facet::Aligned => "aligned",
            Facet::PeptideStructures => "peptide_structures",
            Facet::PeptideNeighbours => "peptide_neighbours",
            Facet::PeptideFeatures => "peptide_features",
            Facet::CleftAngles => "cleft_angles",
            Facet::BindingDomainStructures => "binding_domain_structures",
            Facet::CAlphaDistances => "c_alpha_distances",
            Facet::PeptideAngles => "peptide_angles",
            Facet::Pockets => "pockets",
        }
    }

    /// Key namespace the facet is stored under.
    pub fn domain(&self) -> &'static str {
        match self {
            Facet::PeptideFeatures => "features",
            _ => "info",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    pub scientific_name: Option<String>,
    pub common_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub title: Option<String>,
    pub journal: Option<String>,
    pub year: Option<u16>,
    pub doi: Option<String>,
    pub pubmed_id: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
}

/// Written by `initialise`. Holds nothing but identity and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreFacet {
    pub pdb_code: String,
    pub created: String,
    pub last_updated: String,
}

/// Descriptive metadata returned by a structure source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureInfo {
    pub title: Option<String>,
    pub organism: Option<Organism>,
    pub resolution: Option<f64>,
    pub assembly_count: Option<usize>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub publication: Option<Publication>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFacet {
    pub info: StructureInfo,
    pub assembly_count: usize,
    pub file_key: String,
    pub last_updated: String,
}

/// One group of chains sharing an identical sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainAssignment {
    pub chain_ids: Vec<char>,
    pub sequence: String,
    pub length: usize,
    pub role: String,
    pub confidence: f64,
    /// Number of the first polymer residue of each chain, keyed by chain id.
    pub first_residues: BTreeMap<String, isize>,
}

impl ChainAssignment {
    pub fn first_residue(&self, chain_id: char) -> Option<isize> {
        self.first_residues.get(&chain_id.to_string()).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainsFacet {
    /// Every assigned chain in file order.
    pub declaration_order: Vec<char>,
    pub chains: Vec<ChainAssignment>,
    pub last_updated: String,
}

impl ChainsFacet {
    pub fn assignment_for(&self, chain_id: char) -> Option<&ChainAssignment> {
        self.chains.iter().find(|a| a.chain_ids.contains(&chain_id))
    }

    pub fn first_with_role(&self, role: &str) -> Option<&ChainAssignment> {
        self.chains.iter().find(|a| a.role == role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlikeCluster {
    pub chain_ids: Vec<char>,
    pub representative_sequence: String,
    pub lengths: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlikeChainsFacet {
    pub assembly_count: usize,
    pub clusters: BTreeMap<usize, AlikeCluster>,
    pub last_updated: String,
}

/// Chains making up one assembly, keyed by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyChains {
    pub id: usize,
    pub chains: BTreeMap<String, char>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexTypeFacet {
    pub label: String,
    pub slug: String,
    pub components: Vec<String>,
    pub chain_count: usize,
    pub confidence: f64,
    pub assemblies: Vec<AssemblyChains>,
    pub last_updated: String,
}

impl ComplexTypeFacet {
    /// The first declared component: the chain that alleles are matched on
    /// and that assemblies are superposed by.
    pub fn principal_role(&self) -> Option<&str> {
        self.components.first().map(String::as_str)
    }

    pub fn chain_for(&self, assembly: &AssemblyChains, role: &str) -> Option<char> {
        assembly.chains.get(role).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Fuzzy,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Exact => f.write_str("exact"),
            MatchType::Fuzzy => f.write_str("fuzzy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlleleMatch {
    pub locus: String,
    pub allele_group: String,
    pub allele: String,
    pub id: String,
    pub match_type: MatchType,
    pub confidence: f64,
    pub tier: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlleleMatchFacet {
    pub chain_id: char,
    #[serde(flatten)]
    pub matched: AlleleMatch,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedAssembly {
    pub aligned_on: String,
    pub aligned_chain: char,
    pub rmsd: f64,
    pub start: isize,
    pub end: isize,
    pub atom_count: usize,
    pub file_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedFacet {
    pub assemblies: BTreeMap<usize, AlignedAssembly>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideStructure {
    pub peptide_chain: char,
    pub peptide_and_hetatoms_key: String,
    pub peptide_key: String,
    pub hetero_residues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideStructuresFacet {
    pub assemblies: BTreeMap<usize, PeptideStructure>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResidueContact {
    pub residue: String,
    pub position: isize,
}

/// Residue-level contacts between a peptide and its receptor chain.
///
/// Peptide positions are 1-based ordinals along the peptide; receptor
/// positions are residue numbers as written in the coordinate file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMap {
    pub peptide_chain: char,
    pub receptor_chain: char,
    pub cutoff: f64,
    pub peptide: BTreeMap<usize, Vec<ResidueContact>>,
    pub receptor: BTreeMap<isize, Vec<ResidueContact>>,
}

impl ContactMap {
    /// Receptor residue numbers in contact with a peptide position.
    pub fn receptor_positions(&self, peptide_position: usize) -> Vec<isize> {
        self.peptide
            .get(&peptide_position)
            .map(|contacts| contacts.iter().map(|c| c.position).collect())
            .unwrap_or_default()
    }

    /// True when every contact has its reciprocal entry.
    pub fn is_symmetric(&self) -> bool {
        let forward = self.peptide.iter().all(|(&pep, contacts)| {
            contacts.iter().all(|c| {
                self.receptor
                    .get(&c.position)
                    .is_some_and(|back| back.iter().any(|b| b.position == pep as isize))
            })
        });
        let backward = self.receptor.iter().all(|(&rec, contacts)| {
            contacts.iter().all(|c| {
                usize::try_from(c.position)
                    .ok()
                    .and_then(|pos| self.peptide.get(&pos))
                    .is_some_and(|fwd| fwd.iter().any(|f| f.position == rec))
            })
        });
        forward && backward
    }

    pub fn contact_count(&self) -> usize {
        self.peptide.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideNeighboursFacet {
    pub assemblies: BTreeMap<usize, ContactMap>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideFeatures {
    pub sequence: String,
    pub length: usize,
    pub length_class: String,
    /// Peptide position held by the pocket formed by receptor residues 7 and 171.
    pub pn: Option<usize>,
    /// Peptide position held by the pocket formed by receptor residues 116 and 143.
    pub pc: Option<usize>,
    pub n_terminal_extension: bool,
    pub c_terminal_extension: bool,
    pub extension_positions: Vec<usize>,
    pub exposed: Vec<usize>,
    pub buried: Vec<usize>,
    pub exposed_bulge: bool,
}

impl PeptideFeatures {
    pub fn anchor_positions(&self) -> Vec<usize> {
        self.pn.into_iter().chain(self.pc).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideFeaturesFacet {
    pub assemblies: BTreeMap<usize, PeptideFeatures>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidueAngles {
    pub residue: String,
    pub phi: Option<f64>,
    pub psi: Option<f64>,
    pub omega: Option<f64>,
    pub chi1: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleSet {
    pub chain_id: char,
    pub residues: BTreeMap<isize, ResidueAngles>,
    pub peptide_contacts: BTreeMap<isize, ResidueAngles>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleftAnglesFacet {
    pub assemblies: BTreeMap<usize, AngleSet>,
    pub last_updated: String,
}

/// Coordinate cut-outs of the receptor chain of one aligned assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDomainStructure {
    pub chain_id: char,
    /// The whole chain with its bound hetero groups.
    pub chain_and_hetatoms_key: String,
    pub chain_key: String,
    /// Residues `start..=end` of the chain only.
    pub binding_domain_key: String,
    pub start: isize,
    pub end: isize,
    pub residue_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDomainStructuresFacet {
    pub assemblies: BTreeMap<usize, BindingDomainStructure>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CAlphaPair {
    pub receptor_position: isize,
    pub receptor_residue: String,
    pub distance: f64,
}

/// C-alpha distances from one peptide residue to the cleft residues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideResidueDistances {
    pub residue: String,
    pub residue_number: isize,
    pub pairs: Vec<CAlphaPair>,
    pub closest: Option<CAlphaPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CAlphaDistances {
    pub peptide_chain: char,
    pub receptor_chain: char,
    /// Keyed by 1-based peptide position.
    pub peptide: BTreeMap<usize, PeptideResidueDistances>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CAlphaDistancesFacet {
    pub assemblies: BTreeMap<usize, CAlphaDistances>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideAngleSet {
    pub chain_id: char,
    /// Keyed by 1-based peptide position.
    pub residues: BTreeMap<usize, ResidueAngles>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideAnglesFacet {
    pub assemblies: BTreeMap<usize, PeptideAngleSet>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketResidue {
    pub position: isize,
    pub one_letter: char,
    pub three_letter: String,
}

/// Residues of the heavy chain lining each of the six cleft pockets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PocketsFacet {
    pub organism: String,
    pub chain_id: char,
    pub role: String,
    /// Keyed by pocket letter, `a` to `f`.
    pub pockets: BTreeMap<String, Vec<PocketResidue>>,
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(residue: &str, position: isize) -> ResidueContact {
        ResidueContact {
            residue: residue.to_string(),
            position,
        }
    }

    #[test]
    fn facet_names_are_snake_case_and_unique() {
        let names: std::collections::HashSet<_> = Facet::ALL.iter().map(Facet::name).collect();
        assert_eq!(names.len(), Facet::ALL.len());
        assert_eq!(Facet::PeptideNeighbours.to_string(), "peptide_neighbours");
        assert_eq!(
            serde_json::to_string(&Facet::AlikeChains).unwrap(),
            "\"alike_chains\""
        );
    }

    #[test]
    fn contact_map_symmetry_detects_missing_reciprocal() {
        let mut map = ContactMap {
            peptide_chain: 'C',
            receptor_chain: 'A',
            cutoff: 5.0,
            peptide: BTreeMap::from([(1, vec![contact("TYR", 7)])]),
            receptor: BTreeMap::from([(7, vec![contact("GLY", 1)])]),
        };
        assert!(map.is_symmetric());
        assert_eq!(map.receptor_positions(1), vec![7]);

        map.receptor.clear();
        assert!(!map.is_symmetric());
    }

    #[test]
    fn contact_map_integer_keys_survive_json() {
        let map = ContactMap {
            peptide_chain: 'C',
            receptor_chain: 'A',
            cutoff: 5.0,
            peptide: BTreeMap::from([(1, vec![contact("TYR", 7)]), (2, vec![])]),
            receptor: BTreeMap::from([(7, vec![contact("GLY", 1)])]),
        };
        let json = serde_json::to_string(&map).unwrap();
        let back: ContactMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn allele_match_facet_flattens_match_fields() {
        let facet = AlleleMatchFacet {
            chain_id: 'A',
            matched: AlleleMatch {
                locus: "A".to_string(),
                allele_group: "hla_a_02".to_string(),
                allele: "HLA-A*02:01".to_string(),
                id: "hla_a_02_01".to_string(),
                match_type: MatchType::Exact,
                confidence: 1.0,
                tier: 1,
            },
            last_updated: "2024-01-01T00:00:00+00:00".to_string(),
        };
        let value = serde_json::to_value(&facet).unwrap();
        assert_eq!(value["match_type"], "exact");
        assert_eq!(value["allele"], "HLA-A*02:01");
        assert_eq!(value["chain_id"], "A");
    }
}
