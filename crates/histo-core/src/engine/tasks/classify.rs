use crate::core::catalogue::chains::{ChainCatalogue, ChainRole};
use crate::core::models::facets::{ChainAssignment, ChainsFacet};
use crate::core::models::record::PEPTIDE_ROLE;
use crate::core::models::system::MolecularSystem;
use crate::core::utils::sequence::levenshtein_ratio;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub const UNASSIGNED_ROLE: &str = "unassigned";

/// What is known about a chain besides its length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainEvidence<'a> {
    pub sequence: Option<&'a str>,
    /// Lower-case words from the chain's molecule name or gene names.
    pub search_terms: Vec<String>,
}

impl<'a> ChainEvidence<'a> {
    pub fn from_sequence(sequence: &'a str) -> Self {
        Self {
            sequence: Some(sequence),
            search_terms: Vec::new(),
        }
    }

    pub fn from_description(description: &str) -> Self {
        Self {
            sequence: None,
            search_terms: search_terms(description),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.search_terms.extend(search_terms(description));
        self
    }
}

/// Splits a molecule description into lower-case words.
pub fn search_terms(description: &str) -> Vec<String> {
    description
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub role: String,
    pub confidence: f64,
}

impl Classification {
    pub fn unassigned() -> Self {
        Self {
            role: UNASSIGNED_ROLE.to_string(),
            confidence: 0.0,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.role != UNASSIGNED_ROLE
    }
}

/// Assigns a biological role to a chain from its length and sequence or name.
pub struct ChainClassifier<'a> {
    catalogue: &'a ChainCatalogue,
    peptide_length_cutoff: usize,
}

impl<'a> ChainClassifier<'a> {
    pub fn new(catalogue: &'a ChainCatalogue, peptide_length_cutoff: usize) -> Self {
        Self {
            catalogue,
            peptide_length_cutoff,
        }
    }

    pub fn classify(&self, chain_length: usize, evidence: &ChainEvidence<'_>) -> Classification {
        if chain_length < self.peptide_length_cutoff {
            return Classification {
                role: PEPTIDE_ROLE.to_string(),
                confidence: 1.0,
            };
        }

        let mut best: Option<(&ChainRole, f64)> = None;
        for role in self.catalogue.roles() {
            if !role.accepts_length(chain_length) {
                continue;
            }
            let score = Self::score(role, evidence);
            if score < role.threshold {
                continue;
            }
            // Strictly greater, so the earlier-declared role keeps a tie.
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((role, score));
            }
        }

        match best {
            Some((role, score)) => Classification {
                role: role.role.clone(),
                confidence: score,
            },
            None => Classification::unassigned(),
        }
    }

    fn score(role: &ChainRole, evidence: &ChainEvidence<'_>) -> f64 {
        let sequence_score = match evidence.sequence {
            Some(sequence) if !role.examples.is_empty() => role
                .examples
                .iter()
                .map(|example| levenshtein_ratio(sequence, example))
                .fold(0.0, f64::max),
            _ => 0.0,
        };

        let keyword_score = if role.features.is_empty() || evidence.search_terms.is_empty() {
            0.0
        } else {
            let terms: HashSet<&str> = evidence.search_terms.iter().map(String::as_str).collect();
            let matched = role
                .features
                .iter()
                .filter(|f| terms.contains(f.as_str()))
                .count();
            matched as f64 / role.features.len() as f64
        };

        sequence_score.max(keyword_score)
    }
}

/// Groups chains with identical sequences, classifying each distinct
/// sequence once.
pub struct AssignmentBuilder<'c, 'a> {
    classifier: &'c ChainClassifier<'a>,
    groups: Vec<ChainAssignment>,
    declaration_order: Vec<char>,
}

impl<'c, 'a> AssignmentBuilder<'c, 'a> {
    pub fn new(classifier: &'c ChainClassifier<'a>) -> Self {
        Self {
            classifier,
            groups: Vec::new(),
            declaration_order: Vec::new(),
        }
    }

    pub fn add_chain(
        &mut self,
        chain_id: char,
        sequence: &str,
        first_residue: isize,
        description: Option<&str>,
    ) -> &mut Self {
        self.declaration_order.push(chain_id);
        let chain_key = chain_id.to_string();

        if let Some(group) = self.groups.iter_mut().find(|g| g.sequence == sequence) {
            group.chain_ids.push(chain_id);
            group.first_residues.insert(chain_key, first_residue);
            return self;
        }

        let mut evidence = ChainEvidence::from_sequence(sequence);
        if let Some(description) = description {
            evidence = evidence.with_description(description);
        }
        let classification = self.classifier.classify(sequence.len(), &evidence);
        debug!(
            chain = %chain_id,
            length = sequence.len(),
            role = %classification.role,
            confidence = classification.confidence,
            "Classified chain"
        );

        self.groups.push(ChainAssignment {
            chain_ids: vec![chain_id],
            sequence: sequence.to_string(),
            length: sequence.len(),
            role: classification.role,
            confidence: classification.confidence,
            first_residues: BTreeMap::from([(chain_key, first_residue)]),
        });
        self
    }

    pub fn unassigned(&self) -> impl Iterator<Item = &ChainAssignment> {
        self.groups.iter().filter(|g| g.role == UNASSIGNED_ROLE)
    }

    pub fn build(self, last_updated: String) -> ChainsFacet {
        ChainsFacet {
            declaration_order: self.declaration_order,
            chains: self.groups,
            last_updated,
        }
    }
}

/// Adds every polymer chain of `system` to `builder` in file order.
///
/// Chains without standard residues (ligands, water) are skipped.
pub fn add_polymer_chains(
    builder: &mut AssignmentBuilder<'_, '_>,
    system: &MolecularSystem,
    descriptions: &BTreeMap<char, String>,
) {
    for (chain_id, chain) in system.chains_iter() {
        let sequence = system.chain_sequence(chain_id);
        if sequence.is_empty() {
            continue;
        }
        let first_residue = system.first_residue_number(chain_id).unwrap_or(1);
        builder.add_chain(
            chain.id,
            &sequence,
            first_residue,
            descriptions.get(&chain.id).map(String::as_str),
        );
    }
}
