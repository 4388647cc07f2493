use crate::core::catalogue::complexes::{ComplexCatalogue, ComplexType};
use crate::core::models::facets::{AlikeChainsFacet, AssemblyChains, ChainsFacet};
use crate::engine::error::{ErrorKind, StepError};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// A catalogue entry that shares enough roles with the structure to be
/// worth reporting, without matching exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PossibleMatch {
    pub slug: String,
    pub label: String,
    pub matching_chains: Vec<String>,
    pub confidence: f64,
    pub matching_chain_count: usize,
    pub unique_chain_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComplexMatch<'a> {
    Exact(&'a ComplexType),
    /// Ranked by confidence, then catalogue order. Never committed.
    Possible(Vec<PossibleMatch>),
}

pub struct ComplexTypeMatcher<'a> {
    catalogue: &'a ComplexCatalogue,
    possible_threshold: f64,
}

impl<'a> ComplexTypeMatcher<'a> {
    pub fn new(catalogue: &'a ComplexCatalogue, possible_threshold: f64) -> Self {
        Self {
            catalogue,
            possible_threshold,
        }
    }

    pub fn match_roles(
        &self,
        found_roles: &[String],
        unique_chain_count: usize,
    ) -> Result<ComplexMatch<'a>, StepError> {
        let mut exact = Vec::new();
        let mut possible = Vec::new();

        for (_, complex) in self.catalogue.with_chain_count(unique_chain_count) {
            let mut matches: Vec<String> = Vec::new();
            for role in found_roles {
                if complex.components.contains(role) && !matches.contains(role) {
                    matches.push(role.clone());
                }
            }
            if matches.len() == unique_chain_count {
                exact.push(complex);
            }
            let confidence = matches.len() as f64 / complex.components.len() as f64;
            if confidence > self.possible_threshold {
                possible.push(PossibleMatch {
                    slug: complex.slug.clone(),
                    label: complex.label.clone(),
                    matching_chain_count: matches.len(),
                    matching_chains: matches,
                    confidence,
                    unique_chain_count,
                });
            }
        }

        match exact.len() {
            1 => Ok(ComplexMatch::Exact(exact[0])),
            0 if possible.is_empty() => Err(StepError::new(
                ErrorKind::NoMatchingComplexTypes,
                format!(
                    "no complex type with {} chains shares enough roles with {:?}",
                    unique_chain_count, found_roles
                ),
            )),
            0 => {
                // Stable sort keeps catalogue order among equal confidences.
                possible.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
                Ok(ComplexMatch::Possible(possible))
            }
            _ => Err(StepError::new(
                ErrorKind::AmbiguousComplexTypeCatalogue,
                format!(
                    "roles {:?} match {} catalogue entries exactly: {}",
                    found_roles,
                    exact.len(),
                    exact.iter().map(|c| c.slug.as_str()).collect::<Vec<_>>().join(", ")
                ),
            )),
        }
    }
}

/// Role of each alike-chain cluster, in cluster order.
pub fn cluster_roles(
    chains: &ChainsFacet,
    alike: &AlikeChainsFacet,
) -> Result<Vec<String>, StepError> {
    alike
        .clusters
        .values()
        .map(|cluster| {
            cluster
                .chain_ids
                .first()
                .and_then(|&id| chains.assignment_for(id))
                .map(|a| a.role.clone())
                .ok_or_else(|| {
                    StepError::new(
                        ErrorKind::UnassignedChains,
                        format!("cluster {:?} has no chain assignment", cluster.chain_ids),
                    )
                })
        })
        .collect()
}

/// Splits the structure into assemblies: assembly `n` takes the `n`th
/// member of every cluster.
pub fn split_assemblies(
    chains: &ChainsFacet,
    alike: &AlikeChainsFacet,
    complex: &ComplexType,
) -> Result<Vec<AssemblyChains>, StepError> {
    let roles = cluster_roles(chains, alike)?;
    let mut assemblies: Vec<AssemblyChains> = (1..=alike.assembly_count.max(1))
        .map(|id| AssemblyChains {
            id,
            chains: BTreeMap::new(),
        })
        .collect();

    for (cluster, role) in alike.clusters.values().zip(&roles) {
        if !complex.components.contains(role) {
            continue;
        }
        for (assembly, &chain_id) in assemblies.iter_mut().zip(&cluster.chain_ids) {
            assembly.chains.entry(role.clone()).or_insert(chain_id);
        }
    }

    for assembly in &assemblies {
        if let Some(missing) = complex
            .components
            .iter()
            .find(|role| !assembly.chains.contains_key(*role))
        {
            return Err(StepError::new(
                ErrorKind::StructureNotSplit,
                format!("assembly {} has no '{}' chain", assembly.id, missing),
            ));
        }
        debug!(assembly = assembly.id, chains = ?assembly.chains, "Split assembly");
    }
    Ok(assemblies)
}
