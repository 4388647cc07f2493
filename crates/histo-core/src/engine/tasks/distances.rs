use super::angles::PEPTIDE_CONTACT_POSITIONS;
use crate::core::models::facets::{CAlphaDistances, CAlphaPair, PeptideResidueDistances};
use crate::core::models::ids::ChainId;
use crate::core::models::system::MolecularSystem;
use crate::engine::error::{ErrorKind, StepError};
use nalgebra::Point3;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

struct CAlpha<'s> {
    number: isize,
    name: &'s str,
    position: Point3<f64>,
}

fn c_alphas<'s>(system: &'s MolecularSystem, chain: ChainId) -> Vec<CAlpha<'s>> {
    system
        .standard_residues(chain)
        .into_iter()
        .filter_map(|id| {
            let residue = system.residue(id)?;
            Some(CAlpha {
                number: residue.id,
                name: residue.name.as_str(),
                position: system.atom_position(id, "CA")?,
            })
        })
        .collect()
}

/// C-alpha distances from every peptide residue to the receptor residues that
/// line the cleft, with the closest pair picked out per peptide position.
#[instrument(skip_all, name = "distances_task", fields(peptide = %peptide_chain, receptor = %receptor_chain))]
pub fn measure_distances(
    system: &MolecularSystem,
    peptide_chain: char,
    receptor_chain: char,
) -> Result<CAlphaDistances, StepError> {
    let peptide = system.find_chain_by_id(peptide_chain).ok_or_else(|| {
        StepError::new(
            ErrorKind::NoPeptideChainIds,
            format!("no peptide chain '{}' in structure", peptide_chain),
        )
    })?;
    let receptor = system.find_chain_by_id(receptor_chain).ok_or_else(|| {
        StepError::new(
            ErrorKind::UnableToLoadStructure,
            format!("no receptor chain '{}' in structure", receptor_chain),
        )
    })?;

    let cleft: Vec<CAlpha> = c_alphas(system, receptor)
        .into_iter()
        .filter(|ca| PEPTIDE_CONTACT_POSITIONS.contains(&ca.number))
        .collect();
    let peptide_cas = c_alphas(system, peptide);
    if cleft.is_empty() || peptide_cas.is_empty() {
        return Err(StepError::new(
            ErrorKind::UnableToBuildCAlphaSet,
            format!(
                "{} cleft and {} peptide C-alpha atom(s) found",
                cleft.len(),
                peptide_cas.len()
            ),
        ));
    }

    let mut measured = BTreeMap::new();
    for (index, from) in peptide_cas.iter().enumerate() {
        let pairs: Vec<CAlphaPair> = cleft
            .iter()
            .map(|to| CAlphaPair {
                receptor_position: to.number,
                receptor_residue: to.name.to_string(),
                distance: (from.position - to.position).norm(),
            })
            .collect();
        let closest = pairs
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .cloned();
        measured.insert(
            index + 1,
            PeptideResidueDistances {
                residue: from.name.to_string(),
                residue_number: from.number,
                pairs,
                closest,
            },
        );
    }
    debug!(positions = measured.len(), cleft = cleft.len(), "Measured C-alpha distances.");

    Ok(CAlphaDistances {
        peptide_chain,
        receptor_chain,
        peptide: measured,
    })
}
