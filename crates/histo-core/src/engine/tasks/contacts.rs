use crate::core::models::facets::{ContactMap, ResidueContact};
use crate::core::models::ids::ResidueId;
use crate::core::models::system::MolecularSystem;
use crate::core::utils::identifiers::is_heavy_atom;
use crate::engine::error::{ErrorKind, StepError};
use kiddo::{KdTree, SquaredEuclidean};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

fn heavy_atoms(system: &MolecularSystem, residue_id: ResidueId) -> Vec<[f64; 3]> {
    system
        .residue(residue_id)
        .map(|residue| {
            residue
                .atoms()
                .iter()
                .filter_map(|&id| system.atom(id))
                .filter(|atom| is_heavy_atom(&atom.name))
                .map(|atom| [atom.position.x, atom.position.y, atom.position.z])
                .collect()
        })
        .unwrap_or_default()
}

/// Residue pairs between a peptide and a receptor chain with any heavy atoms
/// closer than `cutoff` angstroms.
///
/// Every peptide position appears in the map, with an empty list when it
/// touches nothing.
#[instrument(skip_all, name = "contacts_task", fields(peptide = %peptide_chain, receptor = %receptor_chain))]
pub fn find_contacts(
    system: &MolecularSystem,
    peptide_chain: char,
    receptor_chain: char,
    cutoff: f64,
) -> Result<ContactMap, StepError> {
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

    // 1. Index receptor heavy atoms, remembering the residue of each.
    let mut positions: Vec<[f64; 3]> = Vec::new();
    let mut owners: Vec<(isize, &str)> = Vec::new();
    for residue_id in system.standard_residues(receptor) {
        let Some(residue) = system.residue(residue_id) else {
            continue;
        };
        for position in heavy_atoms(system, residue_id) {
            positions.push(position);
            owners.push((residue.id, residue.name.as_str()));
        }
    }
    let tree: KdTree<f64, 3> = (&positions).into();
    let radius_sq = cutoff * cutoff;

    // 2. Query every peptide heavy atom against the index.
    let mut peptide_map: BTreeMap<usize, BTreeSet<ResidueContact>> = BTreeMap::new();
    let mut receptor_map: BTreeMap<isize, BTreeSet<ResidueContact>> = BTreeMap::new();
    for (index, residue_id) in system.standard_residues(peptide).into_iter().enumerate() {
        let ordinal = index + 1;
        let Some(residue) = system.residue(residue_id) else {
            continue;
        };
        let contacts = peptide_map.entry(ordinal).or_default();
        if positions.is_empty() {
            continue;
        }
        for query in heavy_atoms(system, residue_id) {
            for neighbour in tree.within_unsorted::<SquaredEuclidean>(&query, radius_sq) {
                let (number, name) = owners[neighbour.item as usize];
                contacts.insert(ResidueContact {
                    residue: name.to_string(),
                    position: number,
                });
                receptor_map.entry(number).or_default().insert(ResidueContact {
                    residue: residue.name.clone(),
                    position: ordinal as isize,
                });
            }
        }
    }

    let map = ContactMap {
        peptide_chain,
        receptor_chain,
        cutoff,
        peptide: peptide_map
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect(),
        receptor: receptor_map
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect(),
    };
    debug!(
        peptide = %peptide_chain,
        receptor = %receptor_chain,
        contacts = map.contact_count(),
        "Computed peptide contacts"
    );
    Ok(map)
}
