use crate::core::models::facets::{AngleSet, PeptideAngleSet, ResidueAngles};
use crate::core::models::ids::ResidueId;
use crate::core::models::system::MolecularSystem;
use crate::core::utils::geometry::dihedral;
use crate::core::utils::identifiers::chi1_gamma_atom;
use crate::engine::error::{ErrorKind, StepError};
use std::collections::BTreeMap;
use tracing::instrument;

/// Class I heavy-chain residues that line the peptide-binding cleft.
pub const PEPTIDE_CONTACT_POSITIONS: [isize; 55] = [
    5, 7, 9, 24, 25, 33, 34, 45, 59, 62, 63, 64, 65, 66, 67, 68, 69, 70, 72, 73, 74, 75, 76, 77,
    78, 80, 81, 84, 95, 97, 99, 114, 116, 123, 124, 133, 139, 140, 142, 143, 144, 146, 147, 152,
    155, 156, 157, 158, 159, 160, 163, 164, 167, 168, 171,
];

fn torsion(
    system: &MolecularSystem,
    atoms: [(ResidueId, &str); 4],
) -> Option<f64> {
    let [a, b, c, d] = atoms.map(|(residue, name)| system.atom_position(residue, name));
    Some(dihedral(&a?, &b?, &c?, &d?))
}

/// Backbone and chi1 torsions of one residue. Angles whose atoms are missing
/// are left out.
fn residue_angles(
    system: &MolecularSystem,
    previous: Option<ResidueId>,
    current: ResidueId,
    next: Option<ResidueId>,
    name: &str,
) -> ResidueAngles {
    let phi = previous.and_then(|prev| {
        torsion(system, [(prev, "C"), (current, "N"), (current, "CA"), (current, "C")])
    });
    let psi = next.and_then(|next| {
        torsion(system, [(current, "N"), (current, "CA"), (current, "C"), (next, "N")])
    });
    let omega = next.and_then(|next| {
        torsion(system, [(current, "CA"), (current, "C"), (next, "N"), (next, "CA")])
    });
    let chi1 = chi1_gamma_atom(name).and_then(|gamma| {
        torsion(system, [(current, "N"), (current, "CA"), (current, "CB"), (current, gamma)])
    });
    ResidueAngles {
        residue: name.to_string(),
        phi,
        psi,
        omega,
        chi1,
    }
}

/// Torsion angles of the receptor residues numbered below `residue_limit`.
#[instrument(skip_all, name = "cleft_angles_task", fields(chain = %chain_id))]
pub fn measure_angles(
    system: &MolecularSystem,
    chain_id: char,
    residue_limit: isize,
) -> Result<AngleSet, StepError> {
    let chain = system.find_chain_by_id(chain_id).ok_or_else(|| {
        StepError::new(
            ErrorKind::UnableToLoadStructure,
            format!("no chain '{}' to measure", chain_id),
        )
    })?;
    let residues = system.standard_residues(chain);

    let mut measured = BTreeMap::new();
    for (index, &residue_id) in residues.iter().enumerate() {
        let Some(residue) = system.residue(residue_id) else {
            continue;
        };
        if residue.id >= residue_limit || residue.insertion_code.is_some() {
            continue;
        }
        let previous = index.checked_sub(1).map(|i| residues[i]);
        let next = residues.get(index + 1).copied();
        measured.insert(
            residue.id,
            residue_angles(system, previous, residue_id, next, &residue.name),
        );
    }

    let peptide_contacts = PEPTIDE_CONTACT_POSITIONS
        .iter()
        .filter_map(|p| measured.get(p).map(|angles| (*p, angles.clone())))
        .collect();

    Ok(AngleSet {
        chain_id,
        residues: measured,
        peptide_contacts,
    })
}

/// Torsion angles of every peptide residue, keyed by 1-based position.
#[instrument(skip_all, name = "peptide_angles_task", fields(chain = %chain_id))]
pub fn measure_peptide_angles(system: &MolecularSystem, chain_id: char) -> Result<PeptideAngleSet, StepError> {
    let residues = system
        .find_chain_by_id(chain_id)
        .map(|chain| system.standard_residues(chain))
        .unwrap_or_default();
    if residues.is_empty() {
        return Err(StepError::new(
            ErrorKind::NoPeptideChainIds,
            format!("chain '{}' has no peptide residues to measure", chain_id),
        ));
    }

    let mut measured = BTreeMap::new();
    for (index, &residue_id) in residues.iter().enumerate() {
        let Some(residue) = system.residue(residue_id) else {
            continue;
        };
        let previous = index.checked_sub(1).map(|i| residues[i]);
        let next = residues.get(index + 1).copied();
        measured.insert(
            index + 1,
            residue_angles(system, previous, residue_id, next, &residue.name),
        );
    }
    Ok(PeptideAngleSet {
        chain_id,
        residues: measured,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use nalgebra::Point3;

    fn add(system: &mut MolecularSystem, number: isize, name: &str, atoms: &[(&str, [f64; 3])]) {
        let chain = system.add_chain('A', ChainType::Protein);
        let residue = system.add_residue(chain, number, None, name, false).unwrap();
        for (atom, [x, y, z]) in atoms {
            system.add_atom_to_residue(residue, Atom::new(atom, residue, Point3::new(*x, *y, *z)));
        }
    }

    fn dipeptide() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        add(
            &mut system,
            5,
            "SER",
            &[
                ("N", [0.0, 1.0, 0.0]),
                ("CA", [0.0, 0.0, 0.0]),
                ("C", [1.0, 0.0, 0.0]),
                ("CB", [0.0, 0.0, 1.0]),
                ("OG", [1.0, 0.0, 1.0]),
            ],
        );
        add(
            &mut system,
            6,
            "GLY",
            &[("N", [1.0, 0.0, 1.0]), ("CA", [2.0, 0.0, 1.0]), ("C", [2.0, 1.0, 1.0])],
        );
        add(&mut system, 200, "ALA", &[("CA", [9.0, 9.0, 9.0])]);
        system
    }

    #[test]
    fn angles_are_measured_below_the_residue_limit() {
        let set = measure_angles(&dipeptide(), 'A', 180).unwrap();
        assert_eq!(set.residues.keys().copied().collect::<Vec<_>>(), vec![5, 6]);

        let serine = &set.residues[&5];
        assert!(serine.phi.is_none());
        assert!(serine.psi.is_some());
        assert!((serine.chi1.unwrap() + 90.0).abs() < 1e-9 || (serine.chi1.unwrap() - 90.0).abs() < 1e-9);

        let glycine = &set.residues[&6];
        assert!(glycine.phi.is_some());
        assert!(glycine.chi1.is_none());
        assert!(glycine.psi.is_none());
    }

    #[test]
    fn cleft_subset_only_keeps_contact_positions() {
        let set = measure_angles(&dipeptide(), 'A', 180).unwrap();
        assert_eq!(set.peptide_contacts.keys().copied().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn unknown_chain_is_an_error() {
        assert!(measure_angles(&dipeptide(), 'B', 180).is_err());
    }

    #[test]
    fn peptide_angles_are_keyed_by_position_without_a_limit() {
        let set = measure_peptide_angles(&dipeptide(), 'A').unwrap();
        assert_eq!(set.residues.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(set.residues[&1].residue, "SER");
        assert!(set.residues[&2].phi.is_some());
        assert_eq!(set.residues[&3].residue, "ALA");

        let error = measure_peptide_angles(&dipeptide(), 'C').unwrap_err();
        assert_eq!(error.kind, ErrorKind::NoPeptideChainIds);
    }
}
