use crate::core::models::system::MolecularSystem;
use crate::core::utils::geometry::{Superposition, calculate_rmsd, kabsch};
use crate::engine::error::{ErrorKind, StepError};
use nalgebra::Point3;
use std::ops::RangeInclusive;
use tracing::{debug, instrument};

const ALIGNMENT_ATOM: &str = "CA";

#[derive(Debug, Clone)]
pub struct AlignmentResult {
    /// RMSD of the selected atoms after superposition.
    pub rmsd: f64,
    pub superposition: Superposition,
    pub atom_count: usize,
    /// The whole target moved into the canonical frame.
    pub aligned: MolecularSystem,
}

/// CA positions of the standard residues of `chain_id` whose numbers fall in
/// `window`, in residue order.
fn window_atoms(
    system: &MolecularSystem,
    chain_id: char,
    window: &RangeInclusive<isize>,
    what: &str,
) -> Result<Vec<Point3<f64>>, StepError> {
    let chain = system.find_chain_by_id(chain_id).ok_or_else(|| {
        StepError::new(
            ErrorKind::UnableToLoadStructure,
            format!("{} structure has no chain '{}'", what, chain_id),
        )
    })?;

    let mut residues: Vec<_> = system
        .standard_residues(chain)
        .into_iter()
        .filter_map(|id| system.residue(id).map(|r| (id, r)))
        .filter(|(_, r)| window.contains(&r.id))
        .collect();
    residues.sort_by_key(|(_, r)| (r.id, r.insertion_code));

    Ok(residues
        .into_iter()
        .filter_map(|(id, _)| system.atom_position(id, ALIGNMENT_ATOM))
        .collect())
}

/// Superposes `target` onto `canonical` using the CA atoms of one chain in
/// each, restricted to residue numbers in `window`.
#[instrument(skip_all, name = "align_task", fields(chain = %target_chain))]
pub fn align(
    target: &MolecularSystem,
    canonical: &MolecularSystem,
    target_chain: char,
    canonical_chain: char,
    window: &RangeInclusive<isize>,
) -> Result<AlignmentResult, StepError> {
    let mobile = window_atoms(target, target_chain, window, "target")?;
    let reference = window_atoms(canonical, canonical_chain, window, "canonical")?;

    if mobile.is_empty() || mobile.len() != reference.len() {
        return Err(StepError::new(
            ErrorKind::AtomCountMismatch,
            format!(
                "{} atoms selected in the target against {} in the canonical structure",
                mobile.len(),
                reference.len()
            ),
        ));
    }

    let superposition = kabsch(&mobile, &reference).ok_or_else(|| {
        StepError::new(
            ErrorKind::AtomCountMismatch,
            "superposition failed to converge on the selected atoms",
        )
    })?;

    let moved: Vec<Point3<f64>> = mobile.iter().map(|p| superposition.apply(p)).collect();
    let rmsd = calculate_rmsd(&moved, &reference).unwrap_or(0.0);
    debug!(atoms = mobile.len(), rmsd, "Superposed target on canonical structure");

    let mut aligned = target.clone();
    aligned.transform_positions(|p| superposition.apply(p));

    Ok(AlignmentResult {
        rmsd,
        superposition,
        atom_count: mobile.len(),
        aligned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use nalgebra::{Rotation3, Vector3};

    fn helix(chain_id: char, count: isize) -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain(chain_id, ChainType::Protein);
        for number in 1..=count {
            let residue = system.add_residue(chain, number, None, "ALA", false).unwrap();
            let t = number as f64;
            let position = Point3::new(2.3 * (t * 1.75).cos(), 2.3 * (t * 1.75).sin(), 1.5 * t);
            system.add_atom_to_residue(residue, Atom::new("CA", residue, position));
        }
        system
    }

    #[test]
    fn rigidly_moved_copy_aligns_back_with_zero_rmsd() {
        let canonical = helix('A', 20);
        let mut target = helix('B', 20);
        let rotation = Rotation3::from_euler_angles(0.3, -1.1, 2.0);
        let shift = Vector3::new(12.0, -4.0, 7.5);
        target.transform_positions(|p| rotation * p + shift);

        let result = align(&target, &canonical, 'B', 'A', &(3..=15)).unwrap();
        assert_eq!(result.atom_count, 13);
        assert!(result.rmsd < 1e-6);

        let chain = result.aligned.find_chain_by_id('B').unwrap();
        let residue = result.aligned.find_residue_by_id(chain, 18).unwrap();
        let moved = result.aligned.atom_position(residue, "CA").unwrap();
        let canonical_chain = canonical.find_chain_by_id('A').unwrap();
        let expected = canonical
            .atom_position(canonical.find_residue_by_id(canonical_chain, 18).unwrap(), "CA")
            .unwrap();
        assert!((moved - expected).norm() < 1e-6);
    }

    #[test]
    fn differing_atom_counts_are_rejected() {
        let canonical = helix('A', 20);
        let target = helix('A', 10);
        let error = align(&target, &canonical, 'A', 'A', &(3..=15)).unwrap_err();
        assert_eq!(error.kind, ErrorKind::AtomCountMismatch);
    }

    #[test]
    fn missing_chain_cannot_be_aligned() {
        let canonical = helix('A', 20);
        let error = align(&canonical, &canonical, 'Z', 'A', &(3..=15)).unwrap_err();
        assert_eq!(error.kind, ErrorKind::UnableToLoadStructure);
    }
}
