use crate::core::models::system::MolecularSystem;
use crate::engine::error::{ErrorKind, StepError};
use tracing::instrument;

/// The two coordinate models cut out of an aligned assembly for its peptide.
#[derive(Debug, Clone)]
pub struct PeptideModels {
    /// The peptide chain with any modified or bound hetero groups it carries.
    pub with_hetero: MolecularSystem,
    pub peptide_only: MolecularSystem,
    /// Names of the hetero groups kept in `with_hetero`, in chain order.
    pub hetero_residues: Vec<String>,
}

#[instrument(skip_all, name = "peptide_task", fields(chain = %peptide_chain))]
pub fn extract_peptide(system: &MolecularSystem, peptide_chain: char) -> Result<PeptideModels, StepError> {
    let peptide_only = system.extract(&[peptide_chain], |residue| residue.is_standard());
    if peptide_only.atom_count() == 0 {
        return Err(StepError::new(
            ErrorKind::NoPeptideChainIds,
            format!("chain '{}' has no peptide residues", peptide_chain),
        ));
    }

    let with_hetero = system.extract(&[peptide_chain], |residue| {
        residue.is_standard() || residue.is_ligand()
    });
    let hetero_residues = with_hetero
        .residues_iter()
        .filter(|(_, residue)| !residue.is_standard())
        .map(|(_, residue)| residue.name.clone())
        .collect();

    Ok(PeptideModels {
        with_hetero,
        peptide_only,
        hetero_residues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use nalgebra::Point3;

    fn system() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let receptor = system.add_chain('A', ChainType::Protein);
        let tyr = system.add_residue(receptor, 7, None, "TYR", false).unwrap();
        system.add_atom_to_residue(tyr, Atom::new("CA", tyr, Point3::origin()));

        let peptide = system.add_chain('C', ChainType::Protein);
        for (number, name, hetero) in [(1, "SER", false), (2, "LEU", false), (3, "ACE", true), (4, "HOH", true)] {
            let residue = system.add_residue(peptide, number, None, name, hetero).unwrap();
            system.add_atom_to_residue(residue, Atom::new("CA", residue, Point3::new(number as f64, 0.0, 0.0)));
        }
        system
    }

    #[test]
    fn peptide_models_split_on_hetero_groups() {
        let models = extract_peptide(&system(), 'C').unwrap();
        assert_eq!(models.peptide_only.atom_count(), 2);
        assert_eq!(models.with_hetero.atom_count(), 3);
        assert_eq!(models.hetero_residues, vec!["ACE".to_string()]);
        assert_eq!(models.with_hetero.chain_ids(), vec!['C']);
    }

    #[test]
    fn chain_without_residues_is_rejected() {
        let error = extract_peptide(&system(), 'Z').unwrap_err();
        assert_eq!(error.kind, ErrorKind::NoPeptideChainIds);
    }
}
