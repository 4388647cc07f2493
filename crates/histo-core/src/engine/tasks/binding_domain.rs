use crate::core::models::system::MolecularSystem;
use crate::engine::error::{ErrorKind, StepError};
use std::ops::RangeInclusive;
use tracing::instrument;

/// Heavy-chain residues forming the alpha1/alpha2 peptide-binding domain.
pub const BINDING_DOMAIN: RangeInclusive<isize> = 1..=181;

/// The three cuts taken from the receptor chain of an aligned assembly.
#[derive(Debug, Clone)]
pub struct BindingDomainModels {
    pub chain_and_hetero: MolecularSystem,
    pub chain_only: MolecularSystem,
    pub binding_domain: MolecularSystem,
    pub residue_count: usize,
}

#[instrument(skip_all, name = "binding_domain_task", fields(chain = %chain_id))]
pub fn extract_binding_domain(
    system: &MolecularSystem,
    chain_id: char,
    domain: &RangeInclusive<isize>,
) -> Result<BindingDomainModels, StepError> {
    let chain_only = system.extract(&[chain_id], |residue| residue.is_standard());
    if chain_only.atom_count() == 0 {
        return Err(StepError::new(
            ErrorKind::UnableToLoadStructure,
            format!("chain '{}' has no residues to cut", chain_id),
        ));
    }

    let binding_domain = system.extract(&[chain_id], |residue| {
        residue.is_standard() && domain.contains(&residue.id)
    });
    if binding_domain.atom_count() == 0 {
        return Err(StepError::new(
            ErrorKind::UnableToLoadStructure,
            format!(
                "chain '{}' has no residues numbered {}..={}",
                chain_id,
                domain.start(),
                domain.end()
            ),
        ));
    }
    let residue_count = binding_domain.residues_iter().count();

    let chain_and_hetero = system.extract(&[chain_id], |residue| {
        residue.is_standard() || residue.is_ligand()
    });

    Ok(BindingDomainModels {
        chain_and_hetero,
        chain_only,
        binding_domain,
        residue_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use nalgebra::Point3;

    fn receptor() -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A', ChainType::Protein);
        for number in [1, 2, 180, 181, 182, 275] {
            let residue = system.add_residue(chain, number, None, "ALA", false).unwrap();
            system.add_atom_to_residue(residue, Atom::new("CA", residue, Point3::new(number as f64, 0.0, 0.0)));
        }
        let nag = system.add_residue(chain, 301, None, "NAG", true).unwrap();
        system.add_atom_to_residue(nag, Atom::new("C1", nag, Point3::origin()));
        let water = system.add_residue(chain, 302, None, "HOH", true).unwrap();
        system.add_atom_to_residue(water, Atom::new("O", water, Point3::origin()));
        let glycan = system.add_residue(chain, 303, None, "BMA", true).unwrap();
        system.add_atom_to_residue(glycan, Atom::new("C1", glycan, Point3::origin()));
        system
    }

    #[test]
    fn domain_cut_stops_at_the_last_domain_residue() {
        let models = extract_binding_domain(&receptor(), 'A', &BINDING_DOMAIN).unwrap();
        assert_eq!(models.residue_count, 4);
        assert_eq!(models.chain_only.atom_count(), 6);
        // NAG is an excluded additive, water is dropped, BMA is kept.
        assert_eq!(models.chain_and_hetero.atom_count(), 7);
    }

    #[test]
    fn missing_chain_is_an_error() {
        let error = extract_binding_domain(&receptor(), 'B', &BINDING_DOMAIN).unwrap_err();
        assert_eq!(error.kind, ErrorKind::UnableToLoadStructure);
    }

    #[test]
    fn chain_outside_the_domain_is_an_error() {
        assert!(extract_binding_domain(&receptor(), 'A', &(400..=500)).is_err());
    }
}
