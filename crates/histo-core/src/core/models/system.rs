use super::atom::Atom;
use super::chain::{Chain, ChainType};
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::HashMap;

/// Represents a complete molecular system with atoms, residues and chains.
///
/// This is the in-memory form of one coordinate file (or one assembly cut
/// out of it). Chains keep their file order, residues keep their order
/// within each chain, and lookup maps give constant-time access by the
/// identifiers used in the file.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    /// Primary storage for atoms using a slot map for efficient ID management.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues using a slot map for efficient ID management.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains using a slot map for efficient ID management.
    chains: SlotMap<ChainId, Chain>,
    /// Chains in the order they were first seen.
    chain_order: Vec<ChainId>,
    /// Lookup map for finding residues by chain ID, residue number and insertion code.
    residue_id_map: HashMap<(ChainId, isize, Option<char>), ResidueId>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
}

impl MolecularSystem {
    /// Creates a new, empty molecular system.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atoms.iter()
    }

    pub fn atoms_iter_mut(&mut self) -> impl Iterator<Item = (AtomId, &mut Atom)> {
        self.atoms.iter_mut()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residues.iter()
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Returns the chains in file order.
    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order
            .iter()
            .filter_map(|&id| self.chains.get(id).map(|chain| (id, chain)))
    }

    /// The single-character identifiers of all chains, in file order.
    pub fn chain_ids(&self) -> Vec<char> {
        self.chains_iter().map(|(_, chain)| chain.id).collect()
    }

    /// Finds a chain ID by its single-character identifier.
    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    /// Finds a residue by chain and residue number, ignoring inserted residues.
    pub fn find_residue_by_id(
        &self,
        chain_id: ChainId,
        residue_number: isize,
    ) -> Option<ResidueId> {
        self.residue_id_map
            .get(&(chain_id, residue_number, None))
            .copied()
    }

    /// Position of a named atom within a residue.
    pub fn atom_position(&self, residue_id: ResidueId, atom_name: &str) -> Option<Point3<f64>> {
        let residue = self.residues.get(residue_id)?;
        let atom_id = residue.get_atom_id_by_name(atom_name)?;
        self.atoms.get(atom_id).map(|atom| atom.position)
    }

    /// Adds a new chain to the system or returns the existing one.
    ///
    /// This method is idempotent; if a chain with the given ID already exists,
    /// it returns the existing chain ID without creating a duplicate.
    pub fn add_chain(&mut self, id: char, chain_type: ChainType) -> ChainId {
        if let Some(&existing) = self.chain_id_map.get(&id) {
            return existing;
        }
        let chain_id = self.chains.insert(Chain::new(id, chain_type));
        self.chain_id_map.insert(id, chain_id);
        self.chain_order.push(chain_id);
        chain_id
    }

    /// Adds a new residue to the system or returns the existing one.
    ///
    /// Returns `None` if the chain does not exist.
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        insertion_code: Option<char>,
        name: &str,
        is_hetero: bool,
    ) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;
        let key = (chain_id, residue_number, insertion_code);

        if let Some(&existing) = self.residue_id_map.get(&key) {
            return Some(existing);
        }
        let residue = Residue::new(residue_number, insertion_code, name, chain_id, is_hetero);
        let residue_id = self.residues.insert(residue);
        self.residue_id_map.insert(key, residue_id);
        chain.residues.push(residue_id);
        if !is_hetero && chain.chain_type != ChainType::Protein {
            chain.chain_type = ChainType::Protein;
        }

        Some(residue_id)
    }

    /// Adds an atom to a specific residue.
    ///
    /// Returns `None` if the residue does not exist.
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }
        atom.residue_id = residue_id;
        let name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);
        self.residues.get_mut(residue_id)?.add_atom(&name, atom_id);
        Some(atom_id)
    }

    /// Residues of a chain that are part of the polypeptide, in chain order.
    pub fn standard_residues(&self, chain_id: ChainId) -> Vec<ResidueId> {
        self.chains
            .get(chain_id)
            .map(|chain| {
                chain
                    .residues
                    .iter()
                    .copied()
                    .filter(|&id| self.residues.get(id).is_some_and(Residue::is_standard))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// One-letter sequence of a chain's standard residues.
    pub fn chain_sequence(&self, chain_id: ChainId) -> String {
        self.standard_residues(chain_id)
            .into_iter()
            .filter_map(|id| self.residues.get(id).and_then(Residue::one_letter_code))
            .collect()
    }

    /// Residue number of the first standard residue of a chain.
    pub fn first_residue_number(&self, chain_id: ChainId) -> Option<isize> {
        self.standard_residues(chain_id)
            .first()
            .and_then(|&id| self.residues.get(id))
            .map(|residue| residue.id)
    }

    /// Copies the selected chains, keeping only residues accepted by `keep`.
    ///
    /// Chains left without residues are dropped. Atom serials are preserved.
    pub fn extract<F>(&self, chain_ids: &[char], keep: F) -> MolecularSystem
    where
        F: Fn(&Residue) -> bool,
    {
        let mut extracted = MolecularSystem::new();
        for (_, chain) in self.chains_iter() {
            if !chain_ids.contains(&chain.id) {
                continue;
            }
            let kept: Vec<&Residue> = chain
                .residues
                .iter()
                .filter_map(|&id| self.residues.get(id))
                .filter(|residue| keep(residue))
                .collect();
            if kept.is_empty() {
                continue;
            }
            let new_chain = extracted.add_chain(chain.id, ChainType::Other);
            for residue in kept {
                let Some(new_residue) = extracted.add_residue(
                    new_chain,
                    residue.id,
                    residue.insertion_code,
                    &residue.name,
                    residue.is_hetero,
                ) else {
                    continue;
                };
                for atom in residue.atoms.iter().filter_map(|&id| self.atoms.get(id)) {
                    extracted.add_atom_to_residue(new_residue, atom.clone());
                }
            }
        }
        extracted
    }

    /// Applies `transform` to every atom position.
    pub fn transform_positions<F>(&mut self, transform: F)
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        for (_, atom) in self.atoms.iter_mut() {
            atom.position = transform(&atom.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    struct TestRefs {
        chain_a_id: ChainId,
        gly_id: ResidueId,
        gly_ca_id: AtomId,
        water_id: ResidueId,
    }

    fn create_standard_test_system() -> (MolecularSystem, TestRefs) {
        let mut system = MolecularSystem::new();

        let chain_a_id = system.add_chain('A', ChainType::Other);
        let gly_id = system.add_residue(chain_a_id, 1, None, "GLY", false).unwrap();
        system
            .add_atom_to_residue(gly_id, Atom::new("N", gly_id, Point3::new(0.0, 0.0, 0.0)))
            .unwrap();
        let gly_ca_id = system
            .add_atom_to_residue(gly_id, Atom::new("CA", gly_id, Point3::new(1.4, 0.0, 0.0)))
            .unwrap();

        let ala_id = system.add_residue(chain_a_id, 2, None, "ALA", false).unwrap();
        system
            .add_atom_to_residue(ala_id, Atom::new("CA", ala_id, Point3::new(2.0, 1.0, 0.0)))
            .unwrap();

        let water_id = system.add_residue(chain_a_id, 301, None, "HOH", true).unwrap();
        system
            .add_atom_to_residue(water_id, Atom::new("O", water_id, Point3::new(9.0, 9.0, 9.0)))
            .unwrap();

        let chain_p_id = system.add_chain('P', ChainType::Other);
        let leu_id = system.add_residue(chain_p_id, 1, None, "LEU", false).unwrap();
        system
            .add_atom_to_residue(leu_id, Atom::new("CA", leu_id, Point3::new(5.0, 0.0, 0.0)))
            .unwrap();

        (
            system,
            TestRefs {
                chain_a_id,
                gly_id,
                gly_ca_id,
                water_id,
            },
        )
    }

    #[test]
    fn system_creation_and_access() {
        let (system, refs) = create_standard_test_system();

        assert_eq!(system.atom_count(), 5);
        assert_eq!(system.chain_ids(), vec!['A', 'P']);
        assert_eq!(system.find_chain_by_id('A'), Some(refs.chain_a_id));
        assert_eq!(
            system.find_residue_by_id(refs.chain_a_id, 1),
            Some(refs.gly_id)
        );
        assert_eq!(
            system.atom(refs.gly_ca_id).unwrap().position,
            Point3::new(1.4, 0.0, 0.0)
        );
        assert_eq!(
            system.atom_position(refs.gly_id, "CA"),
            Some(Point3::new(1.4, 0.0, 0.0))
        );
    }

    #[test]
    fn add_chain_and_residue_are_idempotent() {
        let (mut system, refs) = create_standard_test_system();
        assert_eq!(system.add_chain('A', ChainType::Other), refs.chain_a_id);
        assert_eq!(
            system.add_residue(refs.chain_a_id, 1, None, "GLY", false),
            Some(refs.gly_id)
        );
        assert_eq!(system.chain(refs.chain_a_id).unwrap().residues().len(), 3);
    }

    #[test]
    fn chain_with_polymer_residues_becomes_protein() {
        let (system, refs) = create_standard_test_system();
        assert_eq!(
            system.chain(refs.chain_a_id).unwrap().chain_type,
            ChainType::Protein
        );
    }

    #[test]
    fn sequence_skips_hetero_residues() {
        let (system, refs) = create_standard_test_system();
        assert_eq!(system.chain_sequence(refs.chain_a_id), "GA");
        assert_eq!(system.first_residue_number(refs.chain_a_id), Some(1));
        assert!(!system
            .standard_residues(refs.chain_a_id)
            .contains(&refs.water_id));
    }

    #[test]
    fn extract_copies_selected_chains_and_residues() {
        let (system, _) = create_standard_test_system();
        let extracted = system.extract(&['A'], |residue| residue.is_standard());

        assert_eq!(extracted.chain_ids(), vec!['A']);
        assert_eq!(extracted.atom_count(), 3);
        let chain = extracted.find_chain_by_id('A').unwrap();
        assert_eq!(extracted.chain_sequence(chain), "GA");
    }

    #[test]
    fn extract_drops_chains_without_kept_residues() {
        let (system, _) = create_standard_test_system();
        let extracted = system.extract(&['A', 'P'], |residue| residue.name == "LEU");
        assert_eq!(extracted.chain_ids(), vec!['P']);
    }

    #[test]
    fn transform_positions_moves_every_atom() {
        let (mut system, refs) = create_standard_test_system();
        let shift = Vector3::new(1.0, -1.0, 2.0);
        system.transform_positions(|p| p + shift);
        assert_eq!(
            system.atom(refs.gly_ca_id).unwrap().position,
            Point3::new(2.4, -1.0, 2.0)
        );
    }
}
