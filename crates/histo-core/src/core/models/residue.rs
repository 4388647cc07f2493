use super::ids::{AtomId, ChainId};
use crate::core::utils::identifiers::{is_excluded_hetero, three_to_one};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub id: isize,                          // Residue sequence number from source file
    pub insertion_code: Option<char>,       // PDB insertion code, if any
    pub name: String,                       // Three-letter residue name (e.g., "ALA", "HOH")
    pub chain_id: ChainId,                  // ID of the parent chain
    pub is_hetero: bool,                    // Read from HETATM records
    pub(crate) atoms: Vec<AtomId>,          // Indices of atoms belonging to this residue
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its stable ID
}

impl Residue {
    pub(crate) fn new(
        id: isize,
        insertion_code: Option<char>,
        name: &str,
        chain_id: ChainId,
        is_hetero: bool,
    ) -> Self {
        Self {
            id,
            insertion_code,
            name: name.to_string(),
            chain_id,
            is_hetero,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        // Alternate conformers share names; the first one read wins the lookup.
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_insert(atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }

    /// One-letter code for the twenty natural amino acids, `None` otherwise.
    pub fn one_letter_code(&self) -> Option<char> {
        three_to_one(&self.name)
    }

    /// A residue that belongs to the polypeptide sequence.
    pub fn is_standard(&self) -> bool {
        !self.is_hetero && self.one_letter_code().is_some()
    }

    /// A hetero group worth keeping next to an extracted peptide: not water,
    /// not an ion, not a common crystallisation additive.
    pub fn is_ligand(&self) -> bool {
        self.is_hetero && self.one_letter_code().is_none() && !is_excluded_hetero(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn dummy_chain_id(n: u64) -> ChainId {
        ChainId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn new_residue_initializes_fields_correctly() {
        let chain_id = dummy_chain_id(1);
        let residue = Residue::new(10, None, "GLY", chain_id, false);
        assert_eq!(residue.id, 10);
        assert_eq!(residue.name, "GLY");
        assert_eq!(residue.chain_id, chain_id);
        assert!(residue.atoms().is_empty());
        assert!(residue.get_atom_id_by_name("CA").is_none());
    }

    #[test]
    fn add_atom_keeps_first_alternate_in_lookup() {
        let mut residue = Residue::new(5, None, "SER", dummy_chain_id(2), false);
        residue.add_atom("OG", dummy_atom_id(1));
        residue.add_atom("OG", dummy_atom_id(2));
        assert_eq!(residue.atoms().len(), 2);
        assert_eq!(residue.get_atom_id_by_name("OG"), Some(dummy_atom_id(1)));
    }

    #[test]
    fn standard_and_ligand_classification() {
        let chain_id = dummy_chain_id(3);
        let tyr = Residue::new(1, None, "TYR", chain_id, false);
        let water = Residue::new(500, None, "HOH", chain_id, true);
        let glycerol = Residue::new(501, None, "GOL", chain_id, true);
        let ligand = Residue::new(502, None, "XYZ", chain_id, true);

        assert!(tyr.is_standard());
        assert_eq!(tyr.one_letter_code(), Some('Y'));
        assert!(!water.is_standard());
        assert!(!water.is_ligand());
        assert!(!glycerol.is_ligand());
        assert!(ligand.is_ligand());
    }
}
