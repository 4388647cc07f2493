use super::atom::Atom;
use super::chain::ChainType;
use super::ids::{AtomId, ChainId, ResidueId};
use super::system::MolecularSystem;
use nalgebra::Point3;

/// Incremental construction of a [`MolecularSystem`] from record-ordered input.
///
/// Readers call `start_chain` and `start_residue` whenever the chain or
/// residue identifier changes, then `add_atom` for each atom line.
#[derive(Default)]
pub struct MolecularSystemBuilder {
    system: MolecularSystem,
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
}

/// Per-atom values read from a coordinate record.
#[derive(Debug, Clone)]
pub struct AtomRecord<'a> {
    pub serial: usize,
    pub name: &'a str,
    pub element: &'a str,
    pub position: Point3<f64>,
    pub occupancy: f64,
    pub b_factor: f64,
}

impl MolecularSystemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_chain(&mut self, id: char, chain_type: ChainType) -> &mut Self {
        self.current_chain = Some(self.system.add_chain(id, chain_type));
        self.current_residue = None;
        self
    }

    /// Starts (or re-enters) a residue on the current chain.
    ///
    /// Returns `None` when no chain has been started.
    pub fn start_residue(
        &mut self,
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        is_hetero: bool,
    ) -> Option<ResidueId> {
        let chain_id = self.current_chain?;
        let residue_id =
            self.system
                .add_residue(chain_id, number, insertion_code, name, is_hetero)?;
        self.current_residue = Some(residue_id);
        Some(residue_id)
    }

    /// Adds an atom to the current residue.
    ///
    /// Returns `None` when no residue has been started.
    pub fn add_atom(&mut self, record: AtomRecord<'_>) -> Option<AtomId> {
        let residue_id = self.current_residue?;
        let mut atom = Atom::new(record.name, residue_id, record.position);
        atom.serial = record.serial;
        if !record.element.is_empty() {
            atom.element = record.element.to_ascii_uppercase();
        }
        atom.occupancy = record.occupancy;
        atom.b_factor = record.b_factor;
        self.system.add_atom_to_residue(residue_id, atom)
    }

    pub fn build(self) -> MolecularSystem {
        self.system
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(serial: usize, name: &'static str) -> AtomRecord<'static> {
        AtomRecord {
            serial,
            name,
            element: "",
            position: Point3::new(serial as f64, 0.0, 0.0),
            occupancy: 1.0,
            b_factor: 20.0,
        }
    }

    #[test]
    fn builds_chains_residues_and_atoms_in_order() {
        let mut builder = MolecularSystemBuilder::new();
        builder.start_chain('A', ChainType::Other);
        builder.start_residue(1, None, "MET", false).unwrap();
        builder.add_atom(record(1, "N")).unwrap();
        builder.add_atom(record(2, "CA")).unwrap();
        builder.start_residue(2, None, "LYS", false).unwrap();
        builder.add_atom(record(3, "CA")).unwrap();
        builder.start_chain('B', ChainType::Other);
        builder.start_residue(1, None, "GLY", false).unwrap();
        builder.add_atom(record(4, "CA")).unwrap();

        let system = builder.build();
        assert_eq!(system.chain_ids(), vec!['A', 'B']);
        assert_eq!(system.atom_count(), 4);
        let chain_a = system.find_chain_by_id('A').unwrap();
        assert_eq!(system.chain_sequence(chain_a), "MK");
    }

    #[test]
    fn atoms_without_a_residue_are_rejected() {
        let mut builder = MolecularSystemBuilder::new();
        assert!(builder.start_residue(1, None, "GLY", false).is_none());
        assert!(builder.add_atom(record(1, "CA")).is_none());
    }

    #[test]
    fn explicit_element_overrides_guess() {
        let mut builder = MolecularSystemBuilder::new();
        builder.start_chain('A', ChainType::Other);
        builder.start_residue(1, None, "MSE", true).unwrap();
        let atom_id = builder
            .add_atom(AtomRecord {
                element: "se",
                ..record(1, "SE")
            })
            .unwrap();
        let system = builder.build();
        assert_eq!(system.atom(atom_id).unwrap().element, "SE");
    }
}
