use super::ids::ResidueId;
use nalgebra::Point3;

/// A single atom record read from a coordinate file.
///
/// Only the fields needed for superposition, contact search and
/// torsion measurement are kept; everything else on the source line is
/// regenerated on write.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The serial number from the source file.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "N", "OG1").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// Element symbol, upper case (e.g., "C", "SE").
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    pub occupancy: f64,
    pub b_factor: f64,
}

impl Atom {
    /// Creates a new `Atom` with full occupancy and a zero B-factor.
    ///
    /// The element is guessed from the atom name when it is not known,
    /// following the PDB convention that the first letter of the name is
    /// the element for protein atoms.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            serial: 0,
            name: name.to_string(),
            residue_id,
            element: guess_element(name),
            position,
            occupancy: 1.0,
            b_factor: 0.0,
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        matches!(self.element.as_str(), "H" | "D")
    }
}

fn guess_element(name: &str) -> String {
    name.trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}
