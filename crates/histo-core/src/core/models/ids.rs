use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to an [`Atom`](super::atom::Atom) inside a `MolecularSystem`.
    pub struct AtomId;
    /// Stable handle to a [`Residue`](super::residue::Residue) inside a `MolecularSystem`.
    pub struct ResidueId;
    /// Stable handle to a [`Chain`](super::chain::Chain) inside a `MolecularSystem`.
    pub struct ChainId;
}
