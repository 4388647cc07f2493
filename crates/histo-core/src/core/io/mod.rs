//! Reading and writing coordinate files.
//!
//! Structures travel through the pipeline as PDB text held in a record store;
//! [`pdb::PdbFile`] turns that text into a [`MolecularSystem`](crate::core::models::system::MolecularSystem)
//! and back through the [`traits::MolecularFile`] interface.

pub mod pdb;
pub mod traits;
