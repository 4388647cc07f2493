//! # Core Module
//!
//! Stateless building blocks shared by the algorithms and the pipeline.
//!
//! - **Molecular representation** ([`models`]): atoms, residues, chains and
//!   the [`MolecularSystem`](models::system::MolecularSystem) that owns them,
//!   plus the serializable record facets.
//! - **File I/O** ([`io`]): fixed-column PDB reading and writing.
//! - **Reference data** ([`catalogue`]): chain roles, complex types and
//!   allele sequences.
//! - **Persistence** ([`store`]): the key/value store contract, key layout
//!   and curated item sets.
//! - **Structure sources** ([`source`]): where raw coordinates come from.
//! - **Utilities** ([`utils`]): geometry, sequence similarity and residue
//!   name tables.

pub mod catalogue;
pub mod io;
pub mod models;
pub mod source;
pub mod store;
pub mod utils;
