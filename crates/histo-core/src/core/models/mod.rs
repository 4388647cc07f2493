//! Data structures for coordinates and for the per-structure record.
//!
//! - [`system`] holds atoms, residues and chains in slot maps with lookup
//!   tables, built incrementally through [`builder`].
//! - [`facets`] are the serializable slices of a structure record, one per
//!   pipeline step, and [`record`] assembles them into a read-only view.
//!
//! ```ignore
//! use histo::core::models::{builder::{AtomRecord, MolecularSystemBuilder}, chain::ChainType};
//!
//! let mut builder = MolecularSystemBuilder::new();
//! builder.start_chain('A', ChainType::Protein);
//! builder.start_residue(1, None, "GLY", false);
//! builder.add_atom(AtomRecord { serial: 1, name: "CA", element: "C", position, occupancy: 1.0, b_factor: 0.0 });
//! let system = builder.build();
//! ```

pub mod atom;
pub mod builder;
pub mod chain;
pub mod facets;
pub mod ids;
pub mod record;
pub mod residue;
pub mod system;
