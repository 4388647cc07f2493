//! Stateless building blocks of the curation pipeline.
//!
//! Each submodule answers one question about a structure: what each chain
//! is, which chains are copies of each other, which complex and allele the
//! structure holds, how it superposes onto the canonical frame, how its
//! peptide sits in the cleft and which residues line the cleft pockets.
//! None of them touch the record store; the workflows layer reads their
//! inputs and persists their results.

pub mod align;
pub mod allele;
pub mod angles;
pub mod binding_domain;
pub mod classify;
pub mod cluster;
pub mod complex_type;
pub mod contacts;
pub mod distances;
pub mod features;
pub mod peptide;
pub mod pockets;
