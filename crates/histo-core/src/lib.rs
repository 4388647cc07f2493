//! # Histo Core Library
//!
//! Curation of crystallographic MHC/peptide structures: chain role
//! assignment, complex typing, allele matching, superposition onto a
//! canonical frame and peptide contact analysis.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`MolecularSystem`,
//!   record facets), the PDB reader and writer, reference catalogues and the
//!   record store contract.
//!
//! - **[`engine`]: The Logic Core.** The analytical tasks (classification,
//!   clustering, matching, alignment, contacts), pipeline configuration,
//!   error kinds and the transaction used to apply a step's writes.
//!
//! - **[`workflows`]: The Public API.** The pipeline orchestrator. It runs
//!   steps for a single structure or over an item set, persisting one facet
//!   per step.

pub mod core;
pub mod engine;
pub mod workflows;
