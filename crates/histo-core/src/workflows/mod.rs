//! # Workflows Module
//!
//! The user-facing layer of the library. It ties the record store, the
//! structure source, the catalogues and the engine tasks together into the
//! curation pipeline.
//!
//! ## Architecture
//!
//! - **Steps** ([`steps`]) - The ordered list of pipeline steps and the facet each writes
//! - **Pipeline** ([`pipeline`]) - Runs one step, or a run of steps, for one structure
//! - **Batches** ([`batch`]) - Runs one step over many structures and aggregates failures
//!
//! Each step commits its writes through a single transaction, so a failed
//! step never leaves a partial facet behind.

pub mod batch;
pub mod pipeline;
pub mod steps;

pub use batch::{BatchError, BatchReport, ErrorGroup};
pub use pipeline::{ErrorEntry, Pipeline, StepOutcome};
pub use steps::PipelineStep;
