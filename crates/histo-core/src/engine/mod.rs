//! # Engine Module
//!
//! The analytical core of the curation pipeline, sitting between the data
//! models in [`crate::core`] and the step orchestration in
//! [`crate::workflows`].
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Cutoffs, thresholds and windows shared by every step
//! - **Error Handling** ([`error`]) - The stable failure kinds reported per structure
//! - **Progress Monitoring** ([`progress`]) - Callback-based reporting for steps and batches
//! - **Tasks** ([`tasks`]) - Classification, matching, alignment and contact analysis
//! - **Transactions** ([`transaction`]) - All-or-nothing application of a step's writes

pub mod config;
pub mod error;
pub mod progress;
pub mod tasks;
pub mod transaction;
