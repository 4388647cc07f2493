use super::pipeline::{Pipeline, StepOutcome};
use super::steps::PipelineStep;
use crate::core::store::{ItemSetStore, StoreError};
use crate::engine::error::ErrorKind;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Item set '{context}/{slug}' does not exist")]
    SetNotFound { context: String, slug: String },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// All failures of one kind within a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorGroup {
    pub kind: ErrorKind,
    pub count: usize,
    pub pdb_codes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub step: PipelineStep,
    pub item_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// True when every item succeeded.
    pub success: bool,
    pub errors: Vec<ErrorGroup>,
    pub next: Option<PipelineStep>,
}

impl BatchReport {
    /// Groups failures by kind; groups are ordered by kind, identifiers by
    /// input order.
    pub fn from_outcomes(step: PipelineStep, outcomes: &[StepOutcome]) -> Self {
        let mut groups: BTreeMap<ErrorKind, Vec<String>> = BTreeMap::new();
        for outcome in outcomes.iter().filter(|o| !o.success) {
            for error in &outcome.errors {
                groups.entry(error.kind).or_default().push(error.pdb_code.clone());
            }
        }
        let success_count = outcomes.iter().filter(|o| o.success).count();
        let error_count = outcomes.len() - success_count;

        BatchReport {
            step,
            item_count: outcomes.len(),
            success_count,
            error_count,
            success: error_count == 0,
            errors: groups
                .into_iter()
                .map(|(kind, pdb_codes)| ErrorGroup {
                    kind,
                    count: pdb_codes.len(),
                    pdb_codes,
                })
                .collect(),
            next: step.next(),
        }
    }
}

impl<'a> Pipeline<'a> {
    /// Runs `step` for every structure independently. One item failing never
    /// stops the others.
    #[instrument(skip_all, name = "pipeline_batch", fields(step = %step, items = pdb_codes.len()))]
    pub fn run_batch(
        &self,
        pdb_codes: &[String],
        step: PipelineStep,
        force: bool,
        reporter: &ProgressReporter,
    ) -> BatchReport {
        reporter.report(Progress::BatchStart {
            total_items: pdb_codes.len() as u64,
        });

        let run_one = |pdb_code: &String| {
            reporter.report(Progress::StepStart {
                pdb_code: pdb_code.clone(),
                step: step.slug(),
            });
            let outcome = self.run_step(pdb_code, step, force);
            reporter.report(Progress::StepFinish {
                pdb_code: outcome.pdb_code.clone(),
                step: step.slug(),
                success: outcome.success,
            });
            reporter.report(Progress::ItemDone {
                pdb_code: outcome.pdb_code.clone(),
                success: outcome.success,
            });
            outcome
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<StepOutcome> = pdb_codes.par_iter().map(run_one).collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<StepOutcome> = pdb_codes.iter().map(run_one).collect();

        reporter.report(Progress::BatchFinish);
        let report = BatchReport::from_outcomes(step, &outcomes);
        info!(
            "Batch '{}' finished: {} succeeded, {} failed.",
            step.slug(),
            report.success_count,
            report.error_count
        );
        report
    }

    /// Runs `step` over the members of a stored item set.
    pub fn run_item_set(
        &self,
        context: &str,
        slug: &str,
        step: PipelineStep,
        force: bool,
        reporter: &ProgressReporter,
    ) -> Result<BatchReport, BatchError> {
        let sets = ItemSetStore::new(self.store(), self.keys().clone());
        let set = sets
            .get(context, slug)?
            .ok_or_else(|| BatchError::SetNotFound {
                context: context.to_string(),
                slug: slug.to_string(),
            })?;
        Ok(self.run_batch(&set.members, step, force, reporter))
    }
}
