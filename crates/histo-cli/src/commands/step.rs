use super::Workspace;
use crate::cli::StepArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use crate::utils::progress::CliProgressHandler;
use histo::engine::progress::ProgressReporter;
use histo::workflows::BatchReport;
use tracing::info;

pub fn run(args: StepArgs) -> Result<()> {
    let workspace = Workspace::open(&args.workspace)?;
    let pipeline = workspace.pipeline();

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let report = match &args.item_set {
        Some(reference) => {
            let set = parser::parse_set_reference(reference)
                .map_err(|e| CliError::Argument(e.to_string()))?;
            info!("Running '{}' over item set {}/{}", args.step, set.context, set.slug);
            pipeline.run_item_set(&set.context, &set.slug, args.step, args.force, &reporter)?
        }
        None => {
            info!("Running '{}' for {} structure(s)", args.step, args.pdb_codes.len());
            pipeline.run_batch(&args.pdb_codes, args.step, args.force, &reporter)
        }
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?;
        println!("{}", json);
    } else {
        print_summary(&report);
    }

    if report.success {
        Ok(())
    } else {
        Err(CliError::StepFailed {
            step: report.step.to_string(),
            failed: report.error_count,
            total: report.item_count,
        })
    }
}

pub fn print_summary(report: &BatchReport) {
    println!(
        "Step '{}': {} of {} succeeded.",
        report.step.display_name(),
        report.success_count,
        report.item_count
    );
    for group in &report.errors {
        println!(
            "  {} ({}): {}",
            group.kind,
            group.count,
            group.pdb_codes.join(", ")
        );
    }
    if let Some(next) = report.next {
        println!("Next step: {}", next);
    }
}
