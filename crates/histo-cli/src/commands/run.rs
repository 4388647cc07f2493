use super::Workspace;
use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use tracing::info;

pub fn run(args: RunArgs) -> Result<()> {
    let workspace = Workspace::open(&args.workspace)?;
    let pipeline = workspace.pipeline();

    info!("Running {} from step '{}'", args.pdb_code, args.from);
    let outcomes = pipeline.run_through(&args.pdb_code, args.from);

    for outcome in &outcomes {
        if outcome.success {
            println!("✓ {}", outcome.step.display_name());
            continue;
        }
        println!("✗ {}", outcome.step.display_name());
        for error in &outcome.errors {
            println!("    {}: {}", error.kind, error.message);
        }
    }

    match outcomes.last() {
        Some(last) if !last.success => Err(CliError::StepFailed {
            step: last.step.to_string(),
            failed: 1,
            total: 1,
        }),
        _ => {
            println!("{} completed the pipeline.", args.pdb_code.trim().to_ascii_lowercase());
            Ok(())
        }
    }
}
