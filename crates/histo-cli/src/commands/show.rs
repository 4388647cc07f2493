use super::Workspace;
use crate::cli::ShowArgs;
use crate::error::{CliError, Result};

pub fn run(args: ShowArgs) -> Result<()> {
    let workspace = Workspace::open(&args.workspace)?;
    let record = workspace
        .pipeline()
        .load_record(&args.pdb_code)?
        .ok_or_else(|| CliError::NotFound(args.pdb_code.clone()))?;

    let json = if args.full {
        serde_json::to_string_pretty(&record)
    } else {
        serde_json::to_string_pretty(&record.summary())
    }
    .map_err(anyhow::Error::from)?;
    println!("{}", json);
    Ok(())
}
