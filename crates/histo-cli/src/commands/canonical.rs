use super::Workspace;
use crate::cli::CanonicalArgs;
use crate::error::{CliError, Result};
use histo::core::io::pdb::PdbFile;
use histo::core::io::traits::MolecularFile;
use histo::core::store::RecordStore;
use tracing::info;

pub fn run(args: CanonicalArgs) -> Result<()> {
    let workspace = Workspace::open(&args.workspace)?;

    info!("Reading canonical structure from {:?}", &args.input);
    let text = std::fs::read_to_string(&args.input)?;
    let (system, _) = PdbFile::read_from_str(&text).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;
    if system.atom_count() == 0 {
        return Err(CliError::FileParsing {
            path: args.input.clone(),
            source: anyhow::anyhow!("no atoms found"),
        });
    }

    let class = args
        .class
        .as_deref()
        .unwrap_or(&workspace.config.pipeline.canonical_class);
    let key = workspace.pipeline().keys().canonical_key(class);
    workspace.store.put(&key, text.as_bytes())?;

    println!(
        "Stored canonical structure for '{}' ({} chain(s), {} atom(s)).",
        class,
        system.chain_ids().len(),
        system.atom_count()
    );
    Ok(())
}
