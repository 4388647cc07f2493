use super::Workspace;
use crate::cli::{SetArgs, SetCommands};
use crate::error::{CliError, Result};
use crate::utils::parser::{self, SetReference};
use histo::core::store::{ItemSetStore, KeyProvider};
use histo::core::store::itemset::slugify;
use tracing::info;

fn reference(input: &str) -> Result<SetReference> {
    let mut set =
        parser::parse_set_reference(input).map_err(|e| CliError::Argument(e.to_string()))?;
    set.slug = slugify(&set.slug);
    Ok(set)
}

fn not_found(set: &SetReference) -> CliError {
    CliError::Argument(format!("Item set '{}/{}' does not exist", set.context, set.slug))
}

pub fn run(args: SetArgs) -> Result<()> {
    let workspace = Workspace::open(&args.workspace)?;
    let sets = ItemSetStore::new(
        &workspace.store,
        KeyProvider::new(&workspace.config.pipeline.privacy),
    );

    match args.command {
        SetCommands::List { context } => {
            for name in sets.list(context.as_deref())? {
                println!("{}", name);
            }
        }
        SetCommands::Show { set } => {
            let set = reference(&set)?;
            let stored = sets
                .get(&set.context, &set.slug)?
                .ok_or_else(|| not_found(&set))?;
            let json = serde_json::to_string_pretty(&stored).map_err(anyhow::Error::from)?;
            println!("{}", json);
        }
        SetCommands::Add {
            set,
            pdb_codes,
            title,
            description,
        } => {
            let set = reference(&set)?;
            let slug = set.slug.clone();
            let title = title.unwrap_or_else(|| slug.clone());
            let members = normalise(&pdb_codes);
            let stored =
                sets.create_or_update(&set.context, &slug, &title, &description, &members)?;
            info!("Added {} code(s) to {}/{}", members.len(), set.context, slug);
            println!("{}/{} now has {} member(s).", stored.context, stored.slug(), stored.members.len());
        }
        SetCommands::Remove { set, pdb_codes } => {
            let set = reference(&set)?;
            let stored = sets
                .remove_members(&set.context, &set.slug, &normalise(&pdb_codes))?
                .ok_or_else(|| not_found(&set))?;
            println!("{}/{} now has {} member(s).", stored.context, stored.slug(), stored.members.len());
        }
    }
    Ok(())
}

fn normalise(pdb_codes: &[String]) -> Vec<String> {
    pdb_codes
        .iter()
        .map(|code| code.trim().to_ascii_lowercase())
        .collect()
}
