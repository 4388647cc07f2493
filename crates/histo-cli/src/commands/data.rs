use crate::cli::{DataArgs, DataCommands};
use crate::data::{DataManager, InstallStatus};
use crate::error::Result;
use std::path::PathBuf;
use tracing::info;

pub fn run(args: DataArgs) -> Result<()> {
    match args.command {
        DataCommands::Init { force } => handle_init(force),
        DataCommands::Path => handle_path(),
        DataCommands::SetPath { path } => handle_set_path(path),
        DataCommands::ResetPath => handle_reset_path(),
    }
}

fn handle_init(force: bool) -> Result<()> {
    let manager = DataManager::new()?;
    println!("Installing catalogues into: {:?}", manager.catalogue_dir());

    for status in manager.install_catalogues(force)? {
        match status {
            InstallStatus::Written(path) => println!("  wrote {}", path.display()),
            InstallStatus::Kept(path) => {
                println!("  kept  {} (use --force to overwrite)", path.display())
            }
        }
    }
    info!("Catalogue installation finished.");
    Ok(())
}

fn handle_path() -> Result<()> {
    let manager = DataManager::new()?;
    println!("{}", manager.get_data_path().display());
    Ok(())
}

fn handle_set_path(path: PathBuf) -> Result<()> {
    DataManager::set_custom_path(&path)?;
    println!("Data path set to: {}", path.display());
    Ok(())
}

fn handle_reset_path() -> Result<()> {
    DataManager::reset_path()?;
    let manager = DataManager::new()?;
    println!(
        "Data path reset to default: {}",
        manager.get_data_path().display()
    );
    Ok(())
}
