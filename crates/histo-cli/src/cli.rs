use clap::{Args, Parser, Subcommand};
use histo::workflows::PipelineStep;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Histo Contributors",
    version,
    about = "Histo CLI - curation of MHC/peptide crystal structures: chain roles, complex types, alleles, superposition and peptide contacts.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for batch runs.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one pipeline step for some structures or for the members of an item set.
    Step(StepArgs),
    /// Run a structure through the pipeline, from a step onwards, until a step fails.
    Run(RunArgs),
    /// Print the stored record of a structure.
    Show(ShowArgs),
    /// Inspect and edit item sets.
    Set(SetArgs),
    /// Store the canonical structure that assemblies are superposed onto.
    Canonical(CanonicalArgs),
    /// Manage the local data directory (catalogues, default store location).
    Data(DataArgs),
}

/// Where records live and how the pipeline is configured.
#[derive(Args, Debug, Clone, Default)]
pub struct WorkspaceArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root directory of the record store, overriding the config file.
    #[arg(long, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Directory holding `<code>.pdb` input structures, overriding the config file.
    #[arg(long, value_name = "PATH")]
    pub source_dir: Option<PathBuf>,

    /// Directory holding `chains.toml`, `complexes.toml` and `alleles.csv`.
    #[arg(long, value_name = "PATH")]
    pub catalogue_dir: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S pipeline.contact-cutoff=4.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `step` subcommand.
#[derive(Args, Debug)]
pub struct StepArgs {
    /// The step to run, e.g. `assign-chains` or `match_allele`.
    #[arg(value_name = "STEP")]
    pub step: PipelineStep,

    /// Structures to process. Can be used multiple times.
    #[arg(short, long = "pdb-code", value_name = "CODE", required_unless_present = "item_set")]
    pub pdb_codes: Vec<String>,

    /// Process the members of an item set, given as `context/slug`.
    #[arg(long = "item-set", value_name = "CONTEXT/SLUG", conflicts_with = "pdb_codes")]
    pub item_set: Option<String>,

    /// Repeat `initialise` or `fetch` even when their output already exists.
    #[arg(long)]
    pub force: bool,

    /// Print the batch report as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(value_name = "CODE")]
    pub pdb_code: String,

    /// First step to run.
    #[arg(long, value_name = "STEP", default_value = "initialise")]
    pub from: PipelineStep,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,
}

/// Arguments for the `show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(value_name = "CODE")]
    pub pdb_code: String,

    /// Print every stored facet instead of the summary.
    #[arg(long)]
    pub full: bool,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,
}

/// Arguments for the `set` subcommand.
#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(subcommand)]
    pub command: SetCommands,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,
}

#[derive(Subcommand, Debug)]
pub enum SetCommands {
    /// List stored sets, optionally within one context.
    List {
        #[arg(long, value_name = "CONTEXT")]
        context: Option<String>,
    },
    /// Print the members and metadata of a set.
    Show {
        #[arg(value_name = "CONTEXT/SLUG")]
        set: String,
    },
    /// Add structures to a set, creating it when absent.
    Add {
        #[arg(value_name = "CONTEXT/SLUG")]
        set: String,
        #[arg(value_name = "CODE", required = true)]
        pdb_codes: Vec<String>,
        /// Title used when the set is created.
        #[arg(long)]
        title: Option<String>,
        /// Description used when the set is created.
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Remove structures from an existing set.
    Remove {
        #[arg(value_name = "CONTEXT/SLUG")]
        set: String,
        #[arg(value_name = "CODE", required = true)]
        pdb_codes: Vec<String>,
    },
}

/// Arguments for the `canonical` subcommand.
#[derive(Args, Debug)]
pub struct CanonicalArgs {
    /// PDB file holding the canonical structure.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Class the structure is canonical for; defaults to the configured class.
    #[arg(long, value_name = "CLASS")]
    pub class: Option<String>,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,
}

/// Arguments for the `data` subcommand.
#[derive(Args, Debug)]
pub struct DataArgs {
    #[command(subcommand)]
    pub command: DataCommands,
}

/// Available commands for data management.
#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Write the built-in catalogues into the data directory for editing.
    Init {
        /// Overwrite catalogue files that already exist.
        #[arg(long)]
        force: bool,
    },
    /// Show the absolute path to the local data directory.
    Path,
    /// Set a custom absolute path for the local data directory.
    SetPath {
        /// The new path to use for storing data files.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Reset the data path to its default, OS-specific location.
    ResetPath,
}
