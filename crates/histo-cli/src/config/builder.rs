use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FilePipelineConfig};
use super::models::AppConfig;
use crate::cli::WorkspaceArgs;
use crate::data::DataManager;
use crate::error::{CliError, Result};
use crate::utils::parser;
use histo::engine::config::{PipelineConfig, PipelineConfigBuilder};
use std::path::PathBuf;
use std::str::FromStr;

pub fn build_config(args: &WorkspaceArgs, data_manager: &DataManager) -> Result<AppConfig> {
    let defaults = DefaultsConfig::from_data(data_manager);

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let store_path = args
        .store
        .clone()
        .or(file_config.store.take())
        .unwrap_or(defaults.store);
    let source_dir = args
        .source_dir
        .clone()
        .or(file_config.source_dir.take())
        .unwrap_or(defaults.source_dir);
    let catalogue_dir = args
        .catalogue_dir
        .clone()
        .or(file_config.catalogue_dir.take())
        .or(defaults.catalogue_dir);

    if let Some(dir) = &catalogue_dir {
        if !dir.is_dir() {
            return Err(CliError::Config(format!(
                "Catalogue directory does not exist: {:?}.\nHint: Run 'histo data init' to install the default catalogues.",
                dir
            )));
        }
    }

    let pipeline = build_pipeline_config(file_config.pipeline.take().unwrap_or_default())?;

    Ok(AppConfig {
        store_path,
        source_dir,
        catalogue_dir,
        pipeline,
    })
}

fn build_pipeline_config(file: FilePipelineConfig) -> Result<PipelineConfig> {
    let mut builder = PipelineConfigBuilder::new();
    if let Some(v) = file.peptide_length_cutoff {
        builder = builder.peptide_length_cutoff(v);
    }
    if let Some(v) = file.contact_cutoff {
        builder = builder.contact_cutoff(v);
    }
    if let Some([start, end]) = file.alignment_window {
        builder = builder.alignment_window(start..=end);
    }
    if let Some(v) = file.allele_truncation {
        builder = builder.allele_truncation(v);
    }
    if let Some(v) = file.signal_peptide_threshold {
        builder = builder.signal_peptide_threshold(v);
    }
    if let Some(v) = file.min_allele_length {
        builder = builder.min_allele_length(v);
    }
    if let Some(v) = file.fuzzy_threshold {
        builder = builder.fuzzy_threshold(v);
    }
    if let Some(v) = file.possible_complex_threshold {
        builder = builder.possible_complex_threshold(v);
    }
    if let Some(v) = file.exposure_limit {
        builder = builder.exposure_limit(v);
    }
    if let Some(v) = file.cleft_residue_limit {
        builder = builder.cleft_residue_limit(v);
    }
    if let Some(v) = file.privacy {
        builder = builder.privacy(v);
    }
    if let Some(v) = file.canonical_class {
        builder = builder.canonical_class(v);
    }
    if let Some(v) = file.canonical_chain {
        builder = builder.canonical_chain(v);
    }
    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value) =
            parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        if let Some(field) = key.strip_prefix("pipeline.") {
            let pipeline = config.pipeline.get_or_insert_with(Default::default);
            match field {
                "peptide-length-cutoff" => {
                    pipeline.peptide_length_cutoff = Some(parse_value(key, value, "integer")?)
                }
                "contact-cutoff" => pipeline.contact_cutoff = Some(parse_value(key, value, "float")?),
                "alignment-window" => {
                    let window = parser::parse_window(value)
                        .map_err(|e| CliError::Config(e.to_string()))?;
                    pipeline.alignment_window = Some([*window.start(), *window.end()]);
                }
                "allele-truncation" => {
                    pipeline.allele_truncation = Some(parse_value(key, value, "integer")?)
                }
                "signal-peptide-threshold" => {
                    pipeline.signal_peptide_threshold = Some(parse_value(key, value, "integer")?)
                }
                "min-allele-length" => {
                    pipeline.min_allele_length = Some(parse_value(key, value, "integer")?)
                }
                "fuzzy-threshold" => pipeline.fuzzy_threshold = Some(parse_value(key, value, "float")?),
                "possible-complex-threshold" => {
                    pipeline.possible_complex_threshold = Some(parse_value(key, value, "float")?)
                }
                "exposure-limit" => pipeline.exposure_limit = Some(parse_value(key, value, "integer")?),
                "cleft-residue-limit" => {
                    pipeline.cleft_residue_limit = Some(parse_value(key, value, "integer")?)
                }
                "privacy" => pipeline.privacy = Some(value.to_string()),
                "canonical-class" => pipeline.canonical_class = Some(value.to_string()),
                "canonical-chain" => {
                    pipeline.canonical_chain = Some(
                        parser::parse_chain_id(value).map_err(|e| CliError::Config(e.to_string()))?,
                    )
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
            continue;
        }

        match key {
            "store" => config.store = Some(PathBuf::from(value)),
            "source-dir" => config.source_dir = Some(PathBuf::from(value)),
            "catalogue-dir" => config.catalogue_dir = Some(PathBuf::from(value)),
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
