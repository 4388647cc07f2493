use super::steps::PipelineStep;
use crate::core::catalogue::Catalogues;
use crate::core::io::pdb::{PdbFile, PdbMetadata};
use crate::core::io::traits::MolecularFile;
use crate::core::models::facets::*;
use crate::core::models::record::{PEPTIDE_ROLE, StructureRecord};
use crate::core::models::system::MolecularSystem;
use crate::core::source::{PublicationSource, StructureSource};
use crate::core::store::{ItemSetStore, JsonStoreExt, KeyProvider, RecordStore, StoreError};
use crate::core::utils::timestamp;
use crate::engine::config::PipelineConfig;
use crate::engine::error::{ErrorKind, StepError};
use crate::engine::tasks::align::align;
use crate::engine::tasks::allele::AlleleMatcher;
use crate::engine::tasks::angles::{measure_angles, measure_peptide_angles};
use crate::engine::tasks::binding_domain::{BINDING_DOMAIN, extract_binding_domain};
use crate::engine::tasks::classify::{AssignmentBuilder, ChainClassifier, add_polymer_chains};
use crate::engine::tasks::cluster::ClusterBuilder;
use crate::engine::tasks::complex_type::{ComplexMatch, ComplexTypeMatcher, cluster_roles, split_assemblies};
use crate::engine::tasks::contacts::find_contacts;
use crate::engine::tasks::distances::measure_distances;
use crate::engine::tasks::features::derive_features;
use crate::engine::tasks::peptide::extract_peptide;
use crate::engine::tasks::pockets::{POCKET_ROLE, direct_mapping_organism, map_pockets};
use crate::engine::transaction::{self, RecordTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info, instrument, warn};

pub const COMPLEX_TYPE_CONTEXT: &str = "complex_type";
pub const FEATURES_CONTEXT: &str = "features";

/// Feature sets maintained by `derive_features`: slug, title, description.
const FEATURE_SETS: [(&str, &str, &str); 4] = [
    (
        "n_terminally_extended",
        "N-terminally extended peptides",
        "Peptides extending beyond the N-terminal pocket",
    ),
    (
        "c_terminally_extended",
        "C-terminally extended peptides",
        "Peptides extending beyond the C-terminal pocket",
    ),
    (
        "extended",
        "Extended peptides",
        "Peptides extending beyond either terminal pocket",
    ),
    (
        "exposed_bulge",
        "Peptides with an exposed bulge",
        "Peptides with a solvent-exposed residue between the anchors",
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub kind: ErrorKind,
    pub pdb_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

/// Result of running one step for one structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub pdb_code: String,
    pub step: PipelineStep,
    pub success: bool,
    pub errors: Vec<ErrorEntry>,
    /// The facet as written, present only on success.
    pub facet: Option<Value>,
}

impl StepOutcome {
    pub fn error_kinds(&self) -> Vec<ErrorKind> {
        self.errors.iter().map(|e| e.kind).collect()
    }
}

/// Structure identifiers are compared in lower case.
pub fn normalise_pdb_code(pdb_code: &str) -> String {
    pdb_code.trim().to_ascii_lowercase()
}

/// Runs pipeline steps against a record store.
///
/// Every step reads the facets it depends on, computes its own facet and
/// commits all of its writes through one [`RecordTransaction`]. A failing
/// step leaves the store exactly as it found it.
///
/// Item sets are shared by every structure, so steps that rewrite them hold
/// `set_updates` from the first set read to the commit.
pub struct Pipeline<'a> {
    store: &'a dyn RecordStore,
    source: &'a dyn StructureSource,
    publications: Option<&'a dyn PublicationSource>,
    catalogues: &'a Catalogues,
    config: &'a PipelineConfig,
    keys: KeyProvider,
    set_updates: Mutex<()>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        source: &'a dyn StructureSource,
        catalogues: &'a Catalogues,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            store,
            source,
            publications: None,
            catalogues,
            config,
            keys: KeyProvider::new(&config.privacy),
            set_updates: Mutex::new(()),
        }
    }

    pub fn with_publications(mut self, publications: &'a dyn PublicationSource) -> Self {
        self.publications = Some(publications);
        self
    }

    pub fn keys(&self) -> &KeyProvider {
        &self.keys
    }

    pub fn store(&self) -> &'a dyn RecordStore {
        self.store
    }

    pub fn load_record(&self, pdb_code: &str) -> Result<Option<StructureRecord>, StoreError> {
        StructureRecord::load(self.store, &self.keys, &normalise_pdb_code(pdb_code))
    }

    #[instrument(skip_all, name = "pipeline_step", fields(pdb_code = %pdb_code, step = %step))]
    pub fn run_step(&self, pdb_code: &str, step: PipelineStep, force: bool) -> StepOutcome {
        let pdb_code = normalise_pdb_code(pdb_code);
        info!("Running step '{}'.", step.display_name());

        let _guard = step
            .updates_item_sets()
            .then(|| self.set_updates.lock().unwrap_or_else(PoisonError::into_inner));
        let result = transaction::run(self.store, |tx| self.execute(&pdb_code, step, force, tx));
        match result {
            Ok(facet) => {
                info!("Step '{}' succeeded.", step.display_name());
                StepOutcome {
                    pdb_code,
                    step,
                    success: true,
                    errors: Vec::new(),
                    facet: Some(facet),
                }
            }
            Err(error) => {
                warn!(kind = %error.kind, "Step '{}' failed: {}", step.display_name(), error.message);
                StepOutcome {
                    errors: vec![ErrorEntry {
                        kind: error.kind,
                        pdb_code: pdb_code.clone(),
                        message: error.message,
                        detail: error.detail,
                    }],
                    pdb_code,
                    step,
                    success: false,
                    facet: None,
                }
            }
        }
    }

    /// Runs `from` and every later step until one fails.
    #[instrument(skip_all, name = "pipeline_run", fields(pdb_code = %pdb_code))]
    pub fn run_through(&self, pdb_code: &str, from: PipelineStep) -> Vec<StepOutcome> {
        let mut outcomes = Vec::new();
        let mut step = Some(from);
        while let Some(current) = step {
            let outcome = self.run_step(pdb_code, current, false);
            let success = outcome.success;
            outcomes.push(outcome);
            if !success {
                break;
            }
            step = current.next();
        }
        info!(
            "Ran {} step(s); last was '{}'.",
            outcomes.len(),
            outcomes.last().map(|o| o.step.slug()).unwrap_or("none")
        );
        outcomes
    }

    fn execute(
        &self,
        pdb_code: &str,
        step: PipelineStep,
        force: bool,
        tx: &mut RecordTransaction<'a>,
    ) -> Result<Value, StepError> {
        if step != PipelineStep::Initialise {
            self.require::<CoreFacet>(pdb_code, Facet::Core, ErrorKind::NotInitialised)?;
        }
        match step {
            PipelineStep::Initialise => self.initialise(pdb_code, force, tx),
            PipelineStep::Fetch => self.fetch(pdb_code, force, tx),
            PipelineStep::AssignChains => self.assign_chains(pdb_code, tx),
            PipelineStep::ClusterAlikeChains => self.cluster_alike_chains(pdb_code, tx),
            PipelineStep::AssignComplexType => self.assign_complex_type(pdb_code, tx),
            PipelineStep::MatchAllele => self.match_allele(pdb_code, tx),
            PipelineStep::Align => self.align(pdb_code, tx),
            PipelineStep::ExtractPeptide => self.extract_peptide(pdb_code, tx),
            PipelineStep::FindContacts => self.find_contacts(pdb_code, tx),
            PipelineStep::DeriveFeatures => self.derive_features(pdb_code, tx),
            PipelineStep::MeasureAngles => self.measure_angles(pdb_code, tx),
            PipelineStep::ExtractBindingDomain => self.extract_binding_domain(pdb_code, tx),
            PipelineStep::MeasureDistances => self.measure_distances(pdb_code, tx),
            PipelineStep::MeasurePeptideAngles => self.measure_peptide_angles(pdb_code, tx),
            PipelineStep::MapPockets => self.map_pockets(pdb_code, tx),
        }
    }

    // --- Record access ---

    fn facet<T: DeserializeOwned>(&self, pdb_code: &str, facet: Facet) -> Result<Option<T>, StepError> {
        Ok(self.store.get_json(&self.keys.facet_key(pdb_code, facet))?)
    }

    fn require<T: DeserializeOwned>(
        &self,
        pdb_code: &str,
        facet: Facet,
        kind: ErrorKind,
    ) -> Result<T, StepError> {
        self.facet(pdb_code, facet)?.ok_or_else(|| {
            StepError::new(kind, format!("'{}' has no {} facet", pdb_code, facet))
        })
    }

    fn stage_facet<T: Serialize>(
        &self,
        tx: &mut RecordTransaction<'a>,
        pdb_code: &str,
        facet: Facet,
        value: &T,
    ) -> Result<Value, StepError> {
        tx.stage_json(self.keys.facet_key(pdb_code, facet), value)?;
        serde_json::to_value(value).map_err(|e| StepError::new(ErrorKind::StoreFailure, e.to_string()))
    }

    fn load_coordinates(&self, key: &str, kind: ErrorKind) -> Result<(MolecularSystem, PdbMetadata), StepError> {
        let text = self
            .store
            .get_text(key)?
            .ok_or_else(|| StepError::new(kind, format!("no coordinates stored at '{}'", key)))?;
        Ok(PdbFile::read_from_str(&text)?)
    }

    fn load_structure(&self, pdb_code: &str) -> Result<(MolecularSystem, PdbMetadata), StepError> {
        let source: SourceFacet =
            self.require(pdb_code, Facet::Source, ErrorKind::UnableToLoadStructure)?;
        self.load_coordinates(&source.file_key, ErrorKind::UnableToLoadStructure)
    }

    fn stage_coordinates(
        tx: &mut RecordTransaction<'a>,
        key: &str,
        system: &MolecularSystem,
    ) -> Result<(), StepError> {
        let text = PdbFile::write_system_to_string(system)?;
        tx.stage(key, text.into_bytes());
        Ok(())
    }

    fn peptide_chain(complex: &ComplexTypeFacet, assembly: &AssemblyChains) -> Result<char, StepError> {
        complex.chain_for(assembly, PEPTIDE_ROLE).ok_or_else(|| {
            StepError::new(
                ErrorKind::NoPeptideChainIds,
                format!("assembly {} has no peptide chain", assembly.id),
            )
        })
    }

    fn principal_chain(complex: &ComplexTypeFacet, assembly: &AssemblyChains) -> Result<char, StepError> {
        complex
            .principal_role()
            .and_then(|role| complex.chain_for(assembly, role))
            .ok_or_else(|| {
                StepError::new(
                    ErrorKind::NoSplitComplexes,
                    format!("assembly {} has no principal chain", assembly.id),
                )
            })
    }

    /// The complex facet with at least one assembly.
    fn split_complex(&self, pdb_code: &str) -> Result<ComplexTypeFacet, StepError> {
        let complex: ComplexTypeFacet =
            self.require(pdb_code, Facet::ComplexType, ErrorKind::NoSplitComplexes)?;
        if complex.assemblies.is_empty() {
            return Err(StepError::new(
                ErrorKind::NoSplitComplexes,
                format!("'{}' was not split into assemblies", pdb_code),
            ));
        }
        Ok(complex)
    }

    fn aligned_assemblies(
        &self,
        pdb_code: &str,
    ) -> Result<Vec<(AssemblyChains, AlignedAssembly)>, StepError> {
        let complex = self.split_complex(pdb_code)?;
        let aligned: AlignedFacet =
            self.require(pdb_code, Facet::Aligned, ErrorKind::MissingAlignedStructure)?;
        complex
            .assemblies
            .into_iter()
            .map(|assembly| {
                let entry = aligned.assemblies.get(&assembly.id).cloned().ok_or_else(|| {
                    StepError::new(
                        ErrorKind::MissingAlignedStructure,
                        format!("assembly {} has no aligned structure", assembly.id),
                    )
                })?;
                Ok::<_, StepError>((assembly, entry))
            })
            .collect()
    }

    // --- Steps ---

    fn initialise(
        &self,
        pdb_code: &str,
        force: bool,
        tx: &mut RecordTransaction<'a>,
    ) -> Result<Value, StepError> {
        if !force {
            if let Some(core) = self.facet::<CoreFacet>(pdb_code, Facet::Core)? {
                debug!("Record already initialised; nothing written.");
                return serde_json::to_value(&core)
                    .map_err(|e| StepError::new(ErrorKind::StoreFailure, e.to_string()));
            }
        }
        let now = timestamp();
        let core = CoreFacet {
            pdb_code: pdb_code.to_string(),
            created: now.clone(),
            last_updated: now,
        };
        self.stage_facet(tx, pdb_code, Facet::Core, &core)
    }

    fn fetch(&self, pdb_code: &str, force: bool, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        if !force {
            if let Some(existing) = self.facet::<SourceFacet>(pdb_code, Facet::Source)? {
                if self.store.exists(&existing.file_key)? {
                    debug!("Structure already fetched; nothing written.");
                    return serde_json::to_value(&existing)
                        .map_err(|e| StepError::new(ErrorKind::StoreFailure, e.to_string()));
                }
            }
        }

        // 1. Raw coordinates, checked to parse before anything is stored.
        let text = self.source.fetch(pdb_code)?;
        let (_, metadata) = PdbFile::read_from_str(&text)?;

        // 2. Descriptive metadata, with optional publication enrichment.
        let mut info = self.source.get_info(pdb_code)?;
        if info.publication.is_none() {
            if let Some(publications) = self.publications {
                match publications.publication(pdb_code) {
                    Ok(publication) => info.publication = publication,
                    Err(e) => warn!(error = %e, "Publication lookup failed; continuing without it."),
                }
            }
        }

        let file_key = self.keys.file_key("raw", pdb_code);
        tx.stage(file_key.as_str(), text.into_bytes());
        let facet = SourceFacet {
            assembly_count: info.assembly_count.unwrap_or(metadata.assembly_count).max(1),
            info,
            file_key,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::Source, &facet)
    }

    fn assign_chains(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let (system, metadata) = self.load_structure(pdb_code)?;
        let classifier = ChainClassifier::new(&self.catalogues.chains, self.config.peptide_length_cutoff);
        let mut builder = AssignmentBuilder::new(&classifier);
        add_polymer_chains(&mut builder, &system, &metadata.molecules);

        let unassigned: Vec<char> = builder
            .unassigned()
            .flat_map(|group| group.chain_ids.iter().copied())
            .collect();
        if !unassigned.is_empty() {
            return Err(StepError::new(
                ErrorKind::UnmatchedChain,
                format!("no role matches chain(s) {:?}", unassigned),
            )
            .with_detail(serde_json::json!({ "chain_ids": unassigned })));
        }

        let facet = builder.build(timestamp());
        if facet.chains.is_empty() {
            return Err(StepError::new(
                ErrorKind::UnassignedChains,
                format!("'{}' has no polymer chains", pdb_code),
            ));
        }
        info!(groups = facet.chains.len(), "Assigned chain roles.");
        self.stage_facet(tx, pdb_code, Facet::Chains, &facet)
    }

    fn cluster_alike_chains(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let chains: ChainsFacet = self.require(pdb_code, Facet::Chains, ErrorKind::UnassignedChains)?;
        let source: SourceFacet =
            self.require(pdb_code, Facet::Source, ErrorKind::UnableToLoadStructure)?;

        let (facet, discarded) =
            ClusterBuilder::from_chains_facet(&chains, source.assembly_count).build_facet(timestamp());
        if facet.clusters.is_empty() {
            return Err(StepError::new(
                ErrorKind::NoAlikeChains,
                format!(
                    "no chain group matches the assembly count of {} ({} discarded)",
                    source.assembly_count, discarded
                ),
            ));
        }
        self.stage_facet(tx, pdb_code, Facet::AlikeChains, &facet)
    }

    fn assign_complex_type(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let chains: ChainsFacet = self.require(pdb_code, Facet::Chains, ErrorKind::UnassignedChains)?;
        let alike: AlikeChainsFacet =
            self.require(pdb_code, Facet::AlikeChains, ErrorKind::NoAlikeChains)?;

        let roles = cluster_roles(&chains, &alike)?;
        let matcher =
            ComplexTypeMatcher::new(&self.catalogues.complexes, self.config.possible_complex_threshold);
        let complex = match matcher.match_roles(&roles, alike.clusters.len())? {
            ComplexMatch::Exact(complex) => complex,
            ComplexMatch::Possible(candidates) => {
                let detail = serde_json::to_value(&candidates)
                    .map_err(|e| StepError::new(ErrorKind::StoreFailure, e.to_string()))?;
                return Err(StepError::new(
                    ErrorKind::UnableToMatchComplexTypeExactly,
                    format!("{} possible complex type(s) for roles {:?}", candidates.len(), roles),
                )
                .with_detail(detail));
            }
        };

        let assemblies = split_assemblies(&chains, &alike, complex)?;
        let facet = ComplexTypeFacet {
            label: complex.label.clone(),
            slug: complex.slug.clone(),
            components: complex.components.clone(),
            chain_count: complex.chain_count,
            confidence: 1.0,
            assemblies,
            last_updated: timestamp(),
        };

        let sets = ItemSetStore::new(tx.store(), self.keys.clone());
        let set = sets.prepare_create_or_update(
            COMPLEX_TYPE_CONTEXT,
            &complex.slug,
            &complex.label,
            &format!("Structures classified as {}", complex.label),
            &[pdb_code.to_string()],
        )?;
        tx.stage_json(sets.key(COMPLEX_TYPE_CONTEXT, &complex.slug), &set)?;

        info!(complex_type = %complex.slug, "Assigned complex type.");
        self.stage_facet(tx, pdb_code, Facet::ComplexType, &facet)
    }

    fn match_allele(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let complex = self.split_complex(pdb_code)?;
        let chains: ChainsFacet = self.require(pdb_code, Facet::Chains, ErrorKind::UnassignedChains)?;

        let chain_id = Self::principal_chain(&complex, &complex.assemblies[0])?;
        let assignment = chains.assignment_for(chain_id).ok_or_else(|| {
            StepError::new(
                ErrorKind::NoMatchPossible,
                format!("principal chain '{}' has no assignment", chain_id),
            )
        })?;
        let first_residue = assignment.first_residue(chain_id).unwrap_or(1);

        let outcome = AlleleMatcher::new(&self.catalogues.alleles, self.config)
            .match_sequence(&assignment.sequence, first_residue);
        for kind in &outcome.failed_tiers {
            debug!(%kind, "Allele tier failed.");
        }
        let Some(matched) = outcome.matched.clone() else {
            return Err(StepError::new(
                outcome.failure_kind(),
                format!("no allele matches chain '{}'", chain_id),
            )
            .with_detail(serde_json::json!({ "failed_tiers": outcome.failed_tiers })));
        };

        info!(allele = %matched.allele, tier = matched.tier, "Matched allele.");
        let facet = AlleleMatchFacet {
            chain_id,
            matched,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::AlleleMatch, &facet)
    }

    fn align(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let complex = self.split_complex(pdb_code)?;
        let (canonical, _) = self.load_coordinates(
            &self.keys.canonical_key(&self.config.canonical_class),
            ErrorKind::MissingCanonicalStructure,
        )?;
        let (system, _) = self.load_structure(pdb_code)?;
        let window = &self.config.alignment_window;

        let mut assemblies = BTreeMap::new();
        for assembly in &complex.assemblies {
            let chain_id = Self::principal_chain(&complex, assembly)?;
            let result = align(&system, &canonical, chain_id, self.config.canonical_chain, window)?;

            let chain_ids: Vec<char> = assembly.chains.values().copied().collect();
            let aligned = result.aligned.extract(&chain_ids, |_| true);
            let file_key = self.keys.file_key("aligned", &format!("{}_{}", pdb_code, assembly.id));
            Self::stage_coordinates(tx, &file_key, &aligned)?;

            debug!(assembly = assembly.id, rmsd = result.rmsd, "Aligned assembly.");
            assemblies.insert(
                assembly.id,
                AlignedAssembly {
                    aligned_on: self.config.canonical_class.clone(),
                    aligned_chain: chain_id,
                    rmsd: result.rmsd,
                    start: *window.start(),
                    end: *window.end(),
                    atom_count: result.atom_count,
                    file_key,
                },
            );
        }

        let facet = AlignedFacet {
            assemblies,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::Aligned, &facet)
    }

    fn extract_peptide(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let complex = self.split_complex(pdb_code)?;
        let mut assemblies = BTreeMap::new();
        for (assembly, aligned) in self.aligned_assemblies(pdb_code)? {
            let peptide_chain = Self::peptide_chain(&complex, &assembly)?;
            let (system, _) = self.load_coordinates(&aligned.file_key, ErrorKind::MissingAlignedStructure)?;
            let models = extract_peptide(&system, peptide_chain)?;

            let name = format!("{}_{}", pdb_code, assembly.id);
            let peptide_and_hetatoms_key = self.keys.file_key("peptide_and_hetatoms", &name);
            let peptide_key = self.keys.file_key("peptide", &name);
            Self::stage_coordinates(tx, &peptide_and_hetatoms_key, &models.with_hetero)?;
            Self::stage_coordinates(tx, &peptide_key, &models.peptide_only)?;

            assemblies.insert(
                assembly.id,
                PeptideStructure {
                    peptide_chain,
                    peptide_and_hetatoms_key,
                    peptide_key,
                    hetero_residues: models.hetero_residues,
                },
            );
        }

        let facet = PeptideStructuresFacet {
            assemblies,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::PeptideStructures, &facet)
    }

    fn find_contacts(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let complex = self.split_complex(pdb_code)?;
        let mut assemblies = BTreeMap::new();
        for (assembly, aligned) in self.aligned_assemblies(pdb_code)? {
            let peptide_chain = Self::peptide_chain(&complex, &assembly)?;
            let receptor_chain = Self::principal_chain(&complex, &assembly)?;
            let (system, _) = self.load_coordinates(&aligned.file_key, ErrorKind::MissingAlignedStructure)?;
            let map = find_contacts(&system, peptide_chain, receptor_chain, self.config.contact_cutoff)?;
            assemblies.insert(assembly.id, map);
        }

        let facet = PeptideNeighboursFacet {
            assemblies,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::PeptideNeighbours, &facet)
    }

    fn derive_features(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let neighbours: PeptideNeighboursFacet =
            self.require(pdb_code, Facet::PeptideNeighbours, ErrorKind::NoNeighbourInfo)?;
        let chains: ChainsFacet = self.require(pdb_code, Facet::Chains, ErrorKind::UnassignedChains)?;
        if neighbours.assemblies.is_empty() {
            return Err(StepError::new(
                ErrorKind::NoNeighbourInfo,
                format!("'{}' has no contact maps", pdb_code),
            ));
        }

        let mut assemblies = BTreeMap::new();
        for (&id, map) in &neighbours.assemblies {
            let sequence = chains
                .assignment_for(map.peptide_chain)
                .map(|a| a.sequence.as_str())
                .ok_or_else(|| {
                    StepError::new(
                        ErrorKind::NoPeptideChainIds,
                        format!("peptide chain '{}' has no assignment", map.peptide_chain),
                    )
                })?;
            assemblies.insert(id, derive_features(sequence, map, self.config.exposure_limit));
        }

        self.stage_feature_sets(tx, pdb_code, &assemblies)?;
        let facet = PeptideFeaturesFacet {
            assemblies,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::PeptideFeatures, &facet)
    }

    /// Adds the structure to each feature set it qualifies for, and takes it
    /// out of the ones it no longer does.
    fn stage_feature_sets(
        &self,
        tx: &mut RecordTransaction<'a>,
        pdb_code: &str,
        assemblies: &BTreeMap<usize, PeptideFeatures>,
    ) -> Result<(), StepError> {
        let any = |f: fn(&PeptideFeatures) -> bool| assemblies.values().any(f);
        let flags = [
            any(|f| f.n_terminal_extension),
            any(|f| f.c_terminal_extension),
            any(|f| f.n_terminal_extension || f.c_terminal_extension),
            any(|f| f.exposed_bulge),
        ];

        let sets = ItemSetStore::new(tx.store(), self.keys.clone());
        let member = [pdb_code.to_string()];
        for ((slug, title, description), flag) in FEATURE_SETS.iter().zip(flags) {
            let key = sets.key(FEATURES_CONTEXT, slug);
            if flag {
                let set = sets.prepare_create_or_update(FEATURES_CONTEXT, slug, title, description, &member)?;
                tx.stage_json(key, &set)?;
            } else if let Some(mut set) = sets.get(FEATURES_CONTEXT, slug)? {
                if set.remove_members(&member) > 0 {
                    set.last_updated = Some(timestamp());
                    tx.stage_json(key, &set)?;
                }
            }
        }
        Ok(())
    }

    fn measure_angles(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let complex = self.split_complex(pdb_code)?;
        let mut assemblies = BTreeMap::new();
        for (assembly, aligned) in self.aligned_assemblies(pdb_code)? {
            let receptor_chain = Self::principal_chain(&complex, &assembly)?;
            let (system, _) = self.load_coordinates(&aligned.file_key, ErrorKind::MissingAlignedStructure)?;
            let angles = measure_angles(&system, receptor_chain, self.config.cleft_residue_limit)?;
            assemblies.insert(assembly.id, angles);
        }

        let facet = CleftAnglesFacet {
            assemblies,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::CleftAngles, &facet)
    }

    fn extract_binding_domain(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let complex = self.split_complex(pdb_code)?;
        let mut assemblies = BTreeMap::new();
        for (assembly, aligned) in self.aligned_assemblies(pdb_code)? {
            let chain_id = Self::principal_chain(&complex, &assembly)?;
            let (system, _) = self.load_coordinates(&aligned.file_key, ErrorKind::MissingAlignedStructure)?;
            let models = extract_binding_domain(&system, chain_id, &BINDING_DOMAIN)?;

            let name = format!("{}_{}", pdb_code, assembly.id);
            let chain_and_hetatoms_key = self.keys.file_key("receptor_and_hetatoms", &name);
            let chain_key = self.keys.file_key("receptor", &name);
            let binding_domain_key = self.keys.file_key("binding_domain", &name);
            Self::stage_coordinates(tx, &chain_and_hetatoms_key, &models.chain_and_hetero)?;
            Self::stage_coordinates(tx, &chain_key, &models.chain_only)?;
            Self::stage_coordinates(tx, &binding_domain_key, &models.binding_domain)?;

            assemblies.insert(
                assembly.id,
                BindingDomainStructure {
                    chain_id,
                    chain_and_hetatoms_key,
                    chain_key,
                    binding_domain_key,
                    start: *BINDING_DOMAIN.start(),
                    end: *BINDING_DOMAIN.end(),
                    residue_count: models.residue_count,
                },
            );
        }

        let facet = BindingDomainStructuresFacet {
            assemblies,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::BindingDomainStructures, &facet)
    }

    fn measure_distances(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let complex = self.split_complex(pdb_code)?;
        let mut assemblies = BTreeMap::new();
        for (assembly, aligned) in self.aligned_assemblies(pdb_code)? {
            let peptide_chain = Self::peptide_chain(&complex, &assembly)?;
            let receptor_chain = Self::principal_chain(&complex, &assembly)?;
            let (system, _) = self.load_coordinates(&aligned.file_key, ErrorKind::MissingAlignedStructure)?;
            let distances = measure_distances(&system, peptide_chain, receptor_chain)?;
            assemblies.insert(assembly.id, distances);
        }

        let facet = CAlphaDistancesFacet {
            assemblies,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::CAlphaDistances, &facet)
    }

    fn measure_peptide_angles(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let structures: PeptideStructuresFacet =
            self.require(pdb_code, Facet::PeptideStructures, ErrorKind::NoPeptideStructures)?;
        if structures.assemblies.is_empty() {
            return Err(StepError::new(
                ErrorKind::NoPeptideStructures,
                format!("'{}' has no extracted peptides", pdb_code),
            ));
        }

        let mut assemblies = BTreeMap::new();
        for (&id, structure) in &structures.assemblies {
            let (system, _) = self.load_coordinates(&structure.peptide_key, ErrorKind::NoPeptideStructures)?;
            assemblies.insert(id, measure_peptide_angles(&system, structure.peptide_chain)?);
        }

        let facet = PeptideAnglesFacet {
            assemblies,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::PeptideAngles, &facet)
    }

    fn map_pockets(&self, pdb_code: &str, tx: &mut RecordTransaction<'a>) -> Result<Value, StepError> {
        let source: SourceFacet =
            self.require(pdb_code, Facet::Source, ErrorKind::UnableToLoadStructure)?;
        let chains: ChainsFacet = self.require(pdb_code, Facet::Chains, ErrorKind::UnassignedChains)?;

        let organism = direct_mapping_organism(source.info.organism.as_ref())?;
        let assignment = chains.first_with_role(POCKET_ROLE).ok_or_else(|| {
            StepError::new(
                ErrorKind::NoSequence,
                format!("'{}' has no {} chain", pdb_code, POCKET_ROLE),
            )
        })?;
        let chain_id = assignment.chain_ids.first().copied().ok_or_else(|| {
            StepError::new(ErrorKind::NoSequence, format!("{} assignment lists no chains", POCKET_ROLE))
        })?;
        let first_residue = assignment.first_residue(chain_id).unwrap_or(1);
        let pockets = map_pockets(&assignment.sequence, first_residue)?;

        debug!(%organism, chain = %chain_id, "Mapped cleft pockets.");
        let facet = PocketsFacet {
            organism,
            chain_id,
            role: POCKET_ROLE.to_string(),
            pockets,
            last_updated: timestamp(),
        };
        self.stage_facet(tx, pdb_code, Facet::Pockets, &facet)
    }
}
