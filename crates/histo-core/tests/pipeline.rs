use histo::core::catalogue::Catalogues;
use histo::core::io::pdb::PdbFile;
use histo::core::io::traits::MolecularFile;
use histo::core::models::atom::Atom;
use histo::core::models::chain::ChainType;
use histo::core::models::facets::{Facet, MatchType, Organism, PeptideNeighboursFacet, ResidueContact, StructureInfo};
use histo::core::models::system::MolecularSystem;
use histo::core::source::{DirectorySource, SourceError, StructureSource};
use histo::core::store::{
    FilesystemStore, ItemSetStore, JsonStoreExt, KeyProvider, MemoryStore, RecordStore,
};
use histo::engine::config::PipelineConfig;
use histo::engine::error::ErrorKind;
use histo::engine::progress::ProgressReporter;
use histo::workflows::{Pipeline, PipelineStep};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

const PDB_CODE: &str = "1hhk";
const PEPTIDE: &str = "SLYNTVATL";
const HEADER: &str = "SOURCE   2 ORGANISM_SCIENTIFIC: HOMO SAPIENS;\n";

fn one_to_three(code: char) -> &'static str {
    match code {
        'A' => "ALA", 'R' => "ARG", 'N' => "ASN", 'D' => "ASP", 'C' => "CYS",
        'Q' => "GLN", 'E' => "GLU", 'G' => "GLY", 'H' => "HIS", 'I' => "ILE",
        'L' => "LEU", 'K' => "LYS", 'M' => "MET", 'F' => "PHE", 'P' => "PRO",
        'S' => "SER", 'T' => "THR", 'W' => "TRP", 'Y' => "TYR", 'V' => "VAL",
        other => panic!("no residue for '{}'", other),
    }
}

/// Receptor CA positions: 10 Å apart along x, off-axis so the path is not
/// collinear.
fn receptor_ca(number: isize) -> Point3<f64> {
    let t = number as f64;
    Point3::new(10.0 * t, 5.0 * t.sin(), 5.0 * t.cos())
}

fn add_chain(
    system: &mut MolecularSystem,
    chain_id: char,
    sequence: &str,
    atoms: impl Fn(isize) -> Vec<(&'static str, Point3<f64>)>,
) {
    let chain = system.add_chain(chain_id, ChainType::Protein);
    for (index, code) in sequence.chars().enumerate() {
        let number = index as isize + 1;
        let residue = system
            .add_residue(chain, number, None, one_to_three(code), false)
            .unwrap();
        for (name, position) in atoms(number) {
            system.add_atom_to_residue(residue, Atom::new(name, residue, position));
        }
    }
}

/// A class I heavy chain, a beta-2-microglobulin and a nonamer whose first
/// residue sits in the pocket of receptor residues 7 and 171 and whose last
/// sits in the pocket of 116 and 143.
fn complex_pdb(heavy: &str, light: &str) -> String {
    let offset = Vector3::new(0.0, 2.0, 0.0);
    let mut system = MolecularSystem::new();
    add_chain(&mut system, 'A', heavy, |n| vec![("CA", receptor_ca(n))]);
    add_chain(&mut system, 'B', light, |n| {
        vec![("CA", Point3::new(10.0 * n as f64, 1000.0, 0.0))]
    });
    add_chain(&mut system, 'C', PEPTIDE, |n| match n {
        1 => vec![("N", receptor_ca(7) + offset), ("CA", receptor_ca(171) + offset)],
        9 => vec![("CA", receptor_ca(116) + offset), ("C", receptor_ca(143) + offset)],
        _ => vec![("CA", Point3::new(10.0 * n as f64, 500.0, 0.0))],
    });
    PdbFile::write_system_to_string(&system).unwrap()
}

struct Fixture {
    catalogues: Catalogues,
    heavy: String,
    light: String,
}

impl Fixture {
    fn new() -> Self {
        let catalogues = Catalogues::builtin().unwrap();
        let heavy = catalogues.alleles.alleles()[0].sequence[..275].to_string();
        let light = catalogues.chains.get("beta2m").unwrap().examples[0][..95].to_string();
        Self {
            catalogues,
            heavy,
            light,
        }
    }

    fn pdb(&self) -> String {
        complex_pdb(&self.heavy, &self.light)
    }
}

/// Serves fixed PDB text by code.
struct StaticSource {
    files: HashMap<String, String>,
}

impl StaticSource {
    fn with(pdb_code: &str, text: String) -> Self {
        Self {
            files: HashMap::from([(pdb_code.to_string(), text)]),
        }
    }

    fn with_all(pdb_codes: &[String], text: &str) -> Self {
        Self {
            files: pdb_codes
                .iter()
                .map(|code| (code.clone(), text.to_string()))
                .collect(),
        }
    }
}

impl StructureSource for StaticSource {
    fn fetch(&self, pdb_code: &str) -> Result<String, SourceError> {
        self.files
            .get(pdb_code)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(pdb_code.to_string()))
    }

    fn get_info(&self, _pdb_code: &str) -> Result<StructureInfo, SourceError> {
        Ok(StructureInfo {
            title: Some("Synthetic class I complex".to_string()),
            organism: Some(Organism {
                scientific_name: Some("Homo sapiens".to_string()),
                common_name: Some("human".to_string()),
            }),
            assembly_count: Some(1),
            ..Default::default()
        })
    }
}

fn store_canonical(store: &dyn RecordStore, config: &PipelineConfig, text: &str) {
    let key = KeyProvider::new(&config.privacy).canonical_key(&config.canonical_class);
    store.put(&key, text.as_bytes()).unwrap();
}

#[test]
fn full_run_classifies_matches_and_finds_anchors() {
    let fixture = Fixture::new();
    let store = MemoryStore::new();
    let config = PipelineConfig::default();
    let source = StaticSource::with(PDB_CODE, fixture.pdb());
    store_canonical(&store, &config, &fixture.pdb());

    let pipeline = Pipeline::new(&store, &source, &fixture.catalogues, &config);
    let outcomes = pipeline.run_through(PDB_CODE, PipelineStep::Initialise);

    let failures: Vec<_> = outcomes.iter().filter(|o| !o.success).collect();
    assert!(failures.is_empty(), "failed steps: {:?}", failures);
    assert_eq!(outcomes.len(), PipelineStep::ALL.len());

    let record = pipeline.load_record(PDB_CODE).unwrap().unwrap();

    let chains = record.chains.as_ref().unwrap();
    let role_of = |id: char| chains.assignment_for(id).unwrap().role.clone();
    assert_eq!(role_of('A'), "class_i_alpha");
    assert_eq!(role_of('B'), "beta2m");
    assert_eq!(role_of('C'), "peptide");
    assert_eq!(chains.assignment_for('C').unwrap().confidence, 1.0);

    let classification = record.classification().unwrap();
    assert_eq!(classification.label, "MHC Class I with peptide");
    assert_eq!(classification.confidence, 1.0);

    let allele = &record.allele_match.as_ref().unwrap().matched;
    assert_eq!(allele.allele, "HLA-A*02:01");
    assert_eq!(allele.tier, 1);
    assert_eq!(allele.match_type, MatchType::Exact);

    let aligned = &record.aligned.as_ref().unwrap().assemblies[&1];
    assert_eq!(aligned.atom_count, 178);
    assert!(aligned.rmsd < 1e-3);

    let contacts = &record.peptide_neighbours.as_ref().unwrap().assemblies[&1];
    assert!(contacts.contact_count() > 0);
    assert!(contacts.is_symmetric());
    assert_eq!(contacts.receptor_positions(1), vec![7, 171]);
    assert_eq!(contacts.peptide.len(), PEPTIDE.len());

    let features = &record.peptide_features.as_ref().unwrap().assemblies[&1];
    assert_eq!(features.anchor_positions(), vec![1, 9]);
    assert!(!features.n_terminal_extension && !features.c_terminal_extension);
    assert!(features.exposed_bulge);

    let peptide = record.peptide();
    assert_eq!(peptide.sequence.as_deref(), Some(PEPTIDE));
    assert_eq!(peptide.length_class.as_deref(), Some("nonamer"));

    let angles = &record.cleft_angles.as_ref().unwrap().assemblies[&1];
    assert_eq!(angles.residues.len(), 179);
    assert!(angles.peptide_contacts.contains_key(&171));

    let sets = ItemSetStore::new(&store, KeyProvider::default());
    let complex_set = sets.get("complex_type", "class_i_with_peptide").unwrap().unwrap();
    assert_eq!(complex_set.members, vec![PDB_CODE.to_string()]);
    assert!(sets.get("features", "exposed_bulge").unwrap().unwrap().contains(PDB_CODE));
    assert!(!sets.exists("features", "extended").unwrap());

    let domain = &record.binding_domain_structures.as_ref().unwrap().assemblies[&1];
    assert_eq!(domain.chain_id, 'A');
    assert_eq!(domain.residue_count, 181);
    assert!(store.exists(&domain.binding_domain_key).unwrap());

    let distances = &record.c_alpha_distances.as_ref().unwrap().assemblies[&1];
    assert_eq!(distances.peptide.len(), PEPTIDE.len());
    let first = distances.peptide[&1].closest.as_ref().unwrap();
    assert_eq!(first.receptor_position, 171);
    assert!((first.distance - 2.0).abs() < 1e-3);

    let peptide_angles = &record.peptide_angles.as_ref().unwrap().assemblies[&1];
    assert_eq!(peptide_angles.chain_id, 'C');
    assert_eq!(peptide_angles.residues.len(), PEPTIDE.len());

    let pockets = record.pockets.as_ref().unwrap();
    assert_eq!(pockets.organism, "homo_sapiens");
    assert_eq!(pockets.chain_id, 'A');
    let b7 = &pockets.pockets["b"][0];
    assert_eq!((b7.position, b7.one_letter), (7, 'Y'));

    assert_eq!(record.facets_present().len(), Facet::ALL.len());
}

#[test]
fn rederiving_features_takes_the_structure_out_of_sets_it_left() {
    let fixture = Fixture::new();
    let store = MemoryStore::new();
    let config = PipelineConfig::default();
    let source = StaticSource::with(PDB_CODE, fixture.pdb());
    store_canonical(&store, &config, &fixture.pdb());

    let pipeline = Pipeline::new(&store, &source, &fixture.catalogues, &config);
    let outcomes = pipeline.run_through(PDB_CODE, PipelineStep::Initialise);
    assert!(outcomes.iter().all(|o| o.success), "{:?}", outcomes.last());

    let sets = ItemSetStore::new(&store, KeyProvider::default());
    assert!(sets.get("features", "exposed_bulge").unwrap().unwrap().contains(PDB_CODE));

    // Bury every interior position so the bulge disappears.
    let key = pipeline.keys().facet_key(PDB_CODE, Facet::PeptideNeighbours);
    let mut neighbours: PeptideNeighboursFacet = store.get_json(&key).unwrap().unwrap();
    let map = neighbours.assemblies.get_mut(&1).unwrap();
    for position in 2..PEPTIDE.len() {
        let contacts = map.peptide.get_mut(&position).unwrap();
        contacts.extend((0..4).map(|i| ResidueContact {
            residue: "ALA".to_string(),
            position: 150 + i,
        }));
    }
    store.put_json(&key, &neighbours).unwrap();

    let outcome = pipeline.run_step(PDB_CODE, PipelineStep::DeriveFeatures, false);
    assert!(outcome.success, "{:?}", outcome.errors);

    let record = pipeline.load_record(PDB_CODE).unwrap().unwrap();
    let features = &record.peptide_features.as_ref().unwrap().assemblies[&1];
    assert!(!features.exposed_bulge);

    let bulge = sets.get("features", "exposed_bulge").unwrap().unwrap();
    assert!(!bulge.contains(PDB_CODE));
    assert!(bulge.members.is_empty());
    assert!(bulge.last_updated.is_some());
    assert!(!sets.exists("features", "extended").unwrap());
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_batches_keep_every_code_in_shared_sets() {
    let fixture = Fixture::new();
    let output = tempfile::tempdir().unwrap();
    let store = FilesystemStore::new(output.path());
    let config = PipelineConfig::default();
    store_canonical(&store, &config, &fixture.pdb());

    let codes: Vec<String> = (0..24).map(|i| format!("{}x{:02}", i % 10, i)).collect();
    let source = StaticSource::with_all(&codes, &fixture.pdb());
    let pipeline = Pipeline::new(&store, &source, &fixture.catalogues, &config);
    let reporter = ProgressReporter::new();

    let pool = rayon::ThreadPoolBuilder::new().num_threads(8).build().unwrap();
    let through = PipelineStep::ALL
        .iter()
        .position(|&step| step == PipelineStep::DeriveFeatures)
        .unwrap();
    pool.install(|| {
        for &step in &PipelineStep::ALL[..=through] {
            let report = pipeline.run_batch(&codes, step, false, &reporter);
            assert!(report.success, "{} failed: {:?}", step, report.errors);
        }
    });

    let sets = ItemSetStore::new(&store, KeyProvider::default());
    let complex_set = sets.get("complex_type", "class_i_with_peptide").unwrap().unwrap();
    let bulge = sets.get("features", "exposed_bulge").unwrap().unwrap();
    for code in &codes {
        assert!(complex_set.contains(code), "{} missing from complex set", code);
        assert!(bulge.contains(code), "{} missing from bulge set", code);
    }
    assert_eq!(complex_set.members.len(), codes.len());
}

#[test]
fn failed_step_leaves_the_store_untouched() {
    let fixture = Fixture::new();
    let store = MemoryStore::new();
    let config = PipelineConfig::default();
    let source = StaticSource::with(PDB_CODE, fixture.pdb());
    let pipeline = Pipeline::new(&store, &source, &fixture.catalogues, &config);

    let outcome = pipeline.run_step(PDB_CODE, PipelineStep::AssignChains, false);
    assert!(!outcome.success);
    assert_eq!(outcome.error_kinds(), vec![ErrorKind::NotInitialised]);
    assert!(store.is_empty());

    for step in [
        PipelineStep::Initialise,
        PipelineStep::Fetch,
        PipelineStep::AssignChains,
        PipelineStep::ClusterAlikeChains,
        PipelineStep::AssignComplexType,
        PipelineStep::MatchAllele,
    ] {
        assert!(pipeline.run_step(PDB_CODE, step, false).success, "{} failed", step);
    }

    // No canonical structure stored yet.
    let keys_before = store.list("").unwrap();
    let outcome = pipeline.run_step(PDB_CODE, PipelineStep::Align, false);
    assert_eq!(outcome.error_kinds(), vec![ErrorKind::MissingCanonicalStructure]);
    assert!(outcome.facet.is_none());
    assert_eq!(store.list("").unwrap(), keys_before);

    let outcome = pipeline.run_step(PDB_CODE, PipelineStep::FindContacts, false);
    assert_eq!(outcome.error_kinds(), vec![ErrorKind::MissingAlignedStructure]);
}

#[test]
fn unrecognised_chain_fails_chain_assignment() {
    let fixture = Fixture::new();
    let store = MemoryStore::new();
    let config = PipelineConfig::default();
    let unknown = "W".repeat(120);
    let source = StaticSource::with(PDB_CODE, complex_pdb(&fixture.heavy, &unknown));
    let pipeline = Pipeline::new(&store, &source, &fixture.catalogues, &config);

    let outcomes = pipeline.run_through(PDB_CODE, PipelineStep::Initialise);
    let last = outcomes.last().unwrap();
    assert_eq!(last.step, PipelineStep::AssignChains);
    assert_eq!(last.error_kinds(), vec![ErrorKind::UnmatchedChain]);
    assert_eq!(last.errors[0].pdb_code, PDB_CODE);

    let record = pipeline.load_record(PDB_CODE).unwrap().unwrap();
    assert!(record.chains.is_none());
}

#[test]
fn initialise_without_force_keeps_the_existing_record() {
    let fixture = Fixture::new();
    let store = MemoryStore::new();
    let config = PipelineConfig::default();
    let source = StaticSource::with(PDB_CODE, fixture.pdb());
    let pipeline = Pipeline::new(&store, &source, &fixture.catalogues, &config);

    let first = pipeline.run_step("1HHK ", PipelineStep::Initialise, false);
    assert_eq!(first.pdb_code, PDB_CODE);
    let again = pipeline.run_step(PDB_CODE, PipelineStep::Initialise, false);
    assert_eq!(first.facet, again.facet);
}

#[test]
fn batch_aggregates_failures_by_kind() {
    let fixture = Fixture::new();
    let store = MemoryStore::new();
    let config = PipelineConfig::default();
    let source = StaticSource::with(PDB_CODE, fixture.pdb());
    let pipeline = Pipeline::new(&store, &source, &fixture.catalogues, &config);

    let sets = ItemSetStore::new(&store, KeyProvider::default());
    let members = vec![PDB_CODE.to_string(), "2xyz".to_string(), "3abc".to_string()];
    sets.create("curation", "batch", "Batch", "", &members).unwrap();

    let reporter = ProgressReporter::new();
    let report = pipeline
        .run_item_set("curation", "batch", PipelineStep::Initialise, false, &reporter)
        .unwrap();
    assert!(report.success);
    assert_eq!(report.success_count, 3);

    let report = pipeline
        .run_item_set("curation", "batch", PipelineStep::Fetch, false, &reporter)
        .unwrap();
    assert_eq!(report.item_count, 3);
    assert_eq!(report.success_count, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, ErrorKind::SourceFailure);
    assert_eq!(report.errors[0].count, 2);
    assert_eq!(report.next, Some(PipelineStep::AssignChains));

    assert!(
        pipeline
            .run_item_set("curation", "missing", PipelineStep::Fetch, false, &reporter)
            .is_err()
    );
}

#[test]
fn filesystem_store_and_directory_source_run_end_to_end() {
    let fixture = Fixture::new();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let text = format!("{}{}", HEADER, fixture.pdb());
    std::fs::write(input.path().join(format!("{}.pdb", PDB_CODE)), text).unwrap();

    let store = FilesystemStore::new(output.path());
    let source = DirectorySource::new(input.path());
    let config = PipelineConfig::default();
    store_canonical(&store, &config, &fixture.pdb());

    let pipeline = Pipeline::new(&store, &source, &fixture.catalogues, &config).with_publications(&source);
    let outcomes = pipeline.run_through(PDB_CODE, PipelineStep::Initialise);
    assert!(outcomes.iter().all(|o| o.success), "{:?}", outcomes.last());

    let aligned_file = output
        .path()
        .join("structures/files/public/aligned/1hhk_1.pdb");
    assert!(aligned_file.is_file());
    let peptide_file = output
        .path()
        .join("structures/files/public/peptide/1hhk_1.pdb");
    let (peptide, _) = PdbFile::read_from_path(&peptide_file).unwrap();
    assert_eq!(peptide.chain_ids(), vec!['C']);

    let domain_file = output
        .path()
        .join("structures/files/public/binding_domain/1hhk_1.pdb");
    let (domain, _) = PdbFile::read_from_path(&domain_file).unwrap();
    assert_eq!(domain.chain_ids(), vec!['A']);

    let record = pipeline.load_record(PDB_CODE).unwrap().unwrap();
    assert_eq!(record.pockets.unwrap().organism, "homo_sapiens");
}
