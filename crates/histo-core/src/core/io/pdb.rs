use crate::core::io::traits::MolecularFile;
use crate::core::models::builder::{AtomRecord, MolecularSystemBuilder};
use crate::core::models::chain::ChainType;
use crate::core::models::system::MolecularSystem;
use nalgebra::Point3;
use std::collections::{BTreeMap, HashSet};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Header information recovered from a PDB file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    /// Non-coordinate lines, verbatim, in file order.
    pub header_lines: Vec<String>,
    pub id_code: Option<String>,
    pub title: Option<String>,
    pub resolution: Option<f64>,
    pub organism_scientific: Option<String>,
    /// Highest `REMARK 350 BIOMOLECULE` number, or 1 when absent.
    pub assembly_count: usize,
    /// `COMPND` molecule names keyed by chain id, lower-cased.
    pub molecules: BTreeMap<char, String>,
    pending_molecule: Option<String>,
}

impl PdbMetadata {
    pub fn molecule_name(&self, chain_id: char) -> Option<&str> {
        self.molecules.get(&chain_id).map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| *c != ' ')
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_optional_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    default: f64,
) -> Result<f64, PdbError> {
    if slice_and_trim(line, start, end).is_empty() {
        Ok(default)
    } else {
        parse_float(line, line_num, start, end)
    }
}

pub struct PdbFile;

impl PdbFile {
    fn read_header_line(record_type: &str, line: &str, metadata: &mut PdbMetadata) {
        match record_type {
            "HEADER" => {
                let code = slice_and_trim(line, 62, 66);
                if !code.is_empty() {
                    metadata.id_code = Some(code.to_ascii_lowercase());
                }
            }
            "TITLE" => {
                let part = slice_and_trim(line, 10, 80);
                match &mut metadata.title {
                    Some(title) => {
                        title.push(' ');
                        title.push_str(part);
                    }
                    None => metadata.title = Some(part.to_string()),
                }
            }
            "COMPND" => {
                let text = line.get(10..).unwrap_or("").trim().trim_end_matches(';');
                if let Some(name) = text.strip_prefix("MOLECULE:") {
                    metadata.pending_molecule = Some(name.trim().to_ascii_lowercase());
                } else if let Some(chains) = text.strip_prefix("CHAIN:") {
                    if let Some(name) = metadata.pending_molecule.take() {
                        for id in chains.split(',').filter_map(|c| c.trim().chars().next()) {
                            metadata.molecules.insert(id, name.clone());
                        }
                    }
                }
            }
            "SOURCE" if metadata.organism_scientific.is_none() => {
                if let Some((_, rest)) = line.split_once("ORGANISM_SCIENTIFIC:") {
                    let name = rest.trim().trim_end_matches(';').trim();
                    if !name.is_empty() {
                        metadata.organism_scientific = Some(name.to_string());
                    }
                }
            }
            "REMARK" => {
                let remark_number = slice_and_trim(line, 6, 10);
                let text = line.get(10..).unwrap_or("").trim();
                if remark_number == "2" {
                    if let Some(rest) = text.strip_prefix("RESOLUTION.") {
                        metadata.resolution = rest
                            .split_whitespace()
                            .next()
                            .and_then(|v| v.parse().ok());
                    }
                } else if remark_number == "350" {
                    if let Some(rest) = text.strip_prefix("BIOMOLECULE:") {
                        if let Ok(n) = rest.trim().parse::<usize>() {
                            metadata.assembly_count = metadata.assembly_count.max(n);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn format_atom_name(name: &str, element: &str) -> String {
        if name.len() >= 4 {
            name.chars().take(4).collect()
        } else if element.len() <= 1 {
            format!(" {:<3}", name)
        } else {
            format!("{:<4}", name)
        }
    }
}

impl MolecularFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(
        reader: &mut impl BufRead,
    ) -> Result<(MolecularSystem, Self::Metadata), Self::Error> {
        let mut builder = MolecularSystemBuilder::new();
        let mut metadata = PdbMetadata::default();
        let mut atom_count = 0usize;
        let mut seen_alternates: HashSet<(char, isize, Option<char>, String)> = HashSet::new();

        let mut current_chain: Option<char> = None;
        let mut current_residue: Option<(isize, Option<char>)> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }
                    let is_hetero = record_type == "HETATM";

                    let serial_str = slice_and_trim(&line, 6, 11);
                    let name = slice_and_trim(&line, 12, 16);
                    let alt_loc = column_char(&line, 16);
                    let res_name = slice_and_trim(&line, 17, 20);
                    let chain_id = column_char(&line, 21).unwrap_or('A');
                    let res_seq_str = slice_and_trim(&line, 22, 26);
                    let insertion_code = column_char(&line, 26);
                    let element = slice_and_trim(&line, 76, 78);

                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    // Large files overflow the serial field; fall back to a running count.
                    let serial = serial_str.parse::<usize>().unwrap_or(atom_count + 1);
                    let res_seq: isize = res_seq_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "23-26".into(),
                            value: res_seq_str.into(),
                        },
                    })?;

                    if alt_loc.is_some()
                        && !seen_alternates.insert((
                            chain_id,
                            res_seq,
                            insertion_code,
                            name.to_string(),
                        ))
                    {
                        continue;
                    }

                    let x = parse_float(&line, line_num, 30, 38)?;
                    let y = parse_float(&line, line_num, 38, 46)?;
                    let z = parse_float(&line, line_num, 46, 54)?;
                    let occupancy = parse_optional_float(&line, line_num, 54, 60, 1.0)?;
                    let b_factor = parse_optional_float(&line, line_num, 60, 66, 0.0)?;

                    if current_chain != Some(chain_id) {
                        let chain_type = match (is_hetero, res_name) {
                            (false, _) => ChainType::Protein,
                            (true, "HOH") => ChainType::Water,
                            (true, _) => ChainType::Ligand,
                        };
                        builder.start_chain(chain_id, chain_type);
                        current_chain = Some(chain_id);
                        current_residue = None;
                    }
                    if current_residue != Some((res_seq, insertion_code)) {
                        builder
                            .start_residue(res_seq, insertion_code, res_name, is_hetero)
                            .ok_or_else(|| {
                                PdbError::Inconsistency(format!(
                                    "Residue {} on line {} has no chain",
                                    res_seq, line_num
                                ))
                            })?;
                        current_residue = Some((res_seq, insertion_code));
                    }
                    builder
                        .add_atom(AtomRecord {
                            serial,
                            name,
                            element,
                            position: Point3::new(x, y, z),
                            occupancy,
                            b_factor,
                        })
                        .ok_or_else(|| {
                            PdbError::Inconsistency(format!(
                                "Atom on line {} has no residue",
                                line_num
                            ))
                        })?;
                    atom_count += 1;
                }
                "TER" | "ANISOU" | "CONECT" | "MASTER" | "MODEL" => {}
                // Only the first model of multi-model files is read.
                "ENDMDL" | "END" => break,
                _ => {
                    if !line.trim().is_empty() {
                        Self::read_header_line(record_type, &line, &mut metadata);
                        metadata.header_lines.push(line.clone());
                    }
                }
            }
        }

        if atom_count == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        metadata.assembly_count = metadata.assembly_count.max(1);
        Ok((builder.build(), metadata))
    }

    fn write_to(
        system: &MolecularSystem,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in &metadata.header_lines {
            writeln!(writer, "{}", line)?;
        }

        let mut serial = 0usize;
        for (_, chain) in system.chains_iter() {
            let mut wrote_polymer = false;
            for residue in chain
                .residues()
                .iter()
                .filter_map(|&id| system.residue(id))
            {
                let record_type = if residue.is_hetero { "HETATM" } else { "ATOM" };
                for atom in residue.atoms().iter().filter_map(|&id| system.atom(id)) {
                    serial += 1;
                    writeln!(
                        writer,
                        "{:<6}{:>5} {:<4} {:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                        record_type,
                        serial % 100_000,
                        Self::format_atom_name(&atom.name, &atom.element),
                        residue.name,
                        chain.id,
                        residue.id,
                        residue.insertion_code.unwrap_or(' '),
                        atom.position.x,
                        atom.position.y,
                        atom.position.z,
                        atom.occupancy,
                        atom.b_factor,
                        atom.element,
                    )?;
                }
                wrote_polymer |= !residue.is_hetero;
            }
            if wrote_polymer {
                writeln!(writer, "TER")?;
            }
        }

        writeln!(writer, "END")?;
        Ok(())
    }

    fn write_system_to(
        system: &MolecularSystem,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let default_metadata = PdbMetadata {
            header_lines: vec!["REMARK   1 GENERATED BY HISTO".to_string()],
            ..Default::default()
        };
        Self::write_to(system, &default_metadata, writer)
    }
}
