use phf::{Map, Set, phf_map, phf_set};

static THREE_TO_ONE: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
};

static ONE_TO_THREE: Map<char, &'static str> = phf_map! {
    'A' => "ALA", 'R' => "ARG", 'N' => "ASN", 'D' => "ASP", 'C' => "CYS",
    'Q' => "GLN", 'E' => "GLU", 'G' => "GLY", 'H' => "HIS", 'I' => "ILE",
    'L' => "LEU", 'K' => "LYS", 'M' => "MET", 'F' => "PHE", 'P' => "PRO",
    'S' => "SER", 'T' => "THR", 'W' => "TRP", 'Y' => "TYR", 'V' => "VAL",
};

// Ions, water and crystallisation additives that are never ligands of interest.
static EXCLUDED_HETERO: Set<&'static str> = phf_set! {
    "CA", "CD", "CL", "CO", "CU", "MG", "NA", "NI", "ZN",
    "15P", "2LJ", "ACT", "EDO", "FME", "FMT", "FUC", "GOL", "HOH", "IOD",
    "MAN", "NAG", "P4G", "P6G", "PEG", "PG4", "Q81", "S04", "SEP", "SO4",
};

static CHI1_GAMMA_ATOMS: Map<&'static str, &'static str> = phf_map! {
    "ARG" => "CG", "ASN" => "CG", "ASP" => "CG", "CYS" => "SG", "GLN" => "CG",
    "GLU" => "CG", "HIS" => "CG", "ILE" => "CG1", "LEU" => "CG", "LYS" => "CG",
    "MET" => "CG", "PHE" => "CG", "PRO" => "CG", "SER" => "OG", "THR" => "OG1",
    "TRP" => "CG", "TYR" => "CG", "VAL" => "CG1",
};

/// One-letter code for a natural amino acid three-letter name.
pub fn three_to_one(residue_name: &str) -> Option<char> {
    THREE_TO_ONE
        .get(residue_name.trim().to_ascii_uppercase().as_str())
        .copied()
}

pub fn one_to_three(code: char) -> Option<&'static str> {
    ONE_TO_THREE.get(&code.to_ascii_uppercase()).copied()
}

pub fn is_excluded_hetero(residue_name: &str) -> bool {
    EXCLUDED_HETERO.contains(residue_name.trim().to_ascii_uppercase().as_str())
}

/// The gamma atom defining chi1, `None` for alanine and glycine.
pub fn chi1_gamma_atom(residue_name: &str) -> Option<&'static str> {
    CHI1_GAMMA_ATOMS
        .get(residue_name.trim().to_ascii_uppercase().as_str())
        .copied()
}

pub fn is_heavy_atom(atom_name: &str) -> bool {
    let first_char = atom_name
        .trim()
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase());
    !matches!(first_char, Some('H') | Some('D'))
}
