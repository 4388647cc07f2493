use crate::core::models::facets::{Organism, PocketResidue};
use crate::core::store::itemset::slugify;
use crate::core::utils::identifiers::one_to_three;
use crate::engine::error::{ErrorKind, StepError};
use phf::{Set, phf_set};
use std::collections::BTreeMap;
use tracing::instrument;

/// Chain role whose sequence the pockets are read from.
pub const POCKET_ROLE: &str = "class_i_alpha";

/// Heavy-chain positions lining pockets A to F of the class I cleft.
pub const POCKETS: [(&str, &[isize]); 6] = [
    ("a", &[5, 59, 63, 66, 159, 163, 167, 171]),
    ("b", &[7, 9, 24, 25, 33, 34, 45, 60, 67, 70]),
    ("c", &[73, 74]),
    ("d", &[99, 114, 155, 156]),
    ("e", &[97, 114, 147, 152]),
    ("f", &[77, 80, 81, 84, 95, 116, 123, 143, 146, 147]),
];

// Species whose heavy-chain numbering maps onto the pocket positions directly.
static DIRECT_MAPPING: Set<&'static str> = phf_set! {
    "homo_sapiens", "macaca_mulatta", "equus_caballus", "felis_catus",
    "ailuropoda_melanoleuca", "bos_taurus", "oryctolagus_cuniculus", "sus_scrofa",
    "mus_musculus", "rattus_norvegicus",
};

/// The organism slug, provided pocket positions can be read straight off its
/// heavy-chain numbering.
pub fn direct_mapping_organism(organism: Option<&Organism>) -> Result<String, StepError> {
    let name = organism
        .and_then(|o| o.scientific_name.as_deref())
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| StepError::new(ErrorKind::NoOrganismFound, "structure has no source organism"))?;
    let slug = slugify(name);
    if !DIRECT_MAPPING.contains(slug.as_str()) {
        return Err(StepError::new(
            ErrorKind::IndirectMapping,
            format!("pocket positions do not map directly onto '{}'", name),
        )
        .with_detail(serde_json::json!({ "organism": slug })));
    }
    Ok(slug)
}

/// Residues at each pocket position of a heavy-chain sequence whose first
/// residue is numbered `first_residue`.
#[instrument(skip_all, name = "pockets_task")]
pub fn map_pockets(
    sequence: &str,
    first_residue: isize,
) -> Result<BTreeMap<String, Vec<PocketResidue>>, StepError> {
    let residues: Vec<char> = sequence.chars().collect();
    let residue_at = |position: isize| {
        usize::try_from(position - first_residue)
            .ok()
            .and_then(|index| residues.get(index).copied())
    };

    let mut pockets = BTreeMap::new();
    for (pocket, positions) in POCKETS {
        let mut lining = Vec::with_capacity(positions.len());
        for &position in positions {
            let one_letter = residue_at(position).ok_or_else(|| {
                StepError::new(
                    ErrorKind::NoSequence,
                    format!("sequence has no residue at pocket {} position {}", pocket, position),
                )
            })?;
            lining.push(PocketResidue {
                position,
                one_letter,
                three_letter: one_to_three(one_letter).unwrap_or("UNK").to_string(),
            });
        }
        pockets.insert(pocket.to_string(), lining);
    }
    Ok(pockets)
}
