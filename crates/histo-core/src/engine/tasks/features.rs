use crate::core::models::facets::{ContactMap, PeptideFeatures};
use crate::core::utils::sequence::length_class;

/// Receptor residues lining the pocket that holds the peptide N-terminus.
pub const N_TERMINAL_POCKET: [isize; 2] = [7, 171];
/// Receptor residues lining the pocket that holds the peptide C-terminus.
pub const C_TERMINAL_POCKET: [isize; 2] = [116, 143];

const BULGE_MIN_LENGTH: usize = 8;

fn contacts_pocket(contacts: &ContactMap, position: usize, pocket: &[isize; 2]) -> bool {
    let receptor = contacts.receptor_positions(position);
    pocket.iter().all(|p| receptor.contains(p))
}

/// Derives anchor positions, terminal extensions and solvent exposure of a
/// bound peptide from its contact map.
///
/// When several positions reach a pocket, the outermost one is the anchor.
pub fn derive_features(sequence: &str, contacts: &ContactMap, exposure_limit: usize) -> PeptideFeatures {
    let length = sequence.len();
    let positions = 1..=length;

    let pn = positions
        .clone()
        .find(|&p| contacts_pocket(contacts, p, &N_TERMINAL_POCKET));
    let pc = positions
        .clone()
        .rev()
        .find(|&p| contacts_pocket(contacts, p, &C_TERMINAL_POCKET));

    // A missing anchor never implies an extension on its side.
    let n_terminal_extension = pn.is_some_and(|p| p > 1);
    let c_terminal_extension = pc.is_some_and(|p| p < length);

    let mut extension_positions = Vec::new();
    if let Some(pn) = pn {
        extension_positions.extend(1..pn);
    }
    if let Some(pc) = pc {
        extension_positions.extend(pc + 1..=length);
    }

    let (exposed, buried): (Vec<usize>, Vec<usize>) = positions
        .clone()
        .partition(|&p| contacts.receptor_positions(p).len() <= exposure_limit);

    let exposed_bulge = match (pn, pc) {
        (Some(pn), Some(pc)) if length > BULGE_MIN_LENGTH && !n_terminal_extension && !c_terminal_extension => {
            exposed.iter().any(|&p| p > pn && p < pc)
        }
        _ => false,
    };

    PeptideFeatures {
        sequence: sequence.to_string(),
        length,
        length_class: length_class(length),
        pn,
        pc,
        n_terminal_extension,
        c_terminal_extension,
        extension_positions,
        exposed,
        buried,
        exposed_bulge,
    }
}
