/// Levenshtein edit distance between two sequences.
pub fn edit_distance(a: &str, b: &str) -> u32 {
    triple_accel::levenshtein(a.as_bytes(), b.as_bytes())
}

/// Normalised similarity `(|a| + |b| - d) / (|a| + |b|)` in `[0, 1]`.
///
/// Two empty sequences are identical.
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let distance = edit_distance(a, b) as f64;
    (total as f64 - distance) / total as f64
}

/// Conventional name for a peptide of the given length.
pub fn length_class(length: usize) -> String {
    match length {
        8 => "octamer".to_string(),
        9 => "nonamer".to_string(),
        10 => "decamer".to_string(),
        11 => "undecamer".to_string(),
        12 => "dodecamer".to_string(),
        13 => "tridecamer".to_string(),
        14 => "tetradecamer".to_string(),
        15 => "pentadecamer".to_string(),
        n => format!("{}mer", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_have_ratio_one() {
        assert_eq!(levenshtein_ratio("GSHSMRYF", "GSHSMRYF"), 1.0);
        assert_eq!(levenshtein_ratio("", ""), 1.0);
    }

    #[test]
    fn ratio_counts_each_edit_against_combined_length() {
        // One substitution over 10 + 10 residues.
        assert_eq!(edit_distance("ACDEFGHIKL", "ACDEFGHIKM"), 1);
        assert!((levenshtein_ratio("ACDEFGHIKL", "ACDEFGHIKM") - 0.95).abs() < 1e-12);
    }

    #[test]
    fn completely_different_sequences_score_low() {
        assert_eq!(levenshtein_ratio("AAAA", "WWWW"), 0.5);
        assert_eq!(levenshtein_ratio("AAAA", ""), 0.0);
    }

    #[test]
    fn length_classes_have_names_for_common_lengths() {
        assert_eq!(length_class(9), "nonamer");
        assert_eq!(length_class(10), "decamer");
        assert_eq!(length_class(21), "21mer");
    }
}
