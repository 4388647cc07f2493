use crate::core::catalogue::alleles::{AlleleCatalogue, AlleleRecord};
use crate::core::models::facets::{AlleleMatch, MatchType};
use crate::core::utils::sequence::levenshtein_ratio;
use crate::engine::config::PipelineConfig;
use crate::engine::error::ErrorKind;
use tracing::debug;

/// Start motifs of the mature class I heavy chain.
const MATURE_CHAIN_MOTIFS: [&str; 4] = ["GSH", "CSH", "GPH", "SHS"];
const SIGNAL_PEPTIDE_SEARCH_LENGTH: usize = 30;

/// A chain sequence brought into the register of the reference alleles.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalisedSequence {
    pub sequence: String,
    /// The chain starts one residue into the mature sequence, so references
    /// are compared without their first residue.
    pub skip_reference_first: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlleleOutcome {
    pub matched: Option<AlleleMatch>,
    /// Failure kinds of the tiers tried before the match, in order.
    pub failed_tiers: Vec<ErrorKind>,
}

impl AlleleOutcome {
    /// The kind reported when nothing matched.
    pub fn failure_kind(&self) -> ErrorKind {
        self.failed_tiers
            .last()
            .copied()
            .unwrap_or(ErrorKind::NoMatchPossible)
    }
}

pub struct AlleleMatcher<'a> {
    catalogue: &'a AlleleCatalogue,
    truncation: usize,
    signal_peptide_threshold: usize,
    min_length: usize,
    fuzzy_threshold: f64,
}

impl<'a> AlleleMatcher<'a> {
    pub fn new(catalogue: &'a AlleleCatalogue, config: &PipelineConfig) -> Self {
        Self {
            catalogue,
            truncation: config.allele_truncation,
            signal_peptide_threshold: config.signal_peptide_threshold,
            min_length: config.min_allele_length,
            fuzzy_threshold: config.fuzzy_threshold,
        }
    }

    pub fn normalise(&self, sequence: &str, first_residue: isize) -> NormalisedSequence {
        let mut sequence = sequence.trim().to_ascii_uppercase();
        if first_residue == 0 && !sequence.is_empty() {
            sequence.remove(0);
        }

        let mut stripped_signal = false;
        if sequence.len() > self.signal_peptide_threshold {
            let window = &sequence[..sequence.len().min(SIGNAL_PEPTIDE_SEARCH_LENGTH)];
            let start = MATURE_CHAIN_MOTIFS
                .iter()
                .filter_map(|motif| window.find(motif))
                .min();
            if let Some(start) = start.filter(|&s| s > 0) {
                debug!(removed = start, "Removed signal peptide");
                sequence.drain(..start);
                stripped_signal = true;
            }
        }

        NormalisedSequence {
            sequence,
            skip_reference_first: first_residue == 2 && !stripped_signal,
        }
    }

    /// Both sequences truncated to the comparison length, then to the shorter.
    fn comparable<'s>(&self, query: &'s str, reference: &'s str, skip_first: bool) -> (&'s str, &'s str) {
        let reference = if skip_first && !reference.is_empty() {
            &reference[1..]
        } else {
            reference
        };
        let length = query.len().min(reference.len()).min(self.truncation);
        (&query[..length], &reference[..length])
    }

    fn exact_in<'r>(
        &self,
        query: &NormalisedSequence,
        candidates: impl IntoIterator<Item = &'r AlleleRecord>,
    ) -> Option<&'r AlleleRecord> {
        candidates.into_iter().find(|allele| {
            let (q, r) = self.comparable(&query.sequence, &allele.sequence, query.skip_reference_first);
            !q.is_empty() && q == r
        })
    }

    fn best_fuzzy(&self, query: &NormalisedSequence) -> Option<(&'a AlleleRecord, f64)> {
        let mut best: Option<(&AlleleRecord, f64)> = None;
        for allele in self.catalogue.alleles() {
            let (q, r) = self.comparable(&query.sequence, &allele.sequence, query.skip_reference_first);
            if q.is_empty() {
                continue;
            }
            let ratio = levenshtein_ratio(q, r);
            if best.is_none_or(|(_, best_ratio)| ratio > best_ratio) {
                best = Some((allele, ratio));
            }
        }
        best.filter(|(_, ratio)| *ratio > self.fuzzy_threshold)
    }

    fn to_match(allele: &AlleleRecord, match_type: MatchType, confidence: f64, tier: u8) -> AlleleMatch {
        AlleleMatch {
            locus: allele.locus.clone(),
            allele_group: allele.allele_group.clone(),
            allele: allele.allele.clone(),
            id: allele.id.clone(),
            match_type,
            confidence,
            tier,
        }
    }

    /// Tries the tiers in order and stops at the first hit.
    pub fn match_sequence(&self, sequence: &str, first_residue: isize) -> AlleleOutcome {
        if sequence.len() < self.min_length {
            return AlleleOutcome {
                matched: None,
                failed_tiers: vec![ErrorKind::NoMatchPossible],
            };
        }
        let query = self.normalise(sequence, first_residue);
        let mut failed_tiers = Vec::new();

        // 1. Exact against each group's representative.
        if let Some(allele) = self.exact_in(&query, self.catalogue.group_representatives()) {
            return AlleleOutcome {
                matched: Some(Self::to_match(allele, MatchType::Exact, 1.0, 1)),
                failed_tiers,
            };
        }
        failed_tiers.push(ErrorKind::FirstMatchFailure);

        // 2. Exact against every allele.
        if let Some(allele) = self.exact_in(&query, self.catalogue.alleles()) {
            return AlleleOutcome {
                matched: Some(Self::to_match(allele, MatchType::Exact, 1.0, 2)),
                failed_tiers,
            };
        }
        failed_tiers.push(ErrorKind::SecondMatchFailure);

        // 3. Closest allele above the fuzzy threshold.
        if let Some((allele, ratio)) = self.best_fuzzy(&query) {
            return AlleleOutcome {
                matched: Some(Self::to_match(allele, MatchType::Fuzzy, ratio, 3)),
                failed_tiers,
            };
        }
        failed_tiers.push(ErrorKind::ThirdMatchFailure);

        AlleleOutcome {
            matched: None,
            failed_tiers,
        }
    }
}
