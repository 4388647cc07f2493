use crate::core::models::facets::{AlikeChainsFacet, AlikeCluster, ChainsFacet};
use crate::core::utils::sequence::levenshtein_ratio;
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const SHORT_CHAIN_LENGTH: usize = 20;
const SHORT_CHAIN_RATIO: f64 = 0.8;
const LONG_CHAIN_LENGTH: usize = 150;

/// Whether two chains are copies of the same molecule in different assemblies.
pub fn are_alike(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (len_a, len_b) = (a.len(), b.len());
    if len_a < SHORT_CHAIN_LENGTH && len_b < SHORT_CHAIN_LENGTH {
        return levenshtein_ratio(a, b) >= SHORT_CHAIN_RATIO;
    }

    let longer = len_a.max(len_b) as f64;
    let difference = len_a.abs_diff(len_b) as f64;
    let (length_tolerance, min_ratio) = if len_a.min(len_b) >= LONG_CHAIN_LENGTH {
        (0.1, 0.9)
    } else {
        (0.2, 0.8)
    };
    difference <= longer * length_tolerance && levenshtein_ratio(a, b) > min_ratio
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterResult {
    pub clusters: BTreeMap<usize, AlikeCluster>,
    /// Groups dropped because their size differed from the assembly count.
    pub discarded: usize,
}

/// Collects chains in declaration order, then merges alike chains transitively.
pub struct ClusterBuilder {
    assembly_count: usize,
    chains: Vec<(char, String)>,
}

impl ClusterBuilder {
    pub fn new(assembly_count: usize) -> Self {
        Self {
            assembly_count,
            chains: Vec::new(),
        }
    }

    /// Every assigned chain of `facet`, in declaration order.
    pub fn from_chains_facet(facet: &ChainsFacet, assembly_count: usize) -> Self {
        let mut builder = Self::new(assembly_count);
        for &chain_id in &facet.declaration_order {
            if let Some(assignment) = facet.assignment_for(chain_id) {
                builder.add_chain(chain_id, &assignment.sequence);
            }
        }
        builder
    }

    pub fn add_chain(&mut self, chain_id: char, sequence: &str) -> &mut Self {
        self.chains.push((chain_id, sequence.to_string()));
        self
    }

    pub fn build(self) -> ClusterResult {
        let groups = if self.assembly_count <= 1 {
            (0..self.chains.len()).map(|i| vec![i]).collect()
        } else {
            self.merge_alike()
        };

        let mut clusters = BTreeMap::new();
        let mut discarded = 0;
        for members in groups {
            if members.len() != self.assembly_count.max(1) {
                discarded += 1;
                continue;
            }
            let id = clusters.len() + 1;
            clusters.insert(
                id,
                AlikeCluster {
                    chain_ids: members.iter().map(|&i| self.chains[i].0).collect(),
                    representative_sequence: self.chains[members[0]].1.clone(),
                    lengths: members.iter().map(|&i| self.chains[i].1.len()).collect(),
                },
            );
        }
        if discarded > 0 {
            warn!(
                discarded,
                assembly_count = self.assembly_count,
                "Discarded chain groups whose size does not match the assembly count"
            );
        }
        ClusterResult {
            clusters,
            discarded,
        }
    }

    /// Groups of chain indices, each sorted, ordered by first member.
    fn merge_alike(&self) -> Vec<Vec<usize>> {
        let mut parent: Vec<usize> = (0..self.chains.len()).collect();

        fn find(parent: &mut [usize], i: usize) -> usize {
            let mut root = i;
            while parent[root] != root {
                root = parent[root];
            }
            let mut node = i;
            while parent[node] != root {
                let next = parent[node];
                parent[node] = root;
                node = next;
            }
            root
        }

        for (i, j) in (0..self.chains.len()).tuple_combinations() {
            if are_alike(&self.chains[i].1, &self.chains[j].1) {
                let (root_i, root_j) = (find(&mut parent, i), find(&mut parent, j));
                if root_i != root_j {
                    // The lower index stays the root so groups order by first member.
                    parent[root_i.max(root_j)] = root_i.min(root_j);
                    debug!(a = %self.chains[i].0, b = %self.chains[j].0, "Merged alike chains");
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..self.chains.len() {
            let root = find(&mut parent, i);
            groups.entry(root).or_default().push(i);
        }
        groups.into_values().collect()
    }

    pub fn build_facet(self, last_updated: String) -> (AlikeChainsFacet, usize) {
        let assembly_count = self.assembly_count;
        let result = self.build();
        (
            AlikeChainsFacet {
                assembly_count,
                clusters: result.clusters,
                last_updated,
            },
            result.discarded,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat(unit: &str, length: usize) -> String {
        unit.chars().cycle().take(length).collect()
    }

    #[test]
    fn alike_rules_depend_on_length() {
        assert!(are_alike("SLYNTVATL", "SLYNTVATL"));
        // One substitution in a nonamer: ratio 17/18.
        assert!(are_alike("SLYNTVATL", "SLYNTVATV"));
        assert!(!are_alike("SLYNTVATL", "GILGFVFTL"));

        let long = repeat("ACDEFGHIKL", 200);
        let mut variant = long.clone();
        variant.replace_range(0..10, "MNPQRSTVWY");
        assert!(are_alike(&long, &variant));
        assert!(!are_alike(&long, &long[..170]));
    }

    #[test]
    fn single_assembly_keeps_every_chain_as_its_own_cluster() {
        let mut builder = ClusterBuilder::new(1);
        builder.add_chain('A', "AAAA").add_chain('B', "AAAA");
        let result = builder.build();
        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.clusters[&1].chain_ids, vec!['A']);
        assert_eq!(result.discarded, 0);
    }

    #[test]
    fn two_assemblies_pair_up_copies_in_declaration_order() {
        let heavy = repeat("ACDEFGHIKL", 180);
        let light = repeat("MNPQRSTVWY", 99);
        let mut builder = ClusterBuilder::new(2);
        builder
            .add_chain('A', &heavy)
            .add_chain('B', &light)
            .add_chain('C', "SLYNTVATL")
            .add_chain('D', &heavy)
            .add_chain('E', &light)
            .add_chain('F', "SLYNTVATL");
        let result = builder.build();

        assert_eq!(result.discarded, 0);
        let ids: Vec<_> = result.clusters.values().map(|c| c.chain_ids.clone()).collect();
        assert_eq!(ids, vec![vec!['A', 'D'], vec!['B', 'E'], vec!['C', 'F']]);
        assert_eq!(result.clusters[&3].lengths, vec![9, 9]);
    }

    #[test]
    fn clusters_of_the_wrong_size_are_discarded() {
        let heavy = repeat("ACDEFGHIKL", 180);
        let mut builder = ClusterBuilder::new(2);
        builder
            .add_chain('A', &heavy)
            .add_chain('B', &heavy)
            .add_chain('C', "SLYNTVATL");
        let result = builder.build();

        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[&1].chain_ids, vec!['A', 'B']);
        assert_eq!(result.discarded, 1);
    }

    #[test]
    fn merging_is_transitive() {
        // A~B and B~C at ratio 0.8, while A and C sit at 0.6.
        assert!(!are_alike("AAAAAAAAAA", "WWWWAAWWWW"));
        let mut builder = ClusterBuilder::new(3);
        builder
            .add_chain('A', "AAAAAAAAAA")
            .add_chain('B', "AAAAAAWWWW")
            .add_chain('C', "WWWWAAWWWW");
        let result = builder.build();
        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[&1].chain_ids, vec!['A', 'B', 'C']);
    }
}
