use std::collections::HashMap;

use serde::Serialize;

use super::block::{Block, PatternType};
use super::score::DuplicateMatch;

/// Issue severity, derived from a group's representative similarity:
/// critical above 0.95, major above 0.90, minor otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub fn from_similarity(similarity: f64) -> Self {
        if similarity > 0.95 {
            Self::Critical
        } else if similarity > 0.90 {
            Self::Major
        } else {
            Self::Minor
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "critical" => Some(Self::Critical),
            "major" => Some(Self::Major),
            "minor" => Some(Self::Minor),
            _ => None,
        }
    }
}

/// A maximal set of blocks connected transitively by duplicate matches.
/// Always has at least two members by construction.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// Member block indices in canonical (ascending) order.
    pub members: Vec<u32>,
    /// Maximum similarity over the group's internal edges. Max (not mean)
    /// is stable when a weaker third copy joins an existing pair.
    pub representative_similarity: f64,
    pub pattern_type: PatternType,
    /// Tokens that would be eliminated by keeping one canonical copy:
    /// sum over members minus the largest member. Never negative.
    pub token_cost: usize,
    pub severity: Severity,
}

/// Arena-of-indices union-find with path compression and union-by-size.
struct UnionFind {
    parent: Vec<u32>,
    size: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression: point the whole chain at the root.
        let mut cur = x;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, a: u32, b: u32) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (big, small) = if self.size[ra as usize] >= self.size[rb as usize] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small as usize] = big;
        self.size[big as usize] += self.size[small as usize];
    }
}

/// Accumulates duplicate matches across batches and materializes connected
/// components when the scan's synchronization point is reached.
pub struct ClusterBuilder {
    uf: UnionFind,
    matches: Vec<DuplicateMatch>,
}

impl ClusterBuilder {
    pub fn new(block_count: usize) -> Self {
        Self {
            uf: UnionFind::new(block_count),
            matches: Vec::new(),
        }
    }

    pub fn add(&mut self, m: DuplicateMatch) {
        self.uf.union(m.a, m.b);
        self.matches.push(m);
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Build the final groups. Ordering is canonical (by smallest member),
    /// independent of the order matches arrived in.
    pub fn finish(mut self, blocks: &[Block]) -> Vec<DuplicateGroup> {
        let matches = std::mem::take(&mut self.matches);
        let mut members: HashMap<u32, Vec<u32>> = HashMap::new();
        let mut best_similarity: HashMap<u32, f64> = HashMap::new();

        // Membership comes from match endpoints, so isolated blocks never
        // form a group.
        for m in &matches {
            let root = self.uf.find(m.a);
            let best = best_similarity.entry(root).or_insert(0.0);
            if m.similarity > *best {
                *best = m.similarity;
            }
            let ids = members.entry(root).or_default();
            ids.push(m.a);
            ids.push(m.b);
        }

        let mut groups: Vec<DuplicateGroup> = members
            .into_iter()
            .map(|(root, mut ids)| {
                ids.sort_unstable();
                ids.dedup();

                let representative_similarity = best_similarity.get(&root).copied().unwrap_or(0.0);
                let token_sum: usize = ids.iter().map(|&i| blocks[i as usize].token_count).sum();
                let token_max: usize = ids
                    .iter()
                    .map(|&i| blocks[i as usize].token_count)
                    .max()
                    .unwrap_or(0);

                DuplicateGroup {
                    pattern_type: group_pattern_type(&ids, blocks),
                    token_cost: token_sum - token_max,
                    severity: Severity::from_similarity(representative_similarity),
                    representative_similarity,
                    members: ids,
                }
            })
            .collect();

        groups.sort_by_key(|g| g.members[0]);
        groups
    }
}

/// Most frequent non-unknown member type; ties go to the type seen first
/// in canonical member order. All-unknown groups stay unknown.
fn group_pattern_type(members: &[u32], blocks: &[Block]) -> PatternType {
    let mut counts: HashMap<PatternType, usize> = HashMap::new();
    for &idx in members {
        let t = blocks[idx as usize].pattern_type;
        if t != PatternType::Unknown {
            *counts.entry(t).or_default() += 1;
        }
    }

    let mut best: Option<(PatternType, usize)> = None;
    for &idx in members {
        let t = blocks[idx as usize].pattern_type;
        if let Some(&count) = counts.get(&t) {
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((t, count)),
            }
        }
    }
    best.map_or(PatternType::Unknown, |(t, _)| t)
}

#[cfg(test)]
#[path = "cluster_test.rs"]
mod tests;
