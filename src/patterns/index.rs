use std::collections::HashMap;

use crate::config::DetectConfig;

use super::block::Block;

/// Scan-scoped inverted index from token to the blocks containing it.
///
/// Built once after extraction, read-only afterwards, and discarded with the
/// scan. Proposes candidate pairs cheaply instead of comparing every block
/// against every other: a pair sharing fewer than `min_shared_tokens`
/// tokens is bounded above by `shared / min(|A|, |B|)` similarity, so
/// pruning it cannot lose a match that would have reached the threshold.
pub struct CandidateIndex {
    /// token -> (block index, multiplicity in that block)
    postings: HashMap<String, Vec<(u32, u32)>>,
}

impl CandidateIndex {
    pub fn build(blocks: &[Block]) -> Self {
        let mut postings: HashMap<String, Vec<(u32, u32)>> = HashMap::new();
        for (idx, block) in blocks.iter().enumerate() {
            for (token, count) in &block.tokens {
                postings
                    .entry(token.clone())
                    .or_default()
                    .push((idx as u32, *count));
            }
        }
        Self { postings }
    }

    /// Candidate neighbours for one block, ranked by shared-token count
    /// (multiset min-sum), filtered at `min_shared_tokens`, and capped at
    /// `max_candidates_per_block` dropping lowest overlap first. Ties at
    /// the cap boundary break toward the lower block index so the result
    /// never depends on hash-map iteration order.
    ///
    /// A block with an empty token multiset has no candidates.
    pub fn candidates_for(&self, idx: usize, blocks: &[Block], config: &DetectConfig) -> Vec<u32> {
        let block = &blocks[idx];
        if block.tokens.is_empty() {
            return Vec::new();
        }

        let mut shared: HashMap<u32, u64> = HashMap::new();
        for (token, count) in &block.tokens {
            if let Some(list) = self.postings.get(token) {
                for (other, other_count) in list {
                    if *other as usize == idx {
                        continue;
                    }
                    *shared.entry(*other).or_default() +=
                        u64::from((*count).min(*other_count));
                }
            }
        }

        let floor = config.min_shared_tokens.max(1) as u64;
        let mut ranked: Vec<(u32, u64)> = shared
            .into_iter()
            .filter(|(_, overlap)| *overlap >= floor)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(config.max_candidates_per_block);
        ranked.into_iter().map(|(other, _)| other).collect()
    }
}

/// Exhaustive mode: every block pairs with every later block in canonical
/// order. Always correct with respect to the real similarity function.
pub fn exhaustive_candidates(idx: usize, total: usize) -> impl Iterator<Item = u32> {
    (idx as u32 + 1)..(total as u32)
}

#[cfg(test)]
#[path = "index_test.rs"]
mod tests;
