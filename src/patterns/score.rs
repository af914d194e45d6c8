use super::block::{Block, PatternType};

/// A candidate pair that met the similarity threshold. Indices are
/// canonical (`a < b`), so a pair is never reported twice.
#[derive(Debug, Clone)]
pub struct DuplicateMatch {
    pub a: u32,
    pub b: u32,
    pub similarity: f64,
    pub pattern_type: PatternType,
}

/// Jaccard similarity of two normalized token multisets: intersection
/// min-sum over union max-sum. Both inputs are sorted by token, so a
/// single merge walk suffices. Returns a value in `[0, 1]`; two empty
/// multisets score 0.
pub fn jaccard(a: &[(String, u32)], b: &[(String, u32)]) -> f64 {
    let mut intersection = 0u64;
    let mut union = 0u64;
    let mut i = 0usize;
    let mut j = 0usize;

    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Equal => {
                intersection += u64::from(a[i].1.min(b[j].1));
                union += u64::from(a[i].1.max(b[j].1));
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                union += u64::from(a[i].1);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                union += u64::from(b[j].1);
                j += 1;
            }
        }
    }
    union += a[i..].iter().map(|(_, c)| u64::from(*c)).sum::<u64>();
    union += b[j..].iter().map(|(_, c)| u64::from(*c)).sum::<u64>();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Score one canonical pair; ties at the threshold are included.
///
/// The same similarity function serves both index modes, so candidate
/// pruning can drop work but never change a surviving score.
pub fn score_pair(a: u32, b: u32, blocks: &[Block], min_similarity: f64) -> Option<DuplicateMatch> {
    let block_a = &blocks[a as usize];
    let block_b = &blocks[b as usize];
    let similarity = jaccard(&block_a.tokens, &block_b.tokens);
    if similarity >= min_similarity {
        Some(DuplicateMatch {
            a,
            b,
            similarity,
            pattern_type: dominant_type(block_a.pattern_type, block_b.pattern_type),
        })
    } else {
        None
    }
}

/// The pair's dominant pattern type: agreement wins, `unknown` defers to
/// the other side, and a tie between two known types goes to the
/// lower-index block.
fn dominant_type(a: PatternType, b: PatternType) -> PatternType {
    match (a, b) {
        (PatternType::Unknown, other) => other,
        (other, _) => other,
    }
}

#[cfg(test)]
#[path = "score_test.rs"]
mod tests;
