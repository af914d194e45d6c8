//! Long help text constants for CLI subcommands.
//!
//! Extracted from `cli.rs` to keep the argument definitions concise.

/// Near-duplicate scan: pipeline outline, thresholds, and exit codes.
pub const SCAN: &str = "\
Scan a directory tree for near-duplicate code patterns.

Functions and methods are extracted as comparison blocks, normalized into
token multisets (literals folded, identifiers kept), and compared with
Jaccard similarity. Overlapping matches merge into duplicate groups, each
carrying a token-cost estimate: the context-window tokens that would be
saved by keeping one canonical copy.

Candidate selection:
  By default an inverted token index proposes candidate pairs, pruning
  pairs that provably cannot reach the similarity threshold. Use
  --exhaustive to compare every pair of blocks instead.

Severity:
  critical  similarity > 0.95
  major     similarity > 0.90
  minor     everything at or above --min-similarity

Exit codes:
  0  scan completed (warnings may have degraded coverage)
  1  fatal error: missing root, no readable source files, invalid glob
  2  --fail-on was given and a matching issue exists

Reads optional defaults from gemelo.toml at the scan root; command-line
flags take precedence. Out-of-range values are clamped with a warning.";
