use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Optional config file looked up at the scan root.
pub const CONFIG_FILE: &str = "gemelo.toml";

/// Tuning knobs for the duplicate-pattern scan.
///
/// All values are validated with [`DetectConfig::apply`]: out-of-range
/// settings are clamped to the nearest valid bound with a warning. A CI run
/// should degrade on a slightly malformed config, not crash.
#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// Jaccard similarity threshold for a duplicate match (inclusive).
    pub min_similarity: f64,
    /// Minimum block size in lines; smaller units are discarded.
    pub min_lines: usize,
    /// Blocks scored per batch; bounds memory, never changes results.
    pub batch_size: usize,
    /// Candidate pruning through the inverted index (versus all pairs).
    pub approx: bool,
    /// Minimum shared-token count for a candidate pair in approx mode.
    pub min_shared_tokens: usize,
    /// Candidate list cap per block; lowest-overlap candidates drop first.
    pub max_candidates_per_block: usize,
    /// Report per-batch match counts while the scan runs.
    pub stream_results: bool,
    /// Include globs relative to the scan root (empty = everything).
    pub include: Vec<String>,
    /// Exclude globs; exclude wins over include.
    pub exclude: Vec<String>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.40,
            min_lines: 5,
            batch_size: 100,
            approx: true,
            min_shared_tokens: 8,
            max_candidates_per_block: 100,
            stream_results: true,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

/// Partial settings from `gemelo.toml` or CLI flags, layered over the
/// defaults. Integers are read as `i64` so negative values can be clamped
/// with a warning instead of failing to parse.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ConfigOverlay {
    pub min_similarity: Option<f64>,
    pub min_lines: Option<i64>,
    pub batch_size: Option<i64>,
    pub approx: Option<bool>,
    pub min_shared_tokens: Option<i64>,
    pub max_candidates_per_block: Option<i64>,
    pub stream_results: Option<bool>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

impl DetectConfig {
    /// Layer an overlay onto this config, clamping out-of-range values and
    /// recording one warning per adjustment.
    pub fn apply(&mut self, overlay: &ConfigOverlay, warnings: &mut Vec<String>) {
        if let Some(v) = overlay.min_similarity {
            self.min_similarity = clamp_unit("min_similarity", v, warnings);
        }
        if let Some(v) = overlay.min_lines {
            self.min_lines = clamp_at_least("min_lines", v, 1, warnings);
        }
        if let Some(v) = overlay.batch_size {
            self.batch_size = clamp_at_least("batch_size", v, 1, warnings);
        }
        if let Some(v) = overlay.approx {
            self.approx = v;
        }
        if let Some(v) = overlay.min_shared_tokens {
            self.min_shared_tokens = clamp_at_least("min_shared_tokens", v, 1, warnings);
        }
        if let Some(v) = overlay.max_candidates_per_block {
            self.max_candidates_per_block =
                clamp_at_least("max_candidates_per_block", v, 1, warnings);
        }
        if let Some(v) = overlay.stream_results {
            self.stream_results = v;
        }
        if let Some(v) = &overlay.include {
            self.include = v.clone();
        }
        if let Some(v) = &overlay.exclude {
            self.exclude = v.clone();
        }
    }
}

fn clamp_unit(name: &str, value: f64, warnings: &mut Vec<String>) -> f64 {
    if !value.is_finite() {
        warnings.push(format!("config: {name} = {value} is not a number, using 0"));
        return 0.0;
    }
    if value < 0.0 {
        warnings.push(format!("config: {name} = {value} below 0, clamped to 0"));
        0.0
    } else if value > 1.0 {
        warnings.push(format!("config: {name} = {value} above 1, clamped to 1"));
        1.0
    } else {
        value
    }
}

fn clamp_at_least(name: &str, value: i64, floor: usize, warnings: &mut Vec<String>) -> usize {
    if value < floor as i64 {
        warnings.push(format!(
            "config: {name} = {value} below {floor}, clamped to {floor}"
        ));
        floor
    } else {
        value as usize
    }
}

/// Read the optional `gemelo.toml` at the scan root. A missing file is the
/// normal case; an unreadable or malformed one degrades to defaults with a
/// warning.
pub fn load_overlay(root: &Path) -> (ConfigOverlay, Option<String>) {
    let path = root.join(CONFIG_FILE);
    if !path.is_file() {
        return (ConfigOverlay::default(), None);
    }
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(err) => {
            return (
                ConfigOverlay::default(),
                Some(format!("config: {}: {err}", path.display())),
            );
        }
    };
    match toml::from_str(&text) {
        Ok(overlay) => (overlay, None),
        Err(err) => (
            ConfigOverlay::default(),
            Some(format!("config: {}: {err}", path.display())),
        ),
    }
}
