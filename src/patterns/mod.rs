//! Near-duplicate pattern detection engine.
//!
//! Pipeline: extract comparison blocks from parsed files, propose candidate
//! pairs through a scan-scoped inverted index, score candidates with
//! Jaccard similarity, merge matches into duplicate groups, and assemble a
//! deterministic report. Data flows strictly forward; only the candidate
//! index holds cross-file state, and it is read-only once built.

mod block;
mod cluster;
mod index;
mod report;
mod score;

pub use block::{Block, PatternType, classify};
pub use cluster::{ClusterBuilder, DuplicateGroup, Severity};
pub use index::CandidateIndex;
pub use report::{Report, assemble};
pub use score::{DuplicateMatch, jaccard};

use std::collections::HashSet;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::config::{self, ConfigOverlay, DetectConfig};
use crate::lang::{self, LanguageSpec};
use crate::parse::{self, ParsedFile};
use crate::report_helpers;
use crate::util;
use crate::walk;

/// Progress of one finished scoring batch, for incremental reporting.
#[derive(Debug, Clone, Copy)]
pub struct BatchUpdate {
    pub batch: usize,
    pub batches: usize,
    pub new_matches: usize,
    pub total_matches: usize,
}

/// Optional observers for a scan. Progress callbacks are best-effort and
/// must not block; cancellation is checked between batches only, so an
/// aborted scan still returns a well-formed partial result.
#[derive(Default, Clone, Copy)]
pub struct ScanHooks<'a> {
    pub progress: Option<&'a (dyn Fn(usize, usize, &str) + Sync)>,
    pub on_batch: Option<&'a (dyn Fn(BatchUpdate) + Sync)>,
    pub cancel: Option<&'a AtomicBool>,
}

/// Everything a scan produced. Blocks and groups are read-only artifacts;
/// the report assembler consumes them as-is.
pub struct Detection {
    pub blocks: Vec<Block>,
    pub groups: Vec<DuplicateGroup>,
    pub matches: usize,
    pub warnings: Vec<String>,
    pub cancelled: bool,
}

/// Run the engine over pre-parsed files.
///
/// For a fixed input and config the result is identical regardless of
/// batch size or thread count: batching only bounds how much candidate
/// state is alive at once, and the parallel stages preserve input order.
pub fn detect(files: &[ParsedFile], config: &DetectConfig, hooks: &ScanHooks) -> Detection {
    let mut warnings = Vec::new();

    // Extraction is embarrassingly parallel: per-file work with no shared
    // mutable state.
    let total_files = files.len();
    let files_done = AtomicUsize::new(0);
    let extracted: Vec<(Vec<Block>, Vec<String>)> = files
        .par_iter()
        .map(|file| {
            let result = block::blocks_for_file(file, config);
            let done = files_done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = hooks.progress {
                progress(done, total_files, "extracting blocks");
            }
            result
        })
        .collect();

    let mut blocks: Vec<Block> = Vec::new();
    for (file_blocks, file_warnings) in extracted {
        blocks.extend(file_blocks);
        warnings.extend(file_warnings);
    }
    // Canonical ordering: all downstream stages key off block indices.
    blocks.sort_by(|a, b| {
        a.file_name
            .cmp(&b.file_name)
            .then_with(|| a.start_line.cmp(&b.start_line))
            .then_with(|| a.end_line.cmp(&b.end_line))
    });

    let candidate_index = config.approx.then(|| CandidateIndex::build(&blocks));

    let total_blocks = blocks.len();
    let batch_size = config.batch_size.max(1);
    let batches = total_blocks.div_ceil(batch_size);
    let mut builder = ClusterBuilder::new(total_blocks);
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    let mut cancelled = false;

    for (batch_no, start) in (0..total_blocks).step_by(batch_size).enumerate() {
        if let Some(cancel) = hooks.cancel
            && cancel.load(Ordering::Relaxed)
        {
            cancelled = true;
            break;
        }
        let end = (start + batch_size).min(total_blocks);

        // Candidate lookup reads the shared index; nothing mutates it.
        let candidate_lists: Vec<Vec<u32>> = (start..end)
            .into_par_iter()
            .map(|idx| {
                if blocks[idx].tokens.is_empty() {
                    return Vec::new();
                }
                match &candidate_index {
                    Some(index) => index.candidates_for(idx, &blocks, config),
                    None => index::exhaustive_candidates(idx, total_blocks)
                        .filter(|&other| !blocks[other as usize].tokens.is_empty())
                        .collect(),
                }
            })
            .collect();

        // Canonicalize pair direction and dedup across batches. A pair
        // proposed from both ends is scored once.
        let mut pairs: Vec<(u32, u32)> = Vec::new();
        for (offset, candidates) in candidate_lists.iter().enumerate() {
            let a = (start + offset) as u32;
            for &other in candidates {
                let pair = if a < other { (a, other) } else { (other, a) };
                if seen.insert(pair) {
                    pairs.push(pair);
                }
            }
        }

        let new_matches: Vec<DuplicateMatch> = pairs
            .par_iter()
            .filter_map(|&(a, b)| score::score_pair(a, b, &blocks, config.min_similarity))
            .collect();

        let batch_matches = new_matches.len();
        for m in new_matches {
            builder.add(m);
        }

        if let Some(progress) = hooks.progress {
            progress(end, total_blocks, "scoring candidates");
        }
        if let Some(on_batch) = hooks.on_batch {
            on_batch(BatchUpdate {
                batch: batch_no + 1,
                batches,
                new_matches: batch_matches,
                total_matches: builder.match_count(),
            });
        }
    }

    let matches = builder.match_count();
    let groups = builder.finish(&blocks);

    Detection {
        blocks,
        groups,
        matches,
        warnings,
        cancelled,
    }
}

/// CLI-facing options for one scan invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub json: bool,
    pub detailed: bool,
    pub show_all: bool,
    pub include_tests: bool,
    pub no_progress: bool,
}

/// What the scan found, for exit-code policy in the caller.
#[derive(Debug, Clone, Copy)]
pub struct ScanStatus {
    pub total_issues: usize,
    pub worst_severity: Option<Severity>,
    pub degraded: bool,
    pub cancelled: bool,
}

/// Walk, parse, detect, and print. Per-file failures degrade the scan with
/// a warning; a missing root or zero readable source files is fatal so an
/// empty result is never mistaken for a clean one.
pub fn run(
    path: &Path,
    cli_overlay: &ConfigOverlay,
    options: &RunOptions,
    cancel: &AtomicBool,
) -> Result<ScanStatus, Box<dyn Error>> {
    if !path.exists() {
        return Err(format!("{}: no such file or directory", path.display()).into());
    }

    let mut warnings: Vec<String> = Vec::new();
    let mut config = DetectConfig::default();
    let (file_overlay, file_warning) = config::load_overlay(path);
    if let Some(warning) = file_warning {
        warnings.push(warning);
    }
    config.apply(&file_overlay, &mut warnings);
    config.apply(cli_overlay, &mut warnings);

    let filter = walk::FileFilter::new(&config.include, &config.exclude)?;

    let exclude_tests = !options.include_tests;
    let mut sources: Vec<(PathBuf, &'static LanguageSpec)> = Vec::new();
    for entry in walk::walk(path, exclude_tests) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warnings.push(format!("walk: {err}"));
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let file_path = entry.path();
        if exclude_tests && walk::is_test_file(file_path) {
            continue;
        }
        let Some(spec) = lang::detect(file_path).or_else(|| walk::try_detect_shebang(file_path))
        else {
            continue;
        };
        if !filter.matches(&util::display_path(file_path, path)) {
            continue;
        }
        sources.push((file_path.to_path_buf(), spec));
    }
    sources.sort_by(|a, b| a.0.cmp(&b.0));

    // Read and parse in parallel; every file is independent.
    let parsed: Vec<Result<Option<ParsedFile>, String>> = sources
        .par_iter()
        .map(|(file_path, spec)| read_and_parse(file_path, path, spec))
        .collect();

    let mut files = Vec::new();
    for result in parsed {
        match result {
            Ok(Some(file)) => files.push(file),
            Ok(None) => {} // binary, skip
            Err(warning) => warnings.push(warning),
        }
    }

    if files.is_empty() {
        return Err(format!("no readable source files under {}", path.display()).into());
    }

    let bar = (!options.no_progress && !options.json).then(|| {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    });

    let progress = |done: usize, total: usize, stage: &str| {
        if let Some(bar) = &bar {
            if bar.length() != Some(total as u64) {
                bar.set_length(total as u64);
                bar.set_message(stage.to_string());
            }
            bar.set_position(done as u64);
        }
    };
    let stream = |update: BatchUpdate| {
        let msg = format!(
            "batch {}/{}: +{} matches ({} total)",
            update.batch, update.batches, update.new_matches, update.total_matches
        );
        match &bar {
            Some(bar) => bar.println(msg),
            None => eprintln!("{msg}"),
        }
    };
    let hooks = ScanHooks {
        progress: Some(&progress),
        on_batch: if config.stream_results {
            Some(&stream)
        } else {
            None
        },
        cancel: Some(cancel),
    };

    let detection = detect(&files, &config, &hooks);
    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    let Detection {
        blocks,
        groups,
        matches: _,
        warnings: detect_warnings,
        cancelled,
    } = detection;
    warnings.extend(detect_warnings);

    let report = report::assemble(&blocks, &groups);
    let metrics = report::ScanMetrics {
        files_scanned: files.len(),
        blocks_analyzed: blocks.len(),
        cancelled,
    };

    if options.json {
        report_helpers::print_json_stdout(&report)?;
    } else if options.detailed {
        report::print_detailed(&metrics, &report, options.show_all);
    } else {
        report::print_summary(&metrics, &report);
    }

    print_warning_summary(&warnings);

    Ok(ScanStatus {
        total_issues: report.results.iter().map(|r| r.issues.len()).sum(),
        worst_severity: groups.iter().map(|g| g.severity).max(),
        degraded: !warnings.is_empty(),
        cancelled,
    })
}

fn read_and_parse(
    file_path: &Path,
    root: &Path,
    spec: &LanguageSpec,
) -> Result<Option<ParsedFile>, String> {
    let warn = |err: std::io::Error| format!("{}: {err}", file_path.display());

    let file = File::open(file_path).map_err(warn)?;
    let mut reader = BufReader::new(file);
    if util::is_binary_reader(&mut reader).map_err(warn)? {
        return Ok(None);
    }
    let source = std::io::read_to_string(reader).map_err(warn)?;
    Ok(Some(parse::parse_source(
        util::display_path(file_path, root),
        &source,
        spec,
    )))
}

/// Separate from the duplicate summary so "no duplicates" and "scan was
/// degraded" are never conflated.
fn print_warning_summary(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    eprintln!();
    eprintln!(
        "{} warning(s) — scan degraded, results may be incomplete:",
        warnings.len()
    );
    for warning in warnings {
        eprintln!("  warning: {warning}");
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
