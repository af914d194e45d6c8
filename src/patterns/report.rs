use std::collections::BTreeMap;

use serde::Serialize;

use crate::report_helpers;

use super::block::{Block, PatternType};
use super::cluster::{DuplicateGroup, Severity};

/// The stable JSON report contract. Field names are part of the interface;
/// running the same scan twice on unchanged input produces byte-identical
/// output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: Summary,
    pub results: Vec<FileResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_patterns: usize,
    pub total_token_cost: usize,
    pub patterns_by_type: BTreeMap<String, usize>,
    pub top_duplicates: Vec<TopDuplicate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopDuplicate {
    pub similarity: f64,
    pub pattern_type: PatternType,
    pub token_cost: usize,
    pub files: Vec<FileRef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    pub file_name: String,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    pub location: Location,
    pub suggestion: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub file: String,
    pub line: usize,
}

fn suggestion_for(pattern_type: PatternType) -> &'static str {
    match pattern_type {
        PatternType::ApiHandler => {
            "Extract the shared handler logic into a common helper or middleware."
        }
        PatternType::Validator => "Consolidate into a single parameterized validator.",
        PatternType::Utility | PatternType::Function => {
            "Extract the duplicated logic into a shared function."
        }
        PatternType::ClassMethod => "Pull the shared method up into a base type or trait.",
        PatternType::Component => {
            "Extract a reusable component and pass the differences as parameters."
        }
        PatternType::Unknown => "Extract the duplicated logic into a shared helper.",
    }
}

/// Assemble the final report from groups and blocks.
///
/// Ordering is fully specified so the output never depends on insertion
/// order: top duplicates sort by token cost, then similarity, then the
/// lexicographically smallest member path; per-file results sort by file
/// name, and issues within a file by line.
pub fn assemble(blocks: &[Block], groups: &[DuplicateGroup]) -> Report {
    let mut ordered: Vec<&DuplicateGroup> = groups.iter().collect();
    ordered.sort_by(|a, b| {
        b.token_cost
            .cmp(&a.token_cost)
            .then_with(|| {
                b.representative_similarity
                    .total_cmp(&a.representative_similarity)
            })
            .then_with(|| smallest_path(a, blocks).cmp(smallest_path(b, blocks)))
    });

    let mut patterns_by_type: BTreeMap<String, usize> = BTreeMap::new();
    for group in &ordered {
        *patterns_by_type
            .entry(group.pattern_type.as_str().to_string())
            .or_default() += 1;
    }

    let top_duplicates = ordered
        .iter()
        .map(|group| TopDuplicate {
            similarity: group.representative_similarity,
            pattern_type: group.pattern_type,
            token_cost: group.token_cost,
            files: group
                .members
                .iter()
                .map(|&idx| {
                    let block = &blocks[idx as usize];
                    FileRef {
                        path: block.file_name.clone(),
                        start_line: block.start_line,
                        end_line: block.end_line,
                    }
                })
                .collect(),
        })
        .collect();

    let mut per_file: BTreeMap<String, Vec<Issue>> = BTreeMap::new();
    for group in &ordered {
        let message = format!(
            "Near-duplicate {}: {} blocks share {:.0}% of their structure",
            group.pattern_type.as_str(),
            group.members.len(),
            group.representative_similarity * 100.0
        );
        // The largest member is the candidate to keep; earliest wins ties.
        let mut canonical = &blocks[group.members[0] as usize];
        for &idx in &group.members[1..] {
            let block = &blocks[idx as usize];
            if block.token_count > canonical.token_count {
                canonical = block;
            }
        }
        let suggestion = format!(
            "{} Canonical candidate: {}.",
            suggestion_for(group.pattern_type),
            canonical.id()
        );
        for &idx in &group.members {
            let block = &blocks[idx as usize];
            per_file
                .entry(block.file_name.clone())
                .or_default()
                .push(Issue {
                    severity: group.severity,
                    message: message.clone(),
                    location: Location {
                        file: block.file_name.clone(),
                        line: block.start_line,
                    },
                    suggestion: suggestion.clone(),
                });
        }
    }

    let results = per_file
        .into_iter()
        .map(|(file_name, mut issues)| {
            issues.sort_by_key(|issue| issue.location.line);
            FileResult { file_name, issues }
        })
        .collect();

    Report {
        summary: Summary {
            total_patterns: ordered.len(),
            total_token_cost: ordered.iter().map(|g| g.token_cost).sum(),
            patterns_by_type,
            top_duplicates,
        },
        results,
    }
}

fn smallest_path<'a>(group: &DuplicateGroup, blocks: &'a [Block]) -> &'a str {
    group
        .members
        .iter()
        .map(|&idx| blocks[idx as usize].file_name.as_str())
        .min()
        .unwrap_or("")
}

/// Headline numbers for the human-readable output.
pub struct ScanMetrics {
    pub files_scanned: usize,
    pub blocks_analyzed: usize,
    pub cancelled: bool,
}

/// Maximum duplicate groups shown by default (use `--show-all` to override).
pub const DEFAULT_GROUP_LIMIT: usize = 20;

/// Compute how many duplicate groups to display based on the `--show-all` flag.
pub fn display_limit(total: usize, show_all: bool) -> usize {
    if show_all {
        total
    } else {
        DEFAULT_GROUP_LIMIT.min(total)
    }
}

/// Print the summary block: headline counts plus the per-type breakdown.
pub fn print_summary(metrics: &ScanMetrics, report: &Report) {
    let separator = report_helpers::separator(68);

    println!("{separator}");
    println!(" Duplicate Pattern Analysis");
    if metrics.cancelled {
        println!(" (cancelled — partial results)");
    }
    println!();
    println!(" Files scanned:        {:>42}", metrics.files_scanned);
    println!(" Blocks analyzed:      {:>42}", metrics.blocks_analyzed);
    println!(" Duplicate groups:     {:>42}", report.summary.total_patterns);
    println!(" Redundant tokens:     {:>42}", report.summary.total_token_cost);

    if !report.summary.patterns_by_type.is_empty() {
        println!();
        println!(" Patterns by type:");
        for (pattern_type, count) in &report.summary.patterns_by_type {
            println!("   {pattern_type:<14} {count:>5}");
        }
    }
    println!("{separator}");
}

/// Print the summary followed by a detailed listing of each duplicate
/// group with severity, locations, and cost.
pub fn print_detailed(metrics: &ScanMetrics, report: &Report, show_all: bool) {
    print_summary(metrics, report);

    let total = report.summary.top_duplicates.len();
    if total == 0 {
        return;
    }
    let limit = display_limit(total, show_all);
    let separator = report_helpers::separator(68);

    println!();
    println!(" Top duplicates (sorted by redundant tokens)");

    for (i, dup) in report.summary.top_duplicates[..limit].iter().enumerate() {
        let severity = Severity::from_similarity(dup.similarity);
        println!();
        println!("{separator}");
        println!(
            " [{}] {}: {} × {} ({:.0}% similar, ~{} redundant tokens)",
            i + 1,
            severity.as_str().to_uppercase(),
            dup.files.len(),
            dup.pattern_type.as_str(),
            dup.similarity * 100.0,
            dup.token_cost
        );
        println!();
        for file in &dup.files {
            println!("   {}:{}-{}", file.path, file.start_line, file.end_line);
        }
    }

    println!("{separator}");

    if !report.results.is_empty() {
        let width = report_helpers::max_name_width(
            report.results.iter().map(|r| r.file_name.as_str()),
            12,
        );
        println!();
        println!(" Issues by file");
        for result in &report.results {
            println!(
                "   {:<width$} {:>4} issue(s)",
                result.file_name,
                result.issues.len(),
                width = width
            );
        }
    }

    if limit < total {
        println!();
        println!(" Showing top {limit} of {total} duplicate groups.");
        println!(" Use --show-all to see all groups.");
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
