use super::*;
use crate::parse::{SourceUnit, UnitKind};
use std::fs;

fn parsed(name: &str, source: &str) -> ParsedFile {
    let spec = lang::detect(Path::new(name)).unwrap();
    parse::parse_source(name.to_string(), source, spec)
}

const SYNC_A: &str = "\
fn sync_inventory(store: &Store) -> Result<(), Error> {
    let snapshot = store.snapshot();
    for entry in snapshot.entries() {
        if entry.is_stale() {
            store.refresh(entry.id())?;
        }
        if entry.qty() < 3 {
            store.reorder(entry.id(), 3)?;
        }
    }
    store.commit()
}
";

// Identical to SYNC_A except a renamed local and a changed literal.
const SYNC_B: &str = "\
fn sync_inventory(store: &Store) -> Result<(), Error> {
    let snap = store.snapshot();
    for entry in snap.entries() {
        if entry.is_stale() {
            store.refresh(entry.id())?;
        }
        if entry.qty() < 9 {
            store.reorder(entry.id(), 9)?;
        }
    }
    store.commit()
}
";

fn validator(name: &str) -> String {
    format!(
        "def {name}(value):\n\
         \x20   if not value:\n\
         \x20       return False\n\
         \x20   if \"@\" not in value:\n\
         \x20       return False\n\
         \x20   return len(value) < 255\n"
    )
}

#[test]
fn renamed_copy_forms_one_high_similarity_group() {
    let files = vec![parsed("a.rs", SYNC_A), parsed("b.rs", SYNC_B)];
    let detection = detect(&files, &DetectConfig::default(), &ScanHooks::default());

    assert_eq!(detection.groups.len(), 1);
    let group = &detection.groups[0];
    assert_eq!(group.members.len(), 2);
    assert!(
        group.representative_similarity >= 0.9,
        "similarity {} below 0.9",
        group.representative_similarity
    );
    assert!(group.severity >= Severity::Major);
    assert!(group.token_cost > 0);
}

#[test]
fn blocks_below_min_lines_produce_empty_report() {
    let short = "fn tiny() {\n    work();\n}\n"; // 3 lines < 5
    let files = vec![
        parsed("a.rs", short),
        parsed("b.rs", short),
        parsed("c.rs", short),
    ];
    let detection = detect(&files, &DetectConfig::default(), &ScanHooks::default());

    assert!(detection.blocks.is_empty());
    assert!(detection.groups.is_empty());
    let report = assemble(&detection.blocks, &detection.groups);
    assert_eq!(report.summary.total_patterns, 0);
    assert!(report.results.is_empty());
}

#[test]
fn three_scattered_validators_form_one_group() {
    let files = vec![
        parsed("auth.py", &validator("validate_email")),
        parsed("signup.py", &validator("validate_contact")),
        parsed("billing.py", &validator("validate_recipient")),
    ];
    let detection = detect(&files, &DetectConfig::default(), &ScanHooks::default());

    // One coherent finding with three members, not three pairwise issues.
    assert_eq!(detection.groups.len(), 1);
    let group = &detection.groups[0];
    assert_eq!(group.members.len(), 3);
    assert_eq!(group.pattern_type, PatternType::Validator);
}

#[test]
fn perfect_threshold_with_no_identical_blocks_finds_nothing() {
    let files = vec![parsed("a.rs", SYNC_A), parsed("b.rs", SYNC_B)];
    let config = DetectConfig {
        min_similarity: 1.0,
        ..Default::default()
    };
    let detection = detect(&files, &config, &ScanHooks::default());

    assert!(detection.groups.is_empty());
    let report = assemble(&detection.blocks, &detection.groups);
    assert!(report.summary.top_duplicates.is_empty());
    assert_eq!(report.summary.total_patterns, 0);
}

#[test]
fn exact_copies_match_at_threshold_one() {
    let files = vec![parsed("a.rs", SYNC_A), parsed("b.rs", SYNC_A)];
    let config = DetectConfig {
        min_similarity: 1.0,
        ..Default::default()
    };
    let detection = detect(&files, &config, &ScanHooks::default());
    // Ties at the threshold are included.
    assert_eq!(detection.groups.len(), 1);
    assert_eq!(detection.groups[0].representative_similarity, 1.0);
    assert_eq!(detection.groups[0].severity, Severity::Critical);
}

fn mixed_corpus() -> Vec<ParsedFile> {
    let moderate_a = "\
fn render_header(out: &mut String, title: &str) {
    out.push_str(title);
    out.push_str(separator());
    append_meta(out, title);
    finish_section(out);
    trim_trailing(out);
}
";
    let moderate_b = "\
fn render_footer(out: &mut String, notes: &str) {
    out.push_str(notes);
    out.push_str(separator());
    append_links(out, notes);
    finish_section(out);
    pad_bottom(out);
}
";
    let unrelated = "\
struct Ring {
    head: usize,
    tail: usize,
    data: Vec<u8>,
    mask: usize,
    len: usize,
}
";
    vec![
        parsed("a.rs", SYNC_A),
        parsed("b.rs", SYNC_B),
        parsed("hdr.rs", moderate_a),
        parsed("ftr.rs", moderate_b),
        parsed("ring.rs", unrelated),
        parsed("vald.py", &validator("validate_email")),
        parsed("valc.py", &validator("validate_contact")),
    ]
}

fn group_keys(groups: &[DuplicateGroup]) -> Vec<(Vec<u32>, u64)> {
    groups
        .iter()
        .map(|g| (g.members.clone(), g.representative_similarity.to_bits()))
        .collect()
}

#[test]
fn approximate_and_exhaustive_modes_agree() {
    let files = mixed_corpus();
    let exhaustive = DetectConfig {
        approx: false,
        ..Default::default()
    };
    let approximate = DetectConfig {
        approx: true,
        min_shared_tokens: 1,
        max_candidates_per_block: usize::MAX,
        ..Default::default()
    };

    let a = detect(&files, &exhaustive, &ScanHooks::default());
    let b = detect(&files, &approximate, &ScanHooks::default());
    assert_eq!(group_keys(&a.groups), group_keys(&b.groups));
    assert!(!a.groups.is_empty());
}

#[test]
fn batch_size_never_changes_results() {
    let files = mixed_corpus();
    let baseline = detect(&files, &DetectConfig::default(), &ScanHooks::default());

    for batch_size in [1, 2, 3, 1000] {
        let config = DetectConfig {
            batch_size,
            ..Default::default()
        };
        let detection = detect(&files, &config, &ScanHooks::default());
        assert_eq!(
            group_keys(&baseline.groups),
            group_keys(&detection.groups),
            "batch size {batch_size} changed the result"
        );
    }
}

#[test]
fn detection_is_deterministic_and_idempotent() {
    let files = mixed_corpus();
    let config = DetectConfig::default();

    let first = detect(&files, &config, &ScanHooks::default());
    let second = detect(&files, &config, &ScanHooks::default());

    let report_a = serde_json::to_string(&assemble(&first.blocks, &first.groups)).unwrap();
    let report_b = serde_json::to_string(&assemble(&second.blocks, &second.groups)).unwrap();
    assert_eq!(report_a, report_b);
}

#[test]
fn thresholds_hold_for_all_output() {
    let files = mixed_corpus();
    let config = DetectConfig::default();
    let detection = detect(&files, &config, &ScanHooks::default());

    for block in &detection.blocks {
        assert!(block.line_count >= config.min_lines);
    }
    for group in &detection.groups {
        assert!(group.members.len() >= 2);
        assert!(group.representative_similarity >= config.min_similarity);
        // token_cost is sum minus max, so this also guards the aggregation.
        let sum: usize = group
            .members
            .iter()
            .map(|&i| detection.blocks[i as usize].token_count)
            .sum();
        let max: usize = group
            .members
            .iter()
            .map(|&i| detection.blocks[i as usize].token_count)
            .max()
            .unwrap();
        assert_eq!(group.token_cost, sum - max);
    }
}

#[test]
fn zero_token_blocks_never_match() {
    let empty_unit = SourceUnit {
        kind: UnitKind::Function,
        name: Some("ghost".to_string()),
        decorators: Vec::new(),
        param_count: 0,
        returns_value: false,
        has_markup: false,
        start_line: 1,
        end_line: 10,
        tokens: Vec::new(),
    };
    let files = vec![
        ParsedFile {
            file_name: "a.rs".to_string(),
            units: vec![empty_unit.clone()],
        },
        ParsedFile {
            file_name: "b.rs".to_string(),
            units: vec![empty_unit],
        },
    ];
    // Even a zero threshold must not pair empty blocks.
    let config = DetectConfig {
        min_similarity: 0.0,
        ..Default::default()
    };
    let detection = detect(&files, &config, &ScanHooks::default());
    assert_eq!(detection.blocks.len(), 2);
    assert!(detection.groups.is_empty());

    let exhaustive = DetectConfig {
        min_similarity: 0.0,
        approx: false,
        ..Default::default()
    };
    assert!(detect(&files, &exhaustive, &ScanHooks::default()).groups.is_empty());
}

#[test]
fn cancellation_returns_partial_but_well_formed_result() {
    let files = mixed_corpus();
    let cancel = AtomicBool::new(true);
    let hooks = ScanHooks {
        cancel: Some(&cancel),
        ..Default::default()
    };
    let detection = detect(&files, &DetectConfig::default(), &hooks);

    assert!(detection.cancelled);
    assert!(detection.groups.is_empty());
    // Extraction already ran; the result is consistent, just incomplete.
    assert!(!detection.blocks.is_empty());
    let report = assemble(&detection.blocks, &detection.groups);
    assert_eq!(report.summary.total_patterns, 0);
}

#[test]
fn progress_and_batch_hooks_fire() {
    use std::sync::Mutex;

    let files = mixed_corpus();
    let stages: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let batches: Mutex<Vec<usize>> = Mutex::new(Vec::new());

    let progress = |_done: usize, _total: usize, stage: &str| {
        let mut stages = stages.lock().unwrap();
        if stages.last().map(String::as_str) != Some(stage) {
            stages.push(stage.to_string());
        }
    };
    let on_batch = |update: BatchUpdate| {
        batches.lock().unwrap().push(update.batch);
    };
    let hooks = ScanHooks {
        progress: Some(&progress),
        on_batch: Some(&on_batch),
        cancel: None,
    };
    let config = DetectConfig {
        batch_size: 2,
        ..Default::default()
    };
    detect(&files, &config, &hooks);

    let stages = stages.into_inner().unwrap();
    assert!(stages.contains(&"extracting blocks".to_string()));
    assert!(stages.contains(&"scoring candidates".to_string()));

    let batches = batches.into_inner().unwrap();
    assert!(!batches.is_empty());
    assert_eq!(*batches.last().unwrap(), batches.len());
}

// --- run(): end-to-end over a real directory tree ---

fn quiet_options() -> RunOptions {
    RunOptions {
        no_progress: true,
        ..Default::default()
    }
}

#[test]
fn run_reports_duplicates_across_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.rs"), SYNC_A).unwrap();
    fs::write(dir.path().join("b.rs"), SYNC_B).unwrap();

    let cancel = AtomicBool::new(false);
    let status = run(
        dir.path(),
        &ConfigOverlay::default(),
        &quiet_options(),
        &cancel,
    )
    .unwrap();

    assert_eq!(status.total_issues, 2);
    assert!(status.worst_severity >= Some(Severity::Major));
    assert!(!status.degraded);
    assert!(!status.cancelled);
}

#[test]
fn run_missing_root_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let cancel = AtomicBool::new(false);
    assert!(run(&missing, &ConfigOverlay::default(), &quiet_options(), &cancel).is_err());
}

#[test]
fn run_zero_readable_files_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "not source").unwrap();

    let cancel = AtomicBool::new(false);
    assert!(run(dir.path(), &ConfigOverlay::default(), &quiet_options(), &cancel).is_err());
}

#[test]
fn run_unreadable_file_degrades_not_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.rs"), SYNC_A).unwrap();
    fs::write(dir.path().join("b.rs"), SYNC_B).unwrap();
    // Invalid UTF-8 in a recognized extension: read fails, scan continues.
    fs::write(dir.path().join("bad.rs"), [0x66u8, 0x6e, 0x20, 0xff, 0xfe]).unwrap();

    let cancel = AtomicBool::new(false);
    let status = run(
        dir.path(),
        &ConfigOverlay::default(),
        &quiet_options(),
        &cancel,
    )
    .unwrap();

    assert!(status.degraded);
    assert_eq!(status.total_issues, 2);
}

#[test]
fn run_clean_tree_has_no_issues() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.rs"), SYNC_A).unwrap();

    let cancel = AtomicBool::new(false);
    let status = run(
        dir.path(),
        &ConfigOverlay::default(),
        &quiet_options(),
        &cancel,
    )
    .unwrap();

    assert_eq!(status.total_issues, 0);
    assert_eq!(status.worst_severity, None);
}

#[test]
fn run_excludes_test_files_by_default() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("lib.rs"), SYNC_A).unwrap();
    fs::write(dir.path().join("a_test.rs"), SYNC_A).unwrap();
    fs::write(dir.path().join("b_test.rs"), SYNC_A).unwrap();

    let cancel = AtomicBool::new(false);
    let status = run(
        dir.path(),
        &ConfigOverlay::default(),
        &quiet_options(),
        &cancel,
    )
    .unwrap();
    assert_eq!(status.total_issues, 0);

    let include_tests = RunOptions {
        include_tests: true,
        ..quiet_options()
    };
    let status = run(dir.path(), &ConfigOverlay::default(), &include_tests, &cancel).unwrap();
    assert_eq!(status.total_issues, 3);
}

#[test]
fn run_applies_exclude_globs() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("vendor")).unwrap();
    fs::write(dir.path().join("a.rs"), SYNC_A).unwrap();
    fs::write(dir.path().join("vendor/b.rs"), SYNC_B).unwrap();

    let cancel = AtomicBool::new(false);
    let overlay = ConfigOverlay {
        exclude: Some(vec!["vendor/**".to_string()]),
        ..Default::default()
    };
    let status = run(dir.path(), &overlay, &quiet_options(), &cancel).unwrap();
    assert_eq!(status.total_issues, 0);
}

#[test]
fn run_invalid_glob_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.rs"), SYNC_A).unwrap();

    let cancel = AtomicBool::new(false);
    let overlay = ConfigOverlay {
        include: Some(vec!["[".to_string()]),
        ..Default::default()
    };
    assert!(run(dir.path(), &overlay, &quiet_options(), &cancel).is_err());
}

#[test]
fn run_config_file_overlay_applies() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.rs"), SYNC_A).unwrap();
    fs::write(dir.path().join("b.rs"), SYNC_B).unwrap();
    // An impossible threshold from the config file silences the finding.
    fs::write(dir.path().join(config::CONFIG_FILE), "min_similarity = 1.0\n").unwrap();

    let cancel = AtomicBool::new(false);
    let status = run(
        dir.path(),
        &ConfigOverlay::default(),
        &quiet_options(),
        &cancel,
    )
    .unwrap();
    assert_eq!(status.total_issues, 0);
}

#[test]
fn run_json_mode_prints_report() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.rs"), SYNC_A).unwrap();
    fs::write(dir.path().join("b.rs"), SYNC_B).unwrap();

    let cancel = AtomicBool::new(false);
    let options = RunOptions {
        json: true,
        ..quiet_options()
    };
    let status = run(dir.path(), &ConfigOverlay::default(), &options, &cancel).unwrap();
    assert_eq!(status.total_issues, 2);
}
