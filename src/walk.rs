use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::lang::{LanguageSpec, detect_by_shebang};

/// Test directory names to exclude unless `--include-tests` is active.
pub const TEST_DIRS: &[&str] = &["tests", "test", "__tests__", "spec"];

/// Check whether a file matches a test naming pattern based on its extension.
pub fn is_test_file(path: &Path) -> bool {
    let file_name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };

    let Some(dot) = file_name.rfind('.') else {
        return false;
    };
    let ext = &file_name[dot + 1..];
    let base = &file_name[..dot];

    match ext {
        "rs" | "go" => base.ends_with("_test"),
        "py" => base.starts_with("test_") || base.ends_with("_test"),
        "php" => base.ends_with("Test") || base.ends_with("_test"),
        "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "mts" | "cts" => {
            base.ends_with(".test") || base.ends_with(".spec")
        }
        "java" | "kt" | "kts" => base.ends_with("Test") || base.ends_with("Tests"),
        "cs" => base.ends_with("Test") || base.ends_with("Tests"),
        "swift" => base.ends_with("Test") || base.ends_with("Tests"),
        "scala" => base.ends_with("Test") || base.ends_with("Spec"),
        "c" | "h" => {
            base.ends_with("_test") || base.starts_with("test_") || base.ends_with("_unittest")
        }
        "cc" | "cpp" | "cxx" => {
            base.ends_with("_test")
                || base.starts_with("test_")
                || base.ends_with("_unittest")
                || base.ends_with("Test")
        }
        _ => false,
    }
}

/// Try to detect a language by reading the shebang line of a file.
pub fn try_detect_shebang(path: &Path) -> Option<&'static LanguageSpec> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut first_line = String::new();
    reader.read_line(&mut first_line).ok()?;
    detect_by_shebang(&first_line)
}

/// Include/exclude glob filter applied to paths relative to the scan root.
///
/// An empty include list means "everything"; exclude always wins over
/// include. Invalid patterns are a hard error: a mistyped glob silently
/// matching nothing would make the scan lie about coverage.
pub struct FileFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl FileFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, globset::Error> {
        Ok(Self {
            include: Self::build(include)?,
            exclude: Self::build(exclude)?,
        })
    }

    fn build(patterns: &[String]) -> Result<Option<GlobSet>, globset::Error> {
        if patterns.is_empty() {
            return Ok(None);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Some(builder.build()?))
    }

    pub fn matches(&self, relative: &str) -> bool {
        if let Some(exclude) = &self.exclude
            && exclude.is_match(relative)
        {
            return false;
        }
        match &self.include {
            Some(include) => include.is_match(relative),
            None => true,
        }
    }
}

/// Build a directory walker that respects `.gitignore`, skips `.git`,
/// and optionally excludes test directories.
pub fn walk(path: &Path, exclude_tests: bool) -> ignore::Walk {
    WalkBuilder::new(path)
        .hidden(false)
        .follow_links(false)
        .filter_entry(move |entry| {
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                if entry.file_name() == ".git" {
                    return false;
                }
                if exclude_tests
                    && let Some(name) = entry.file_name().to_str()
                    && TEST_DIRS.contains(&name)
                {
                    return false;
                }
            }
            true
        })
        .build()
}

#[cfg(test)]
#[path = "walk_test.rs"]
mod tests;
