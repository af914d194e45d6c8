use std::path::Path;

/// Static description of a language's surface syntax, covering just what the
/// tokenizer and unit extractor need: comment markers, string flavor, how
/// blocks are delimited, and which keywords introduce functions and classes.
#[derive(Debug)]
pub struct LanguageSpec {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub line_comments: &'static [&'static str],
    pub block_comment: Option<(&'static str, &'static str)>,
    pub nested_block_comments: bool,
    pub triple_quote_strings: bool,
    /// Single quotes delimit strings (not chars/lifetimes).
    pub single_quote_strings: bool,
    /// Blocks delimited by indentation rather than braces.
    pub indent_blocks: bool,
    /// Keywords that introduce a function or method definition.
    pub fn_keywords: &'static [&'static str],
    /// Keywords that introduce a method container (class-like scope).
    pub class_keywords: &'static [&'static str],
    /// Recognize `name(args) {` definitions with no introducing keyword.
    pub bare_definitions: bool,
    pub shebangs: &'static [&'static str],
}

pub const LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec {
        name: "Rust",
        extensions: &["rs"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: true,
        triple_quote_strings: false,
        single_quote_strings: false,
        indent_blocks: false,
        fn_keywords: &["fn"],
        class_keywords: &["impl", "trait"],
        bare_definitions: false,
        shebangs: &[],
    },
    LanguageSpec {
        name: "Python",
        extensions: &["py", "pyi"],
        line_comments: &["#"],
        block_comment: None,
        nested_block_comments: false,
        triple_quote_strings: true,
        single_quote_strings: true,
        indent_blocks: true,
        fn_keywords: &["def"],
        class_keywords: &["class"],
        bare_definitions: false,
        shebangs: &["python", "python3"],
    },
    LanguageSpec {
        name: "JavaScript",
        extensions: &["js", "jsx", "mjs", "cjs"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: false,
        triple_quote_strings: false,
        single_quote_strings: true,
        indent_blocks: false,
        fn_keywords: &["function"],
        class_keywords: &["class"],
        bare_definitions: false,
        shebangs: &["node"],
    },
    LanguageSpec {
        name: "TypeScript",
        extensions: &["ts", "tsx", "mts", "cts"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: false,
        triple_quote_strings: false,
        single_quote_strings: true,
        indent_blocks: false,
        fn_keywords: &["function"],
        class_keywords: &["class", "interface"],
        bare_definitions: false,
        shebangs: &[],
    },
    LanguageSpec {
        name: "Go",
        extensions: &["go"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: false,
        triple_quote_strings: false,
        single_quote_strings: false,
        indent_blocks: false,
        fn_keywords: &["func"],
        class_keywords: &[],
        bare_definitions: false,
        shebangs: &[],
    },
    LanguageSpec {
        name: "Java",
        extensions: &["java"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: false,
        triple_quote_strings: false,
        single_quote_strings: false,
        indent_blocks: false,
        fn_keywords: &[],
        class_keywords: &["class", "interface"],
        bare_definitions: true,
        shebangs: &[],
    },
    LanguageSpec {
        name: "C",
        extensions: &["c", "h"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: false,
        triple_quote_strings: false,
        single_quote_strings: false,
        indent_blocks: false,
        fn_keywords: &[],
        class_keywords: &[],
        bare_definitions: true,
        shebangs: &[],
    },
    LanguageSpec {
        name: "C++",
        extensions: &["cc", "cpp", "cxx", "hpp", "hh"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: false,
        triple_quote_strings: false,
        single_quote_strings: false,
        indent_blocks: false,
        fn_keywords: &[],
        class_keywords: &["class", "struct"],
        bare_definitions: true,
        shebangs: &[],
    },
    LanguageSpec {
        name: "C#",
        extensions: &["cs"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: false,
        triple_quote_strings: false,
        single_quote_strings: false,
        indent_blocks: false,
        fn_keywords: &[],
        class_keywords: &["class", "interface"],
        bare_definitions: true,
        shebangs: &[],
    },
    LanguageSpec {
        name: "Kotlin",
        extensions: &["kt", "kts"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: true,
        triple_quote_strings: true,
        single_quote_strings: false,
        indent_blocks: false,
        fn_keywords: &["fun"],
        class_keywords: &["class", "interface", "object"],
        bare_definitions: false,
        shebangs: &[],
    },
    LanguageSpec {
        name: "Swift",
        extensions: &["swift"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: true,
        triple_quote_strings: true,
        single_quote_strings: false,
        indent_blocks: false,
        fn_keywords: &["func"],
        class_keywords: &["class", "extension", "protocol"],
        bare_definitions: false,
        shebangs: &[],
    },
    LanguageSpec {
        name: "PHP",
        extensions: &["php"],
        line_comments: &["//", "#"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: false,
        triple_quote_strings: false,
        single_quote_strings: true,
        indent_blocks: false,
        fn_keywords: &["function"],
        class_keywords: &["class", "interface", "trait"],
        bare_definitions: false,
        shebangs: &["php"],
    },
    LanguageSpec {
        name: "Scala",
        extensions: &["scala"],
        line_comments: &["//"],
        block_comment: Some(("/*", "*/")),
        nested_block_comments: true,
        triple_quote_strings: true,
        single_quote_strings: false,
        indent_blocks: false,
        fn_keywords: &["def"],
        class_keywords: &["class", "object", "trait"],
        bare_definitions: false,
        shebangs: &[],
    },
];

/// Detect a language by file extension.
pub fn detect(path: &Path) -> Option<&'static LanguageSpec> {
    let ext = path.extension()?.to_str()?;
    LANGUAGES
        .iter()
        .find(|spec| spec.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Detect a language from a shebang line (`#!/usr/bin/env python3` etc.).
pub fn detect_by_shebang(first_line: &str) -> Option<&'static LanguageSpec> {
    let line = first_line.trim();
    if !line.starts_with("#!") {
        return None;
    }
    let interpreter = line
        .trim_start_matches("#!")
        .split_whitespace()
        .flat_map(|part| part.rsplit('/').next())
        .find(|part| *part != "env")?;
    LANGUAGES.iter().find(|spec| {
        spec.shebangs
            .iter()
            .any(|sh| interpreter == *sh || interpreter.starts_with(sh))
    })
}
