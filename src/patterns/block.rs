use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::DetectConfig;
use crate::parse::{ParsedFile, SourceUnit, UnitKind};

/// Structural role of a block, inferred from language-neutral cues:
/// decorator names, parameter/return shape, naming pattern, markup output.
/// Never derived from language-specific syntax nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternType {
    ApiHandler,
    Validator,
    Utility,
    ClassMethod,
    Component,
    Function,
    Unknown,
}

impl PatternType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApiHandler => "api-handler",
            Self::Validator => "validator",
            Self::Utility => "utility",
            Self::ClassMethod => "class-method",
            Self::Component => "component",
            Self::Function => "function",
            Self::Unknown => "unknown",
        }
    }
}

/// One comparison unit: a function-sized span of code with its normalized
/// token multiset. Blocks are created once per scan and never mutated.
#[derive(Debug, Clone)]
pub struct Block {
    pub file_name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub line_count: usize,
    pub pattern_type: PatternType,
    /// Normalized token multiset as (token, count), sorted by token.
    pub tokens: Vec<(String, u32)>,
    /// Raw token stream length, used for cost estimation.
    pub token_count: usize,
}

impl Block {
    /// Stable identifier: path plus line span.
    pub fn id(&self) -> String {
        format!("{}:{}-{}", self.file_name, self.start_line, self.end_line)
    }
}

/// Decorator fragments that mark request-routing handlers.
const ROUTE_MARKERS: &[&str] = &[
    "route", "get", "post", "put", "delete", "patch", "mapping", "request", "http",
];

/// Name prefixes typical of small shared helpers.
const UTILITY_PREFIXES: &[&str] = &[
    "format", "parse", "convert", "build", "make", "merge", "normalize", "encode", "decode",
    "to_", "from_", "get_", "set_",
];

/// Classify a unit's structural role. Pure function over the unit summary;
/// the first matching rule wins, most specific first.
pub fn classify(unit: &SourceUnit) -> PatternType {
    let name = unit.name.as_deref().unwrap_or("");
    let lower = name.to_ascii_lowercase();

    let routed = unit.decorators.iter().any(|d| {
        let d = d.to_ascii_lowercase();
        ROUTE_MARKERS.iter().any(|m| d.contains(m))
    });
    if routed || lower.starts_with("handle") {
        return PatternType::ApiHandler;
    }

    let camel_predicate = (name.starts_with("is")
        && name.chars().nth(2).is_some_and(|c| c.is_ascii_uppercase()))
        || (name.starts_with("has")
            && name.chars().nth(3).is_some_and(|c| c.is_ascii_uppercase()));
    let predicate_name =
        lower.starts_with("is_") || lower.starts_with("has_") || camel_predicate;
    if lower.starts_with("validate")
        || lower.starts_with("check")
        || lower.starts_with("verify")
        || (predicate_name && unit.returns_value)
    {
        return PatternType::Validator;
    }

    if unit.has_markup && name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
        return PatternType::Component;
    }

    if unit.kind == UnitKind::Method {
        return PatternType::ClassMethod;
    }

    if UTILITY_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return PatternType::Utility;
    }

    if name.is_empty() {
        PatternType::Unknown
    } else {
        PatternType::Function
    }
}

/// Extract blocks from one parsed file. Units below the `min_lines` floor
/// are discarded; a unit with an inverted line range is dropped with a
/// warning rather than poisoning the scan.
pub fn blocks_for_file(file: &ParsedFile, config: &DetectConfig) -> (Vec<Block>, Vec<String>) {
    let mut blocks = Vec::new();
    let mut warnings = Vec::new();

    for unit in &file.units {
        if unit.end_line < unit.start_line {
            warnings.push(format!(
                "{}: dropped block with inverted line range {}-{}",
                file.file_name, unit.start_line, unit.end_line
            ));
            continue;
        }
        let line_count = unit.end_line - unit.start_line + 1;
        if line_count < config.min_lines {
            continue;
        }

        let mut multiset: BTreeMap<String, u32> = BTreeMap::new();
        for token in &unit.tokens {
            *multiset.entry(token.text.clone()).or_default() += 1;
        }

        blocks.push(Block {
            file_name: file.file_name.clone(),
            start_line: unit.start_line,
            end_line: unit.end_line,
            line_count,
            pattern_type: classify(unit),
            token_count: unit.tokens.len(),
            tokens: multiset.into_iter().collect(),
        });
    }

    (blocks, warnings)
}

#[cfg(test)]
#[path = "block_test.rs"]
mod tests;
