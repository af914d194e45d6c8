use crate::lang::LanguageSpec;

use super::tokenize::{Token, tokenize};

/// Structural role of an extracted unit within its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Function,
    Method,
}

/// One comparable structural unit (function, method, component body) with
/// the cues later classification needs: decorators, parameter count, and
/// whether the unit produces a value or markup.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub kind: UnitKind,
    pub name: Option<String>,
    pub decorators: Vec<String>,
    pub param_count: usize,
    pub returns_value: bool,
    pub has_markup: bool,
    pub start_line: usize,
    pub end_line: usize,
    pub tokens: Vec<Token>,
}

/// Keywords that introduce control blocks, never definitions.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "for", "while", "switch", "match", "catch", "do", "loop", "select", "defer",
    "try", "synchronized", "unless", "return", "new", "sizeof",
];

/// Extract all function/method units from a source file.
///
/// Works on the normalized token stream, so comments and literal spelling
/// never influence unit boundaries. Nested definitions are emitted as
/// separate (overlapping) units.
pub fn extract_units(source: &str, spec: &LanguageSpec) -> Vec<SourceUnit> {
    let tokens = tokenize(source, spec);
    if tokens.is_empty() {
        return Vec::new();
    }
    if spec.indent_blocks {
        extract_indent_units(source, &tokens, spec)
    } else {
        extract_brace_units(&tokens, spec)
    }
}

fn is_ident(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
}

/// Find the token index of the closer matching `tokens[open_idx]`.
fn match_forward(tokens: &[Token], open_idx: usize, open: &str, close: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, token) in tokens[open_idx..].iter().enumerate() {
        if token.text == open {
            depth += 1;
        } else if token.text == close {
            depth -= 1;
            if depth == 0 {
                return Some(open_idx + offset);
            }
        }
    }
    None
}

/// Count parameters in a `(`..`)` slice: top-level commas plus one.
fn count_params(params: &[Token]) -> usize {
    if params.is_empty() {
        return 0;
    }
    let mut depth = 0usize;
    let mut commas = 0usize;
    for token in params {
        match token.text.as_str() {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            "," if depth == 0 => commas += 1,
            _ => {}
        }
    }
    commas + 1
}

fn body_returns_value(body: &[Token]) -> bool {
    body.windows(2)
        .any(|w| w[0].text == "return" && !matches!(w[1].text.as_str(), ";" | "}"))
}

/// Markup cue: the body contains tag-like token shapes (`<Name ... />` or a
/// closing `</`). Generics never produce the closing forms.
fn contains_markup(body: &[Token]) -> bool {
    let has_closer = body.iter().any(|t| t.text == "</" || t.text == "/>");
    has_closer
        && body
            .windows(2)
            .any(|w| w[0].text == "<" && is_ident(&w[1].text))
}

/// Collect a decorator name starting after `@` or inside `#[...]`: idents
/// joined across `.`/`::` up to the first argument list.
fn decorator_name(tokens: &[Token], start: usize, end: usize) -> Option<String> {
    let mut name = String::new();
    let mut i = start;
    while i < end {
        let text = tokens[i].text.as_str();
        if is_ident(text) || text == "." || text == "::" {
            name.push_str(text);
            i += 1;
        } else {
            break;
        }
    }
    if name.is_empty() { None } else { Some(name) }
}

struct HeadInfo {
    unit: SourceUnit,
    resume_at: usize,
}

fn extract_brace_units(tokens: &[Token], spec: &LanguageSpec) -> Vec<SourceUnit> {
    let containers = find_containers(tokens, spec);
    let in_container = |idx: usize| containers.iter().any(|&(open, close)| open < idx && idx < close);

    let mut units = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut i = 0usize;

    while i < tokens.len() {
        let text = tokens[i].text.as_str();

        if text == "@" && i + 1 < tokens.len() && is_ident(&tokens[i + 1].text) {
            if let Some(name) = decorator_name(tokens, i + 1, tokens.len()) {
                pending.push(name);
            }
            i += 2;
            continue;
        }
        if text == "#" && i + 1 < tokens.len() && tokens[i + 1].text == "[" {
            if let Some(close) = match_forward(tokens, i + 1, "[", "]") {
                if let Some(name) = tokens[i + 2..close]
                    .iter()
                    .position(|t| is_ident(&t.text))
                    .and_then(|p| decorator_name(tokens, i + 2 + p, close))
                {
                    pending.push(name);
                }
                i = close + 1;
                continue;
            }
        }

        if spec.fn_keywords.contains(&text)
            && let Some(info) = keyword_head(tokens, i, in_container(i), &mut pending)
        {
            let resume = info.resume_at;
            units.push(info.unit);
            i = resume;
            continue;
        }

        if (spec.bare_definitions || in_container(i))
            && is_ident(text)
            && !CONTROL_KEYWORDS.contains(&text)
            && !spec.class_keywords.contains(&text)
            && let Some(info) = bare_head(tokens, i, in_container(i), &mut pending)
        {
            let resume = info.resume_at;
            units.push(info.unit);
            i = resume;
            continue;
        }

        if text == ";" || text == "}" || spec.class_keywords.contains(&text) {
            pending.clear();
        }
        i += 1;
    }

    units
}

/// Class-like scopes (`class`/`impl`/`trait`/...) as token index ranges.
fn find_containers(tokens: &[Token], spec: &LanguageSpec) -> Vec<(usize, usize)> {
    let mut containers = Vec::new();
    let mut i = 0usize;
    while i < tokens.len() {
        if spec.class_keywords.contains(&tokens[i].text.as_str()) {
            let mut j = i + 1;
            while j < tokens.len() && tokens[j].text != "{" && tokens[j].text != ";" {
                j += 1;
            }
            if j < tokens.len()
                && tokens[j].text == "{"
                && let Some(close) = match_forward(tokens, j, "{", "}")
            {
                containers.push((j, close));
            }
            i = j + 1;
            continue;
        }
        i += 1;
    }
    containers
}

/// Parse a definition introduced by a function keyword (`fn`, `def`,
/// `func`, ...). `kw_idx` points at the keyword.
fn keyword_head(
    tokens: &[Token],
    kw_idx: usize,
    in_class: bool,
    pending: &mut Vec<String>,
) -> Option<HeadInfo> {
    let mut j = kw_idx + 1;
    let mut has_receiver = false;

    // Go-style receiver: `func (r *T) name(...)`.
    if j < tokens.len() && tokens[j].text == "(" {
        j = match_forward(tokens, j, "(", ")")? + 1;
        has_receiver = true;
    }

    let name = if j < tokens.len() && is_ident(&tokens[j].text) {
        let n = tokens[j].text.clone();
        j += 1;
        Some(n)
    } else {
        None
    };

    // Locate the parameter list, tolerating generics between name and `(`.
    let mut paren_open = None;
    let mut k = j;
    while k < tokens.len() && k < j + 64 {
        match tokens[k].text.as_str() {
            "(" => {
                paren_open = Some(k);
                break;
            }
            "{" | ";" | "}" | "=" => break,
            _ => k += 1,
        }
    }

    let (param_count, after_params) = match paren_open {
        Some(open) => {
            let close = match_forward(tokens, open, "(", ")")?;
            (count_params(&tokens[open + 1..close]), close)
        }
        // Parameterless expression body (`def run = {` and friends).
        None => (0, j.saturating_sub(1)),
    };

    let body_open = body_open_after(tokens, after_params)?;
    let body_close = match_forward(tokens, body_open, "{", "}")?;

    let signature = &tokens[kw_idx..body_open];
    let body = &tokens[body_open..=body_close];
    let returns_value = signature.iter().any(|t| t.text == "->")
        || tokens.get(after_params + 1).is_some_and(|t| t.text == ":")
        || body_returns_value(body);

    Some(HeadInfo {
        unit: SourceUnit {
            kind: if in_class || has_receiver {
                UnitKind::Method
            } else {
                UnitKind::Function
            },
            name,
            decorators: std::mem::take(pending),
            param_count,
            returns_value,
            has_markup: contains_markup(body),
            start_line: tokens[kw_idx].line,
            end_line: tokens[body_close].line,
            tokens: tokens[kw_idx..=body_close].to_vec(),
        },
        resume_at: after_params + 1,
    })
}

/// Parse a bare `name(args) { ... }` definition (C/Java-family methods).
fn bare_head(
    tokens: &[Token],
    name_idx: usize,
    in_class: bool,
    pending: &mut Vec<String>,
) -> Option<HeadInfo> {
    if name_idx > 0 {
        let prev = tokens[name_idx - 1].text.as_str();
        if matches!(prev, "." | "=" | "(" | "," | "@" | "new" | "return" | "::" | "->") {
            return None;
        }
    }
    if tokens.get(name_idx + 1).map(|t| t.text.as_str()) != Some("(") {
        return None;
    }
    let paren_close = match_forward(tokens, name_idx + 1, "(", ")")?;
    let body_open = body_open_after(tokens, paren_close)?;
    let body_close = match_forward(tokens, body_open, "{", "}")?;

    let body = &tokens[body_open..=body_close];
    // Return type is whatever identifier precedes the name; `void` means
    // no value.
    let typed_return = name_idx > 0
        && is_ident(&tokens[name_idx - 1].text)
        && tokens[name_idx - 1].text != "void";

    Some(HeadInfo {
        unit: SourceUnit {
            kind: if in_class {
                UnitKind::Method
            } else {
                UnitKind::Function
            },
            name: Some(tokens[name_idx].text.clone()),
            decorators: std::mem::take(pending),
            param_count: count_params(&tokens[name_idx + 2..paren_close]),
            returns_value: typed_return || body_returns_value(body),
            has_markup: contains_markup(body),
            start_line: tokens[name_idx].line,
            end_line: tokens[body_close].line,
            tokens: tokens[name_idx..=body_close].to_vec(),
        },
        resume_at: paren_close + 1,
    })
}

/// Step over a return annotation / throws clause to the body `{`.
/// `None` when a `;` intervenes (declaration without body).
fn body_open_after(tokens: &[Token], after: usize) -> Option<usize> {
    let mut j = after + 1;
    let limit = (after + 24).min(tokens.len());
    while j < limit {
        match tokens[j].text.as_str() {
            "{" => return Some(j),
            ";" | "=>" => return None,
            // Grouped return types like `-> (u32, u32)`.
            "(" => j = match_forward(tokens, j, "(", ")")? + 1,
            _ => j += 1,
        }
    }
    None
}

/// Indentation-delimited extraction (Python family).
fn extract_indent_units(source: &str, tokens: &[Token], spec: &LanguageSpec) -> Vec<SourceUnit> {
    const TAB_WIDTH: usize = 4;

    // Per-line indentation; None for blank lines.
    let indents: Vec<Option<usize>> = source
        .lines()
        .map(|l| {
            if l.trim().is_empty() {
                None
            } else {
                Some(
                    l.chars()
                        .take_while(|c| *c == ' ' || *c == '\t')
                        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
                        .sum(),
                )
            }
        })
        .collect();
    let indent_of = |line: usize| indents.get(line - 1).copied().flatten();

    let mut units = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut class_stack: Vec<usize> = Vec::new();
    let mut i = 0usize;

    while i < tokens.len() {
        let text = tokens[i].text.as_str();

        if text == "@" && i + 1 < tokens.len() && is_ident(&tokens[i + 1].text) {
            if let Some(name) = decorator_name(tokens, i + 1, tokens.len()) {
                pending.push(name);
            }
            i += 2;
            // Skip decorator arguments so their tokens are not re-scanned.
            while i < tokens.len() && matches!(tokens[i].text.as_str(), "." | "::") {
                i += 2;
            }
            if i < tokens.len() && tokens[i].text == "(" {
                match match_forward(tokens, i, "(", ")") {
                    Some(close) => i = close + 1,
                    None => i += 1,
                }
            }
            continue;
        }

        if spec.class_keywords.contains(&text) {
            let head_indent = indent_of(tokens[i].line).unwrap_or(0);
            while class_stack.last().is_some_and(|&ind| ind >= head_indent) {
                class_stack.pop();
            }
            class_stack.push(head_indent);
            pending.clear();
            i += 1;
            continue;
        }

        if spec.fn_keywords.contains(&text) {
            if let Some(info) = indent_head(tokens, i, &indents, &mut class_stack, &mut pending) {
                let resume = info.resume_at;
                units.push(info.unit);
                i = resume;
                continue;
            }
        }

        i += 1;
    }

    units
}

fn indent_head(
    tokens: &[Token],
    kw_idx: usize,
    indents: &[Option<usize>],
    class_stack: &mut Vec<usize>,
    pending: &mut Vec<String>,
) -> Option<HeadInfo> {
    let head_line = tokens[kw_idx].line;
    let head_indent = indents.get(head_line - 1).copied().flatten().unwrap_or(0);

    let name = tokens
        .get(kw_idx + 1)
        .filter(|t| is_ident(&t.text))
        .map(|t| t.text.clone());

    let (param_count, after_params) =
        if tokens.get(kw_idx + 2).map(|t| t.text.as_str()) == Some("(") {
            let close = match_forward(tokens, kw_idx + 2, "(", ")")?;
            (count_params(&tokens[kw_idx + 3..close]), close)
        } else {
            (0, kw_idx + 1)
        };

    // Signature ends at the colon after the parameter list.
    let colon_idx = tokens[after_params..]
        .iter()
        .position(|t| t.text == ":")
        .map(|p| after_params + p)?;
    let sig_end_line = tokens[colon_idx].line;

    // Body: maximal run of following lines indented deeper than the head.
    let mut end_line = sig_end_line;
    for line in sig_end_line + 1..=indents.len() {
        match indents[line - 1] {
            Some(ind) if ind > head_indent => end_line = line,
            Some(_) => break,
            None => {}
        }
    }

    let body_end_idx = tokens[colon_idx..]
        .iter()
        .position(|t| t.line > end_line)
        .map_or(tokens.len(), |p| colon_idx + p);
    let body = &tokens[colon_idx + 1..body_end_idx];
    let signature = &tokens[kw_idx..colon_idx];

    while class_stack.last().is_some_and(|&ind| ind >= head_indent) {
        class_stack.pop();
    }

    Some(HeadInfo {
        unit: SourceUnit {
            kind: if class_stack.is_empty() {
                UnitKind::Function
            } else {
                UnitKind::Method
            },
            name,
            decorators: std::mem::take(pending),
            param_count,
            returns_value: signature.iter().any(|t| t.text == "->") || body_returns_value(body),
            has_markup: contains_markup(body),
            start_line: head_line,
            end_line,
            tokens: tokens[kw_idx..body_end_idx].to_vec(),
        },
        resume_at: colon_idx + 1,
    })
}

#[cfg(test)]
#[path = "units_test.rs"]
mod tests;
