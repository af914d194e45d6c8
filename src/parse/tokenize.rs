use crate::lang::LanguageSpec;

/// Placeholder for any numeric literal. Folding literals keeps renamed
/// constants from defeating similarity while structure still has to agree.
pub const NUM_TOKEN: &str = "<num>";
/// Placeholder for any string or character literal.
pub const STR_TOKEN: &str = "<str>";

/// One normalized lexical token with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line: usize,
}

impl Token {
    fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }
}

/// Multi-character operators emitted as a single token. Order matters only
/// for overlapping prefixes; all entries are two bytes.
const TWO_CHAR_OPS: &[&str] = &[
    "->", "=>", "==", "!=", "<=", ">=", "::", "&&", "||", "+=", "-=", "*=", "/=", "</", "/>",
];

/// Lex source text into a normalized token stream.
///
/// Identifiers and keywords are kept verbatim (identity matters for
/// similarity), numeric literals fold to [`NUM_TOKEN`], string and char
/// literals to [`STR_TOKEN`], comments and whitespace are dropped, and
/// punctuation is kept one operator per token. The result is deterministic
/// for a given input and language.
pub fn tokenize(source: &str, spec: &LanguageSpec) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0usize;
    let mut line = 1usize;

    while i < bytes.len() {
        let b = bytes[i];

        if b == b'\n' {
            line += 1;
            i += 1;
            continue;
        }
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if let Some(len) = line_comment_len(&source[i..], spec) {
            i += len;
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        if let Some((open, close)) = spec.block_comment
            && source[i..].starts_with(open)
        {
            i = skip_block_comment(source, i, open, close, spec.nested_block_comments, &mut line);
            continue;
        }

        if b == b'"' || b == b'\'' {
            let start_line = line;
            if let Some(next) = scan_string(source, i, spec, &mut line) {
                tokens.push(Token::new(STR_TOKEN, start_line));
                i = next;
                continue;
            }
            // Unmatched quote character (e.g. a Rust lifetime tick):
            // falls through to punctuation.
        }

        if b.is_ascii_alphabetic() || b == b'_' || !b.is_ascii() {
            let start = i;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || !bytes[i].is_ascii())
            {
                i += 1;
            }
            tokens.push(Token::new(&source[start..i], line));
            continue;
        }

        if b.is_ascii_digit() {
            i += 1;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.' || bytes[i] == b'_')
            {
                i += 1;
            }
            tokens.push(Token::new(NUM_TOKEN, line));
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1].is_ascii() {
            let pair = &source[i..i + 2];
            if TWO_CHAR_OPS.contains(&pair) {
                tokens.push(Token::new(pair, line));
                i += 2;
                continue;
            }
        }

        tokens.push(Token::new(&source[i..i + 1], line));
        i += 1;
    }

    tokens
}

fn line_comment_len(rest: &str, spec: &LanguageSpec) -> Option<usize> {
    spec.line_comments
        .iter()
        .find(|marker| rest.starts_with(*marker))
        .map(|marker| marker.len())
}

fn skip_block_comment(
    source: &str,
    start: usize,
    open: &str,
    close: &str,
    nested: bool,
    line: &mut usize,
) -> usize {
    // Byte-wise scanning: comment content may stop `i` mid-codepoint, so
    // never reslice the str here.
    let bytes = source.as_bytes();
    let open = open.as_bytes();
    let close = close.as_bytes();
    let mut i = start + open.len();
    let mut depth = 1usize;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            *line += 1;
            i += 1;
            continue;
        }
        if nested && bytes[i..].starts_with(open) {
            depth += 1;
            i += open.len();
            continue;
        }
        if bytes[i..].starts_with(close) {
            depth -= 1;
            i += close.len();
            if depth == 0 {
                return i;
            }
            continue;
        }
        i += 1;
    }
    i
}

/// Scan a string literal starting at `start`; returns the index past the
/// closing quote, or `None` when this quote does not open a string (single
/// quotes in languages where they mean lifetimes or labels).
fn scan_string(source: &str, start: usize, spec: &LanguageSpec, line: &mut usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let quote = bytes[start];

    if quote == b'\'' && !spec.single_quote_strings {
        // Char literal: only 'x' or a short escape like '\n' counts.
        let close = find_close(bytes, start + 1, quote);
        return match close {
            Some(end) if end - start <= 4 => Some(end + 1),
            _ => None,
        };
    }

    if spec.triple_quote_strings
        && start + 2 < bytes.len()
        && bytes[start + 1] == quote
        && bytes[start + 2] == quote
    {
        let delim = [quote; 3];
        let mut i = start + 3;
        while i < bytes.len() {
            if bytes[i] == b'\n' {
                *line += 1;
            }
            if bytes[i..].starts_with(&delim) {
                return Some(i + 3);
            }
            i += 1;
        }
        return Some(i);
    }

    let mut i = start + 1;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\n' {
            *line += 1;
        }
        if c == b'\\' && i + 1 < bytes.len() {
            i += 2;
            continue;
        }
        if c == quote {
            return Some(i + 1);
        }
        i += 1;
    }
    Some(i)
}

fn find_close(bytes: &[u8], mut i: usize, quote: u8) -> Option<usize> {
    while i < bytes.len() && bytes[i] != b'\n' {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
#[path = "tokenize_test.rs"]
mod tests;
