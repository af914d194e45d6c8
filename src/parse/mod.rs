//! Source parsing collaborator: turns raw files into the structural unit
//! streams the pattern engine consumes. The engine itself never sees
//! language-specific syntax, only [`SourceUnit`] values.

mod tokenize;
mod units;

pub use tokenize::{NUM_TOKEN, STR_TOKEN, Token, tokenize};
pub use units::{SourceUnit, UnitKind, extract_units};

use crate::lang::LanguageSpec;

/// One parsed source file: its display name plus all extracted units.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub file_name: String,
    pub units: Vec<SourceUnit>,
}

/// Parse source text into the unit stream for one file.
pub fn parse_source(file_name: String, source: &str, spec: &LanguageSpec) -> ParsedFile {
    ParsedFile {
        units: extract_units(source, spec),
        file_name,
    }
}
