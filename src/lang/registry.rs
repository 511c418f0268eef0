//! Factory utilities for the tree-sitter grammars we parse with.

use tree_sitter::Language;

use crate::core::errors::{MvpkgError, Result};

/// Get tree-sitter language for a given language key
pub fn get_tree_sitter_language(language_key: &str) -> Result<Language> {
    match normalize_language_key(language_key) {
        Some("go") => Ok(tree_sitter_go::LANGUAGE.into()),
        _ => Err(MvpkgError::parse(
            language_key,
            format!("No tree-sitter grammar for: {}", language_key),
        )),
    }
}

/// Create a new parser for the given language
pub fn create_parser_for_language(language_key: &str) -> Result<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    let tree_sitter_language = get_tree_sitter_language(language_key)?;
    parser.set_language(&tree_sitter_language).map_err(|e| {
        MvpkgError::parse(
            language_key,
            format!("Failed to set parser language: {}", e),
        )
    })?;
    Ok(parser)
}

/// Normalizes a language identifier to its canonical key.
fn normalize_language_key(language: &str) -> Option<&'static str> {
    match language.to_ascii_lowercase().as_str() {
        "go" | "golang" => Some("go"),
        _ => None,
    }
}
