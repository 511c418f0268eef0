//! Go source handling with tree-sitter integration.
//!
//! Everything the mover needs to know about a Go file: its package clause,
//! its import specs, and how to rewrite them with byte-range edits that leave
//! the rest of the file untouched.

use std::ops::Range;
use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser, Tree};

use super::go_scope::{find_package_references, PackageReference};
use super::registry::create_parser_for_language;
use crate::core::errors::{MvpkgError, Result};

/// Suffix marking an external test package name or path.
pub const EXTERNAL_TEST_SUFFIX: &str = "_test";

/// Go parser wrapper, reused across files.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Create a new Go parser
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: create_parser_for_language("go")?,
        })
    }

    /// Parse a file, tolerating syntax errors outside the header.
    pub fn parse(&mut self, source: String, file_path: &Path) -> Result<GoSourceFile> {
        let tree = self.parser.parse(&source, None).ok_or_else(|| {
            MvpkgError::parse_with_location(
                "go",
                "Failed to parse Go source",
                file_path.display().to_string(),
                None,
                None,
            )
        })?;

        Ok(GoSourceFile {
            source,
            tree,
            path: file_path.to_path_buf(),
        })
    }

    /// Parse a file and reject it if the tree contains any syntax error.
    pub fn parse_strict(&mut self, source: String, file_path: &Path) -> Result<GoSourceFile> {
        let file = self.parse(source, file_path)?;
        if let Some((line, column)) = file.first_syntax_error() {
            return Err(MvpkgError::parse_with_location(
                "go",
                format!("syntax error at {}:{line}:{column}", file_path.display()),
                file_path.display().to_string(),
                Some(line),
                Some(column),
            ));
        }
        Ok(file)
    }

    /// Rewrite every import of `from` to `to`, then normalize import order.
    ///
    /// With `rename` set to `(old, new)`, qualified references that resolve to
    /// an unnamed import of `from` are renamed as well. Returns `None` when the
    /// file does not import `from`.
    pub fn rewrite_import(
        &mut self,
        source: String,
        file_path: &Path,
        from: &str,
        to: &str,
        rename: Option<(&str, &str)>,
    ) -> Result<Option<ImportRewrite>> {
        let file = self.parse_strict(source, file_path)?;
        let Some(rewrite) = file.rewrite_import(from, to, rename)? else {
            return Ok(None);
        };

        let reparsed = self.parse(rewrite.source, file_path)?;
        Ok(Some(ImportRewrite {
            source: reparsed.sort_imports()?,
            references: rewrite.references,
        }))
    }
}

/// A parsed Go file together with its source text.
pub struct GoSourceFile {
    source: String,
    tree: Tree,
    path: PathBuf,
}

/// The `package <name>` clause of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageClause {
    /// Declared package name
    pub name: String,
    /// Byte range of the name
    pub range: Range<usize>,
}

/// One import spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoImport {
    /// Unquoted import path
    pub path: String,
    /// Explicit name: an alias, `_` or `.`
    pub name: Option<String>,
    /// Byte range of the quoted path literal
    pub literal_range: Range<usize>,
    /// 1-based line of the spec
    pub line: usize,
}

impl GoImport {
    /// Whether the file refers to this import by the package's own name.
    pub fn uses_package_name(&self) -> bool {
        self.name.is_none()
    }
}

/// A single replacement of a byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEdit {
    /// Byte range being replaced
    pub range: Range<usize>,
    /// Replacement text
    pub replacement: String,
}

/// Result of [`GoParser::rewrite_import`].
#[derive(Debug, Clone)]
pub struct ImportRewrite {
    /// New file contents
    pub source: String,
    /// Qualified references that were renamed
    pub references: Vec<PackageReference>,
}

impl GoSourceFile {
    /// Source text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Path this file was parsed from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Position (1-based line, column) of the first syntax error, if any.
    pub fn first_syntax_error(&self) -> Option<(usize, usize)> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return None;
        }
        let node = first_error_node(root).unwrap_or(root);
        let position = node.start_position();
        Some((position.row + 1, position.column + 1))
    }

    /// The file's package clause.
    pub fn package_clause(&self) -> Result<Option<PackageClause>> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        let Some(clause) = root
            .named_children(&mut cursor)
            .find(|node| node.kind() == "package_clause")
        else {
            return Ok(None);
        };

        let mut clause_cursor = clause.walk();
        let name = clause
            .named_children(&mut clause_cursor)
            .find(|node| node.kind() == "package_identifier");
        match name {
            Some(node) => Ok(Some(PackageClause {
                name: self.text(node)?.to_string(),
                range: node.byte_range(),
            })),
            None => Ok(None),
        }
    }

    /// All import specs, in source order.
    pub fn imports(&self) -> Result<Vec<GoImport>> {
        let mut imports = Vec::new();
        for spec in self.import_spec_nodes() {
            let Some(path_node) = spec.child_by_field_name("path") else {
                continue;
            };
            let name = spec
                .child_by_field_name("name")
                .map(|node| self.text(node).map(str::to_string))
                .transpose()?;

            imports.push(GoImport {
                path: unquote(self.text(path_node)?).to_string(),
                name,
                literal_range: path_node.byte_range(),
                line: spec.start_position().row + 1,
            });
        }
        Ok(imports)
    }

    /// Qualified references to `package` not shadowed by a local declaration.
    pub fn package_references(
        &self,
        package: &str,
        replacement: &str,
    ) -> Result<Vec<PackageReference>> {
        find_package_references(
            self.tree.root_node(),
            self.source.as_bytes(),
            package,
            replacement,
        )
    }

    /// Rewrite import paths (and optionally references) without reordering.
    pub fn rewrite_import(
        &self,
        from: &str,
        to: &str,
        rename: Option<(&str, &str)>,
    ) -> Result<Option<ImportRewrite>> {
        let matching: Vec<GoImport> = self
            .imports()?
            .into_iter()
            .filter(|import| import.path == from)
            .collect();
        if matching.is_empty() {
            return Ok(None);
        }

        let mut edits: Vec<SourceEdit> = matching
            .iter()
            .map(|import| SourceEdit {
                range: import.literal_range.clone(),
                replacement: format!("\"{to}\""),
            })
            .collect();

        let mut references = Vec::new();
        if let Some((old, new)) = rename {
            if old != new && matching.iter().any(GoImport::uses_package_name) {
                references = self.package_references(old, new)?;
                edits.extend(references.iter().map(|reference| SourceEdit {
                    range: reference.range.clone(),
                    replacement: new.to_string(),
                }));
            }
        }

        Ok(Some(ImportRewrite {
            source: apply_edits(&self.source, edits)?,
            references,
        }))
    }

    /// Rename `package from` to `package to` (and the `_test` variant).
    ///
    /// Returns the new source and the old/new declared names, or `None` when
    /// the clause declares something else.
    pub fn rename_package_clause(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Option<(String, String, String)>> {
        let Some(clause) = self.package_clause()? else {
            return Ok(None);
        };

        let replacement = if clause.name == from {
            to.to_string()
        } else if clause.name.strip_suffix(EXTERNAL_TEST_SUFFIX) == Some(from) {
            format!("{to}{EXTERNAL_TEST_SUFFIX}")
        } else {
            return Ok(None);
        };

        let edit = SourceEdit {
            range: clause.range,
            replacement: replacement.clone(),
        };
        Ok(Some((
            apply_edits(&self.source, vec![edit])?,
            clause.name,
            replacement,
        )))
    }

    /// Source with each import group sorted by path and exact duplicates removed.
    ///
    /// A group is a run of single-line specs on consecutive lines; blank lines
    /// and comment-only lines separate groups.
    pub fn sort_imports(&self) -> Result<String> {
        let edits = self.import_sort_edits()?;
        if edits.is_empty() {
            return Ok(self.source.clone());
        }
        apply_edits(&self.source, edits)
    }

    fn import_sort_edits(&self) -> Result<Vec<SourceEdit>> {
        let line_starts = line_starts(&self.source);
        let mut edits = Vec::new();

        for list in self.import_spec_lists() {
            let list_rows = (list.start_position().row, list.end_position().row);
            let mut group = ImportGroup::default();
            let mut cursor = list.walk();

            for child in list.children(&mut cursor) {
                match child.kind() {
                    "import_spec" => {
                        let row = child.start_position().row;
                        if child.end_position().row != row {
                            group.flush(&self.source, &line_starts, &mut edits);
                            continue;
                        }
                        let same_line = group.last_row == Some(row);
                        if group
                            .last_row
                            .is_some_and(|last| row != last && row != last + 1)
                        {
                            group.flush(&self.source, &line_starts, &mut edits);
                        }
                        if same_line || row == list_rows.0 || row == list_rows.1 {
                            group.tainted = true;
                        }
                        let path = child
                            .child_by_field_name("path")
                            .map(|node| self.text(node).map(|text| unquote(text).to_string()))
                            .transpose()?
                            .unwrap_or_default();
                        let name = child
                            .child_by_field_name("name")
                            .map(|node| self.text(node).map(str::to_string))
                            .transpose()?
                            .unwrap_or_default();
                        group.rows.push((row, path, name));
                        group.last_row = Some(row);
                    }
                    "comment" => {
                        let row = child.start_position().row;
                        if group.last_row == Some(row) && child.end_position().row == row {
                            continue;
                        }
                        group.flush(&self.source, &line_starts, &mut edits);
                    }
                    _ => {}
                }
            }
            group.flush(&self.source, &line_starts, &mut edits);
        }

        Ok(edits)
    }

    fn import_declarations(&self) -> Vec<Node<'_>> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        root.named_children(&mut cursor)
            .filter(|node| node.kind() == "import_declaration")
            .collect()
    }

    fn import_spec_lists(&self) -> Vec<Node<'_>> {
        self.import_declarations()
            .into_iter()
            .flat_map(|decl| {
                let mut cursor = decl.walk();
                decl.named_children(&mut cursor)
                    .filter(|node| node.kind() == "import_spec_list")
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn import_spec_nodes(&self) -> Vec<Node<'_>> {
        let mut specs = Vec::new();
        for decl in self.import_declarations() {
            let mut cursor = decl.walk();
            for child in decl.named_children(&mut cursor) {
                match child.kind() {
                    "import_spec" => specs.push(child),
                    "import_spec_list" => {
                        let mut list_cursor = child.walk();
                        specs.extend(
                            child
                                .named_children(&mut list_cursor)
                                .filter(|node| node.kind() == "import_spec"),
                        );
                    }
                    _ => {}
                }
            }
        }
        specs
    }

    fn text(&self, node: Node) -> Result<&str> {
        Ok(node.utf8_text(self.source.as_bytes())?)
    }
}

/// Consecutive import lines being collected for sorting.
#[derive(Default)]
struct ImportGroup {
    rows: Vec<(usize, String, String)>,
    last_row: Option<usize>,
    tainted: bool,
}

impl ImportGroup {
    fn flush(&mut self, source: &str, line_starts: &[usize], edits: &mut Vec<SourceEdit>) {
        let group = std::mem::take(self);
        if group.tainted || group.rows.len() < 2 {
            return;
        }

        let line = |row: usize| {
            let start = line_starts[row];
            let end = line_starts
                .get(row + 1)
                .map_or(source.len(), |next| next - 1);
            &source[start..end]
        };

        let original: Vec<(&str, &str, &str)> = group
            .rows
            .iter()
            .map(|(row, path, name)| (path.as_str(), name.as_str(), line(*row)))
            .collect();
        let mut sorted = original.clone();
        sorted.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        sorted.dedup_by(|later, earlier| later.0 == earlier.0 && later.1 == earlier.1);
        if sorted == original {
            return;
        }

        let first_row = group.rows[0].0;
        let last_row = group.rows[group.rows.len() - 1].0;
        let end = line_starts
            .get(last_row + 1)
            .map_or(source.len(), |next| next - 1);
        edits.push(SourceEdit {
            range: line_starts[first_row]..end,
            replacement: sorted
                .iter()
                .map(|(_, _, text)| *text)
                .collect::<Vec<_>>()
                .join("\n"),
        });
    }
}

/// Apply non-overlapping edits to `source`.
pub fn apply_edits(source: &str, mut edits: Vec<SourceEdit>) -> Result<String> {
    edits.sort_by_key(|edit| edit.range.start);
    if edits
        .windows(2)
        .any(|pair| pair[0].range.end > pair[1].range.start)
    {
        return Err(MvpkgError::internal("overlapping source edits"));
    }

    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in &edits {
        output.push_str(&source[cursor..edit.range.start]);
        output.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    output.push_str(&source[cursor..]);
    Ok(output)
}

fn unquote(literal: &str) -> &str {
    let bytes = literal.as_bytes();
    if bytes.len() >= 2 && matches!(bytes[0], b'"' | b'`') && bytes[bytes.len() - 1] == bytes[0] {
        &literal[1..literal.len() - 1]
    } else {
        literal
    }
}

fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(idx, _)| idx + 1))
        .collect()
}

fn first_error_node(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error_node)
}

#[cfg(test)]
#[path = "go_tests.rs"]
mod tests;
