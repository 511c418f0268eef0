//! Scope-aware lookup of qualified references to an imported package.
//!
//! A selector `pkg.Name` or qualified type `pkg.T` refers to the import only
//! when no local declaration of `pkg` is visible at that point. Package-level
//! declarations would be a compile error alongside the import, so only
//! function-level scopes are tracked.

use std::collections::HashSet;
use std::ops::Range;

use tree_sitter::Node;

use crate::core::errors::Result;

/// A qualified reference to the imported package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    /// Byte range of the package identifier
    pub range: Range<usize>,
    /// 1-based line
    pub line: usize,
    /// The replacement name is declared locally at this site
    pub captured: bool,
}

/// Collect references to `package` under `root`.
///
/// `replacement` is the name the references will be renamed to; sites where
/// it is already bound locally are flagged as captured.
pub fn find_package_references(
    root: Node,
    source: &[u8],
    package: &str,
    replacement: &str,
) -> Result<Vec<PackageReference>> {
    let mut walker = ScopeWalker {
        source,
        package,
        replacement,
        scopes: Vec::new(),
        references: Vec::new(),
    };
    walker.visit(root)?;
    Ok(walker.references)
}

struct ScopeWalker<'a> {
    source: &'a [u8],
    package: &'a str,
    replacement: &'a str,
    scopes: Vec<HashSet<String>>,
    references: Vec<PackageReference>,
}

impl<'a> ScopeWalker<'a> {
    fn visit(&mut self, node: Node) -> Result<()> {
        match node.kind() {
            "function_declaration" | "method_declaration" | "func_literal" => {
                self.visit_function(node)
            }
            "block"
            | "if_statement"
            | "for_statement"
            | "expression_switch_statement"
            | "select_statement"
            | "expression_case"
            | "default_case"
            | "communication_case" => self.scoped(|walker| walker.visit_children(node)),
            "type_switch_statement" => self.scoped(|walker| walker.visit_type_switch(node)),
            "short_var_declaration" => self.visit_declaring(node),
            "range_clause" | "receive_statement" => {
                if has_token(node, ":=") {
                    self.visit_declaring(node)
                } else {
                    self.visit_children(node)
                }
            }
            "var_spec" | "const_spec" => self.visit_value_spec(node),
            "type_spec" | "type_alias" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.declare(name)?;
                }
                self.visit_children(node)
            }
            "selector_expression" => {
                if let Some(operand) = node.child_by_field_name("operand") {
                    self.check_reference(operand, "identifier")?;
                }
                self.visit_children(node)
            }
            "qualified_type" => {
                if let Some(package) = node.child_by_field_name("package") {
                    self.check_reference(package, "package_identifier")?;
                }
                self.visit_children(node)
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) -> Result<()> {
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child)?;
        }
        Ok(())
    }

    fn scoped<F>(&mut self, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.scopes.push(HashSet::new());
        let result = body(self);
        self.scopes.pop();
        result
    }

    /// Signature types resolve in the enclosing scope; parameter names are
    /// visible only inside the body.
    fn visit_function(&mut self, node: Node) -> Result<()> {
        self.scoped(|walker| {
            if let Some(type_params) = node.child_by_field_name("type_parameters") {
                walker.declare_parameter_names(type_params)?;
                walker.visit_children(type_params)?;
            }

            let signature: Vec<Node> = ["receiver", "parameters", "result"]
                .iter()
                .filter_map(|field| node.child_by_field_name(field))
                .collect();
            for list in &signature {
                walker.visit_signature_types(*list)?;
            }

            walker.scoped(|walker| {
                for list in &signature {
                    walker.declare_parameter_names(*list)?;
                }
                match node.child_by_field_name("body") {
                    Some(body) => walker.visit_children(body),
                    None => Ok(()),
                }
            })
        })
    }

    fn visit_signature_types(&mut self, list: Node) -> Result<()> {
        if list.kind() != "parameter_list" {
            return self.visit(list);
        }
        let mut cursor = list.walk();
        let params: Vec<Node> = list.named_children(&mut cursor).collect();
        for param in params {
            match param.child_by_field_name("type") {
                Some(ty) => self.visit(ty)?,
                None => self.visit(param)?,
            }
        }
        Ok(())
    }

    fn declare_parameter_names(&mut self, list: Node) -> Result<()> {
        if !matches!(list.kind(), "parameter_list" | "type_parameter_list") {
            return Ok(());
        }
        let mut cursor = list.walk();
        let params: Vec<Node> = list.named_children(&mut cursor).collect();
        for param in params {
            let mut name_cursor = param.walk();
            let names: Vec<Node> = param
                .children_by_field_name("name", &mut name_cursor)
                .collect();
            for name in names {
                self.declare(name)?;
            }
        }
        Ok(())
    }

    /// `names := values`: the values are evaluated before the names exist.
    fn visit_declaring(&mut self, node: Node) -> Result<()> {
        if let Some(right) = node.child_by_field_name("right") {
            self.visit(right)?;
        }
        if let Some(left) = node.child_by_field_name("left") {
            self.declare_identifiers(left)?;
        }
        Ok(())
    }

    fn visit_value_spec(&mut self, spec: Node) -> Result<()> {
        if let Some(ty) = spec.child_by_field_name("type") {
            self.visit(ty)?;
        }
        if let Some(value) = spec.child_by_field_name("value") {
            self.visit(value)?;
        }
        let mut cursor = spec.walk();
        let names: Vec<Node> = spec.children_by_field_name("name", &mut cursor).collect();
        for name in names {
            self.declare(name)?;
        }
        Ok(())
    }

    fn visit_type_switch(&mut self, node: Node) -> Result<()> {
        let alias = node.child_by_field_name("alias");
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();

        for child in children {
            match child.kind() {
                "type_case" | "default_case" => self.scoped(|walker| {
                    let mut case_cursor = child.walk();
                    let types: Vec<Node> = child
                        .children_by_field_name("type", &mut case_cursor)
                        .collect();
                    for ty in &types {
                        walker.visit(*ty)?;
                    }
                    if let Some(alias) = alias {
                        walker.declare_identifiers(alias)?;
                    }
                    let mut body_cursor = child.walk();
                    let body: Vec<Node> = child.named_children(&mut body_cursor).collect();
                    for statement in body.into_iter().filter(|node| !types.contains(node)) {
                        walker.visit(statement)?;
                    }
                    Ok(())
                })?,
                _ if Some(child) == alias => {}
                _ => self.visit(child)?,
            }
        }
        Ok(())
    }

    fn declare_identifiers(&mut self, node: Node) -> Result<()> {
        if node.kind() == "identifier" {
            return self.declare(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children.into_iter().filter(|c| c.kind() == "identifier") {
            self.declare(child)?;
        }
        Ok(())
    }

    fn declare(&mut self, name: Node) -> Result<()> {
        let text = name.utf8_text(self.source)?;
        if text == "_" {
            return Ok(());
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(text.to_string());
        }
        Ok(())
    }

    fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn check_reference(&mut self, node: Node, kind: &str) -> Result<()> {
        if node.kind() != kind || node.utf8_text(self.source)? != self.package {
            return Ok(());
        }
        if self.is_declared(self.package) {
            return Ok(());
        }
        self.references.push(PackageReference {
            range: node.byte_range(),
            line: node.start_position().row + 1,
            captured: self.is_declared(self.replacement),
        });
        Ok(())
    }
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == token);
    found
}
