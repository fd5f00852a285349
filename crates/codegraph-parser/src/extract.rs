use crate::classify;
use codegraph_core::{
    CallSite, ExtractionResult, HeritageKind, HeritageRef, ImportSpecifier, Language, Node as GraphNode, NodeId,
    Span, SymbolAttrs,
};
use regex::Regex;
use std::sync::OnceLock;
use tree_sitter::{Node, Tree};

/// Implements the definition/import/call/heritage extraction half of C4
/// (§4.4 steps 4-5). Walks the tree with an explicit stack rather than
/// recursion so a deeply nested real-world file cannot blow the call stack
/// (§9).
pub struct AstVisitor<'a> {
    language: Language,
    file_path: &'a str,
    source: &'a str,
}

enum Work<'tree> {
    Enter(Node<'tree>),
    ExitScope,
}

impl<'a> AstVisitor<'a> {
    pub fn new(language: Language, file_path: &'a str, source: &'a str) -> Self {
        AstVisitor {
            language,
            file_path,
            source,
        }
    }

    pub fn visit(&self, tree: &Tree) -> ExtractionResult {
        let mut result = ExtractionResult::default();
        let mut scope_stack: Vec<NodeId> = Vec::new();
        let mut stack = vec![Work::Enter(tree.root_node())];

        while let Some(item) = stack.pop() {
            match item {
                Work::ExitScope => {
                    scope_stack.pop();
                }
                Work::Enter(node) => {
                    let mut pushed_scope = false;
                    let kind = node.kind();

                    if let Some(label) = classify::definition_label(self.language, kind) {
                        if let Some(name) = self.extract_name(&node) {
                            let node_id = NodeId::for_definition(label, self.file_path, &name);
                            let content = self.text(&node);
                            let span = Span::new(
                                node.start_position().row as u32 + 1,
                                node.end_position().row as u32 + 1,
                            );
                            result.definitions.push(GraphNode::symbol(
                                label,
                                self.file_path,
                                &name,
                                SymbolAttrs {
                                    name: name.clone(),
                                    file_path: self.file_path.to_string(),
                                    span,
                                    is_exported: self.is_exported(&node),
                                    content: content.clone(),
                                },
                            ));

                            if classify::is_enclosing_scope_kind(self.language, kind) {
                                scope_stack.push(node_id.clone());
                                pushed_scope = true;
                            }

                            if classify::is_heritage_subject_kind(self.language, kind) {
                                result
                                    .heritage
                                    .extend(self.extract_heritage(&node_id, &content));
                            }
                        }
                    }

                    if classify::is_import_kind(self.language, kind) {
                        let raw = self.text(&node);
                        result.imports.push(ImportSpecifier {
                            is_relative: is_relative_specifier(&raw),
                            raw,
                        });
                    }

                    if classify::is_call_kind(self.language, kind) {
                        if let Some(called_name) = self.extract_callee_name(&node) {
                            result.call_sites.push(CallSite {
                                caller_file: self.file_path.to_string(),
                                caller_symbol: scope_stack.last().cloned(),
                                called_name,
                            });
                        }
                    }

                    if pushed_scope {
                        stack.push(Work::ExitScope);
                    }
                    let mut cursor = node.walk();
                    let children: Vec<Node> = node.children(&mut cursor).collect();
                    for child in children.into_iter().rev() {
                        stack.push(Work::Enter(child));
                    }
                }
            }
        }

        result
    }

    fn text(&self, node: &Node) -> String {
        node.utf8_text(self.source.as_bytes()).unwrap_or("").to_string()
    }

    /// Prefers the grammar's `name` field, which most tree-sitter grammars
    /// expose on definition nodes; falls back to the first identifier-like
    /// child, then the declaration's first line.
    fn extract_name(&self, node: &Node) -> Option<String> {
        if let Some(name_node) = node.child_by_field_name("name") {
            return self.text(&name_node).into();
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if matches!(
                child.kind(),
                "identifier" | "type_identifier" | "field_identifier" | "constant" | "property_identifier"
            ) {
                return Some(self.text(&child));
            }
        }
        let whole = self.text(node);
        whole.lines().next().map(|s| s.trim().to_string())
    }

    /// Heuristic export detection: most grammars either expose an `export`
    /// keyword sibling (JS/TS) or a capitalized identifier (Go) as the
    /// visibility signal. Returns `None` when the language gives no signal,
    /// matching §3's "optional" export flag.
    fn is_exported(&self, node: &Node) -> Option<bool> {
        match self.language {
            Language::TypeScript | Language::Tsx | Language::JavaScript => {
                Some(node.prev_sibling().map(|s| s.kind() == "export").unwrap_or(false))
            }
            Language::Go => self.extract_name(node).map(|n| n.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)),
            Language::Rust => {
                Some(node.prev_sibling().map(|s| s.kind() == "visibility_modifier").unwrap_or(false))
            }
            _ => None,
        }
    }

    fn extract_callee_name(&self, node: &Node) -> Option<String> {
        let callee_node = node
            .child_by_field_name("function")
            .or_else(|| node.child_by_field_name("name"))
            .or_else(|| node.child_by_field_name("macro"));
        let raw = match callee_node {
            Some(n) => self.text(&n),
            None => {
                let text = self.text(node);
                text.split('(').next().unwrap_or(&text).to_string()
            }
        };
        last_segment(&raw)
    }

    fn extract_heritage(&self, subject: &NodeId, content: &str) -> Vec<HeritageRef> {
        let mut refs = Vec::new();
        if let Some(names) = capture_clause(extends_re(), content) {
            for name in names {
                refs.push(HeritageRef {
                    subject: subject.clone(),
                    referenced_name: name,
                    kind: HeritageKind::Extends,
                });
            }
        }
        if let Some(names) = capture_clause(implements_re(), content) {
            for name in names {
                refs.push(HeritageRef {
                    subject: subject.clone(),
                    referenced_name: name,
                    kind: HeritageKind::Implements,
                });
            }
        }
        if self.language == Language::Python {
            if let Some(names) = capture_clause(python_bases_re(), content) {
                for name in names {
                    if name.contains('=') {
                        continue; // keyword argument such as metaclass=...
                    }
                    refs.push(HeritageRef {
                        subject: subject.clone(),
                        referenced_name: name,
                        kind: HeritageKind::Extends,
                    });
                }
            }
        }
        refs
    }
}

fn last_segment(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let segment = trimmed
        .split(['.', ':', '>', '-'])
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or(trimmed);
    Some(segment.trim().to_string())
}

fn is_relative_specifier(raw: &str) -> bool {
    raw.contains("\"./") || raw.contains("'./") || raw.contains("\"../") || raw.contains("'../")
}

fn extends_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"extends\s+([A-Za-z_][A-Za-z0-9_.]*(?:\s*,\s*[A-Za-z_][A-Za-z0-9_.]*)*)").unwrap())
}

fn implements_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"implements\s+([A-Za-z_][A-Za-z0-9_.]*(?:\s*,\s*[A-Za-z_][A-Za-z0-9_.]*)*)").unwrap()
    })
}

fn python_bases_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"class\s+\w+\s*\(([^)]*)\)").unwrap())
}

fn capture_clause(re: &Regex, content: &str) -> Option<Vec<String>> {
    let caps = re.captures(content)?;
    let list = caps.get(1)?.as_str();
    let names: Vec<String> = list
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language;

    fn parse(language: Language, source: &str) -> Tree {
        let mut parser = language::create_parser(language).unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn extracts_rust_function_and_call() {
        let source = "fn foo() {\n    bar();\n}\n";
        let tree = parse(Language::Rust, source);
        let visitor = AstVisitor::new(Language::Rust, "a.rs", source);
        let result = visitor.visit(&tree);

        assert!(result.definitions.iter().any(|n| n.id.as_str() == "Function:a.rs:foo"));
        assert_eq!(result.call_sites.len(), 1);
        assert_eq!(result.call_sites[0].called_name, "bar");
        assert_eq!(result.call_sites[0].caller_symbol.as_ref().unwrap().as_str(), "Function:a.rs:foo");
    }

    #[test]
    fn extracts_python_class_bases() {
        let source = "class Circle(Shape):\n    pass\n";
        let tree = parse(Language::Python, source);
        let visitor = AstVisitor::new(Language::Python, "circle.py", source);
        let result = visitor.visit(&tree);

        assert!(result.heritage.iter().any(|h| h.referenced_name == "Shape" && h.kind == HeritageKind::Extends));
    }

    #[test]
    fn module_top_level_call_has_no_caller_symbol() {
        let source = "foo();\n";
        let tree = parse(Language::JavaScript, source);
        let visitor = AstVisitor::new(Language::JavaScript, "a.js", source);
        let result = visitor.visit(&tree);
        assert_eq!(result.call_sites.len(), 1);
        assert!(result.call_sites[0].caller_symbol.is_none());
    }
}
