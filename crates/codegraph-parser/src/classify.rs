use codegraph_core::{Language, NodeLabel};

/// Data-driven node-kind classification (§9 "Regex lists as language
/// heuristics" — generalized here to a table over tree-sitter node kinds
/// instead of regexes, but the same idea: extension is adding table rows,
/// not code paths).
///
/// Maps a tree-sitter node `kind()` string, for a given language, to the
/// [`NodeLabel`] it defines. Every language in the spec shares the same
/// five universal dispatch points below; most differ only in which grammar
/// node names spell "function" or "class".
pub fn definition_label(language: Language, kind: &str) -> Option<NodeLabel> {
    use Language::*;
    use NodeLabel::*;
    Some(match (language, kind) {
        (Rust, "function_item") => Function,
        (Rust, "struct_item") => Struct,
        (Rust, "enum_item") => Enum,
        (Rust, "trait_item") => Trait,
        (Rust, "impl_item") => Impl,
        (Rust, "mod_item") => Module,
        (Rust, "macro_definition") => Macro,
        (Rust, "const_item") => Const,
        (Rust, "static_item") => Static,
        (Rust, "type_item") => TypeAlias,

        (TypeScript | Tsx | JavaScript, "function_declaration") => Function,
        (TypeScript | Tsx | JavaScript, "method_definition") => Method,
        (TypeScript | Tsx | JavaScript, "class_declaration") => Class,
        (TypeScript | Tsx, "interface_declaration") => Interface,
        (TypeScript | Tsx, "type_alias_declaration") => TypeAlias,
        (TypeScript | Tsx, "enum_declaration") => Enum,
        (TypeScript | Tsx | JavaScript, "lexical_declaration") => CodeElement,

        (Python, "function_definition") => Function,
        (Python, "class_definition") => Class,
        (Python, "decorated_definition") => CodeElement,

        (Java, "method_declaration") => Method,
        (Java, "constructor_declaration") => Constructor,
        (Java, "class_declaration") => Class,
        (Java, "interface_declaration") => Interface,
        (Java, "enum_declaration") => Enum,
        (Java, "annotation_type_declaration") => Annotation,
        (Java, "record_declaration") => Record,

        (Go, "function_declaration") => Function,
        (Go, "method_declaration") => Method,
        (Go, "type_declaration") => TypeAlias,

        (C | Cpp, "function_definition") => Function,
        (Cpp, "class_specifier") => Class,
        (Cpp, "struct_specifier") => Struct,
        (Cpp, "union_specifier") => Union,
        (Cpp, "enum_specifier") => Enum,
        (Cpp, "namespace_definition") => Namespace,
        (Cpp, "template_declaration") => Template,
        (C, "struct_specifier") => Struct,
        (C, "union_specifier") => Union,
        (C, "enum_specifier") => Enum,
        (C, "type_definition") => Typedef,

        (CSharp, "method_declaration") => Method,
        (CSharp, "constructor_declaration") => Constructor,
        (CSharp, "class_declaration") => Class,
        (CSharp, "interface_declaration") => Interface,
        (CSharp, "struct_declaration") => Struct,
        (CSharp, "enum_declaration") => Enum,
        (CSharp, "delegate_declaration") => Delegate,
        (CSharp, "record_declaration") => Record,
        (CSharp, "namespace_declaration") => Namespace,

        (Swift, "function_declaration") => Function,
        (Swift, "class_declaration") => Class,
        (Swift, "protocol_declaration") => Interface,
        (Swift, "enum_declaration") => Enum,
        (Swift, "struct_declaration") => Struct,

        (Php, "function_definition") => Function,
        (Php, "method_declaration") => Method,
        (Php, "class_declaration") => Class,
        (Php, "interface_declaration") => Interface,
        (Php, "trait_declaration") => Trait,
        (Php, "enum_declaration") => Enum,

        _ => return None,
    })
}

/// Node kinds that introduce an import/use relationship, by language
/// (§4.5). The extractor records the raw specifier text for resolution.
pub fn is_import_kind(language: Language, kind: &str) -> bool {
    use Language::*;
    matches!(
        (language, kind),
        (Rust, "use_declaration")
            | (TypeScript | Tsx | JavaScript, "import_statement")
            | (TypeScript | Tsx | JavaScript, "import_clause")
            | (Python, "import_statement")
            | (Python, "import_from_statement")
            | (Java, "import_declaration")
            | (Go, "import_spec")
            | (C | Cpp, "preproc_include")
            | (CSharp, "using_directive")
            | (Swift, "import_declaration")
            | (Php, "namespace_use_declaration")
    )
}

/// Node kinds representing a call expression, by language (§4.6).
pub fn is_call_kind(language: Language, kind: &str) -> bool {
    use Language::*;
    matches!(
        (language, kind),
        (Rust, "call_expression")
            | (Rust, "macro_invocation")
            | (TypeScript | Tsx | JavaScript, "call_expression")
            | (Python, "call")
            | (Java, "method_invocation")
            | (Java, "object_creation_expression")
            | (Go, "call_expression")
            | (C | Cpp, "call_expression")
            | (CSharp, "invocation_expression")
            | (Swift, "call_expression")
            | (Php, "function_call_expression")
            | (Php, "member_call_expression")
    )
}

/// Node kinds that act as an "enclosing function/method/constructor" when
/// walking upward from a call site to find its caller (§4.6).
pub fn is_enclosing_scope_kind(language: Language, kind: &str) -> bool {
    definition_label(language, kind).map(|label| {
        matches!(
            label,
            NodeLabel::Function | NodeLabel::Method | NodeLabel::Constructor
        )
    })
    .unwrap_or(false)
}

/// Node kinds that are class/interface-like declarations eligible for
/// heritage extraction (§4.7).
pub fn is_heritage_subject_kind(language: Language, kind: &str) -> bool {
    definition_label(language, kind).map(|label| {
        matches!(
            label,
            NodeLabel::Class | NodeLabel::Interface | NodeLabel::Struct | NodeLabel::Trait
        )
    })
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_function_item_maps_to_function() {
        assert_eq!(definition_label(Language::Rust, "function_item"), Some(NodeLabel::Function));
    }

    #[test]
    fn unknown_kind_is_none() {
        assert_eq!(definition_label(Language::Rust, "source_file"), None);
    }

    #[test]
    fn python_class_is_heritage_subject() {
        assert!(is_heritage_subject_kind(Language::Python, "class_definition"));
        assert!(!is_heritage_subject_kind(Language::Python, "function_definition"));
    }

    #[test]
    fn typescript_import_statement_is_import_kind() {
        assert!(is_import_kind(Language::TypeScript, "import_statement"));
        assert!(is_import_kind(Language::Python, "import_statement"));
        assert!(!is_import_kind(Language::Go, "import_statement"));
    }
}
