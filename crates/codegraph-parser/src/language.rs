use codegraph_core::Language;
use tree_sitter::Parser;

/// Builds a ready-to-use tree-sitter parser for a language (§4.4 step 2:
/// "load the language grammar into the parser"). Only called on a pool miss
/// — `ParsePipeline` recycles parsers per language across files instead of
/// calling this for every file.
pub fn create_parser(language: Language) -> Option<Parser> {
    let grammar = grammar_for(language)?;
    let mut parser = Parser::new();
    parser.set_language(&grammar).ok()?;
    Some(parser)
}

fn grammar_for(language: Language) -> Option<tree_sitter::Language> {
    Some(match language {
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::Go => tree_sitter_go::LANGUAGE.into(),
        Language::Java => tree_sitter_java::LANGUAGE.into(),
        Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        Language::C => tree_sitter_c::LANGUAGE.into(),
        Language::Swift => tree_sitter_swift::LANGUAGE.into(),
        Language::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
        Language::Php => tree_sitter_php::LANGUAGE_PHP.into(),
    })
}

/// Resolves a language from a file path's extension (§4.4 step 1). Files
/// with an unsupported or absent extension are skipped by the caller.
pub fn detect_language(file_path: &str) -> Option<Language> {
    let ext = std::path::Path::new(file_path).extension()?.to_str()?;
    Language::from_extension(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::{LANGUAGE_VERSION, MIN_COMPATIBLE_LANGUAGE_VERSION};

    const ALL: &[Language] = &[
        Language::Rust,
        Language::TypeScript,
        Language::Tsx,
        Language::JavaScript,
        Language::Python,
        Language::Go,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::Swift,
        Language::CSharp,
        Language::Php,
    ];

    #[test]
    fn every_supported_language_uses_a_compatible_grammar_version() {
        for &language in ALL {
            let grammar = grammar_for(language).unwrap();
            let version = grammar.version();
            assert!(
                (MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&version),
                "{:?} grammar version {} outside supported range {}..={}",
                language,
                version,
                MIN_COMPATIBLE_LANGUAGE_VERSION,
                LANGUAGE_VERSION
            );
        }
    }

    #[test]
    fn detect_language_matches_extension_table() {
        assert_eq!(detect_language("src/a.ts"), Some(Language::TypeScript));
        assert_eq!(detect_language("src/a.rs"), Some(Language::Rust));
        assert_eq!(detect_language("src/a.unknown"), None);
    }
}
