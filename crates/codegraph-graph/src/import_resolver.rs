use codegraph_core::{ImportSpecifier, Language};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// `filePath -> Set<filePath>`, the output of C5 (§4.5).
pub type ImportMap = HashMap<String, HashSet<String>>;

/// Implements C5: resolves every file's import specifiers to repo-relative
/// target paths it actually finds among `known_files`. Unresolvable
/// imports are silently dropped, per spec.
pub fn resolve_imports(
    files: &[(String, Language, Vec<ImportSpecifier>)],
    known_files: &HashSet<String>,
) -> ImportMap {
    let mut map = ImportMap::new();
    for (file_path, language, imports) in files {
        let mut targets = HashSet::new();
        for spec in imports {
            if let Some(module) = extract_module_path(&spec.raw) {
                if let Some(resolved) = resolve_one(file_path, *language, &module, spec.is_relative, known_files) {
                    targets.insert(resolved);
                }
            }
        }
        if !targets.is_empty() {
            map.insert(file_path.clone(), targets);
        }
    }
    map
}

fn resolve_one(
    importing_file: &str,
    language: Language,
    module: &str,
    is_relative: bool,
    known_files: &HashSet<String>,
) -> Option<String> {
    let base = if is_relative {
        let dir = Path::new(importing_file).parent().unwrap_or_else(|| Path::new(""));
        join_and_normalize(dir, module)
    } else {
        module.trim_start_matches('/').to_string()
    };

    for candidate in candidate_paths(&base, language) {
        if known_files.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn candidate_paths(base: &str, language: Language) -> Vec<String> {
    let mut out = vec![base.to_string()];
    for ext in language.candidate_extensions() {
        out.push(format!("{base}.{ext}"));
    }
    for ext in language.candidate_extensions() {
        out.push(format!("{base}/index.{ext}"));
    }
    out
}

fn join_and_normalize(dir: &Path, module: &str) -> String {
    let joined = dir.join(module);
    let mut segments: Vec<&str> = Vec::new();
    for component in joined.to_string_lossy().split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Pulls the literal module specifier out of an import statement's raw
/// source text: a quoted string where the grammar has one (JS/TS/Python/
/// PHP/Swift), otherwise a dotted/scoped path token (Java/C#/Go/Rust).
fn extract_module_path(raw: &str) -> Option<String> {
    if let Some(quoted) = extract_quoted(raw) {
        return Some(quoted);
    }

    let stripped = raw
        .trim()
        .trim_start_matches("use")
        .trim_start_matches("import")
        .trim_start_matches("using")
        .trim_end_matches(';')
        .trim();
    let first_token = stripped.split_whitespace().next()?;
    let path_part = first_token.split('{').next().unwrap_or(first_token);
    let normalized = path_part.replace("::", "/").replace('.', "/");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

fn extract_quoted(raw: &str) -> Option<String> {
    for quote in ['"', '\''] {
        if let Some(start) = raw.find(quote) {
            if let Some(end_rel) = raw[start + 1..].find(quote) {
                return Some(raw[start + 1..start + 1 + end_rel].to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_typescript_import() {
        let mut known = HashSet::new();
        known.insert("b.ts".to_string());
        let files = vec![(
            "a.ts".to_string(),
            Language::TypeScript,
            vec![ImportSpecifier {
                raw: "import { bar } from './b';".to_string(),
                is_relative: true,
            }],
        )];
        let map = resolve_imports(&files, &known);
        assert!(map.get("a.ts").unwrap().contains("b.ts"));
    }

    #[test]
    fn unresolvable_import_is_dropped() {
        let known = HashSet::new();
        let files = vec![(
            "a.ts".to_string(),
            Language::TypeScript,
            vec![ImportSpecifier {
                raw: "import { bar } from 'nonexistent';".to_string(),
                is_relative: false,
            }],
        )];
        let map = resolve_imports(&files, &known);
        assert!(map.get("a.ts").is_none());
    }

    #[test]
    fn resolves_java_dotted_import() {
        let mut known = HashSet::new();
        known.insert("com/foo/Bar.java".to_string());
        let files = vec![(
            "Main.java".to_string(),
            Language::Java,
            vec![ImportSpecifier {
                raw: "import com.foo.Bar;".to_string(),
                is_relative: false,
            }],
        )];
        let map = resolve_imports(&files, &known);
        assert!(map.get("Main.java").unwrap().contains("com/foo/Bar.java"));
    }
}
