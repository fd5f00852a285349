use std::collections::HashSet;
use std::sync::OnceLock;

/// Curated, language-mixed block-list of well-known built-ins that
/// short-circuits call resolution before any symbol-table lookup (§4.6,
/// §9: "treated as data, not code"). Deliberately small; extending
/// coverage is a matter of adding entries here.
pub fn is_builtin(name: &str) -> bool {
    builtins().contains(name)
}

fn builtins() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        [
            // JS/TS/console/runtime
            "console", "require", "import", "fetch",
            "setTimeout", "setInterval", "clearTimeout", "clearInterval", "JSON",
            "stringify", "Promise", "Array", "Object", "Map", "Set", "Symbol",
            // Python
            "print", "len", "range", "str", "int", "float", "bool", "list", "dict", "set",
            "tuple", "isinstance", "super", "open", "enumerate", "zip", "map", "filter",
            "getattr", "setattr", "hasattr",
            // Java/C#
            "println", "printf", "toString", "equals", "hashCode", "getClass", "Console",
            "WriteLine", "ToString", "Equals",
            // Rust
            "println", "format", "vec", "Some", "None", "Ok", "Err", "unwrap", "expect", "clone",
            "to_string", "iter", "collect", "into",
            // Go
            "Println", "Printf", "Sprintf", "panic", "recover", "make", "append", "len", "cap",
            // C/C++
            "printf", "malloc", "free", "memcpy", "strlen", "strcpy", "assert",
        ]
        .into_iter()
        .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_builtins_are_recognized() {
        assert!(is_builtin("println"));
        assert!(is_builtin("console"));
        assert!(!is_builtin("myBusinessFunction"));
    }
}
