use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the parsing processor understands (§4.4). Any other extension
/// is skipped rather than represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    TypeScript,
    Tsx,
    JavaScript,
    Python,
    Java,
    C,
    Cpp,
    CSharp,
    Go,
    Rust,
    Php,
    Swift,
}

impl Language {
    /// Exact-extension table (§4.4 step 1). Returns `None` for unsupported
    /// extensions so the caller can skip the file.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext {
            "ts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "py" | "pyi" => Language::Python,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "go" => Language::Go,
            "rs" => Language::Rust,
            "php" => Language::Php,
            "swift" => Language::Swift,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Php => "php",
            Language::Swift => "swift",
        }
    }

    /// Default candidate extensions tried by the import resolver (§4.5),
    /// in order, after the exact specifier itself.
    pub fn candidate_extensions(&self) -> &'static [&'static str] {
        match self {
            Language::TypeScript => &["ts", "tsx", "d.ts"],
            Language::Tsx => &["tsx", "ts"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::Python => &["py"],
            Language::Java => &["java"],
            Language::C => &["h", "c"],
            Language::Cpp => &["hpp", "h", "cpp", "cc"],
            Language::CSharp => &["cs"],
            Language::Go => &["go"],
            Language::Rust => &["rs"],
            Language::Php => &["php"],
            Language::Swift => &["swift"],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node labels (§3). Universal kinds plus the language-specific kinds, which
/// the engine treats uniformly — only the label differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Folder,
    File,
    Function,
    Class,
    Method,
    Interface,
    CodeElement,
    Struct,
    Enum,
    Macro,
    Typedef,
    Union,
    Namespace,
    Trait,
    Impl,
    TypeAlias,
    Const,
    Static,
    Property,
    Record,
    Delegate,
    Annotation,
    Constructor,
    Template,
    Module,
    Community,
    Process,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Folder => "Folder",
            NodeLabel::File => "File",
            NodeLabel::Function => "Function",
            NodeLabel::Class => "Class",
            NodeLabel::Method => "Method",
            NodeLabel::Interface => "Interface",
            NodeLabel::CodeElement => "CodeElement",
            NodeLabel::Struct => "Struct",
            NodeLabel::Enum => "Enum",
            NodeLabel::Macro => "Macro",
            NodeLabel::Typedef => "Typedef",
            NodeLabel::Union => "Union",
            NodeLabel::Namespace => "Namespace",
            NodeLabel::Trait => "Trait",
            NodeLabel::Impl => "Impl",
            NodeLabel::TypeAlias => "TypeAlias",
            NodeLabel::Const => "Const",
            NodeLabel::Static => "Static",
            NodeLabel::Property => "Property",
            NodeLabel::Record => "Record",
            NodeLabel::Delegate => "Delegate",
            NodeLabel::Annotation => "Annotation",
            NodeLabel::Constructor => "Constructor",
            NodeLabel::Template => "Template",
            NodeLabel::Module => "Module",
            NodeLabel::Community => "Community",
            NodeLabel::Process => "Process",
        }
    }

    /// Symbol labels are every label except the structural (`Folder`/`File`)
    /// and derived (`Community`/`Process`) ones.
    pub fn is_symbol(&self) -> bool {
        !matches!(
            self,
            NodeLabel::Folder | NodeLabel::File | NodeLabel::Community | NodeLabel::Process
        )
    }

    /// Labels eligible for the full-text index (§4.9): File plus the
    /// universal callable/type kinds.
    pub fn is_fts_indexed(&self) -> bool {
        matches!(
            self,
            NodeLabel::File
                | NodeLabel::Function
                | NodeLabel::Class
                | NodeLabel::Method
                | NodeLabel::Interface
        )
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge kinds (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Contains,
    Defines,
    Imports,
    Calls,
    Extends,
    Implements,
    MemberOf,
    StepInProcess,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::Defines => "DEFINES",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::Calls => "CALLS",
            EdgeKind::Extends => "EXTENDS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::MemberOf => "MEMBER_OF",
            EdgeKind::StepInProcess => "STEP_IN_PROCESS",
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolution-quality score in `[0.0, 1.0]` (§3 invariant 7). Construction
/// clamps rather than panics: callers may compute a value slightly outside
/// range via multipliers and the type absorbs that.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Confidence(f32);

impl Confidence {
    pub const CERTAIN: Confidence = Confidence(1.0);

    pub fn new(value: f32) -> Self {
        Confidence(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence(0.0)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// A source span expressed in 1-based, inclusive line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
}

impl Span {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Span {
            start_line,
            end_line,
        }
    }
}

/// Reasons attached to resolution-dependent edges (§4.6, §4.7). Kept as a
/// small closed set so persistence and tests can match on them by value
/// instead of comparing free-form strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionReason {
    SameFile,
    ImportResolved,
    FuzzyGlobalUnique,
    FuzzyGlobalAmbiguous,
    ModuleTopLevel,
}

impl ResolutionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionReason::SameFile => "same-file",
            ResolutionReason::ImportResolved => "import-resolved",
            ResolutionReason::FuzzyGlobalUnique => "fuzzy-global",
            ResolutionReason::FuzzyGlobalAmbiguous => "fuzzy-global",
            ResolutionReason::ModuleTopLevel => "module-top-level",
        }
    }

    /// Confidence the spec assigns to each resolution strategy (§4.6, §9).
    pub fn confidence(&self) -> Confidence {
        match self {
            ResolutionReason::SameFile => Confidence::new(0.85),
            ResolutionReason::ImportResolved => Confidence::new(0.9),
            ResolutionReason::FuzzyGlobalUnique => Confidence::new(0.5),
            ResolutionReason::FuzzyGlobalAmbiguous => Confidence::new(0.3),
            ResolutionReason::ModuleTopLevel => Confidence::new(1.0),
        }
    }
}

impl fmt::Display for ResolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The coordinator's terminal run mode (§4.10, §8 property 6), surfaced in
/// the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    AlreadyUpToDate,
    Full,
    Incremental,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunMode::AlreadyUpToDate => "already-up-to-date",
            RunMode::Full => "full",
            RunMode::Incremental => "incremental",
        };
        f.write_str(s)
    }
}
