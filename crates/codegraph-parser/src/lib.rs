pub mod classify;
pub mod extract;
pub mod language;
pub mod pipeline;
pub mod symbols;
pub mod walk;

pub use extract::AstVisitor;
pub use pipeline::{FileOutcome, ParsePipeline, ParseWarning, SkipReason};
pub use symbols::{Definition, SymbolTable};
pub use walk::IgnoreFilterWalker;
