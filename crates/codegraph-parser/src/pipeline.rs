use crate::extract::AstVisitor;
use crate::language;
use codegraph_core::{ExtractionResult, Language, ParsingConfig};
use dashmap::DashMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::time::Duration;
use tracing::warn;
use tree_sitter::Parser;

/// Everything C4 produces for a single file: its extraction plus the
/// metadata later phases and the persister need.
pub struct FileOutcome {
    pub file_path: String,
    pub content: String,
    pub language: Language,
    pub extraction: ExtractionResult,
}

#[derive(Debug, Clone)]
pub enum SkipReason {
    UnsupportedExtension,
    TooLarge { bytes: u64, limit: u64 },
    ParseTimedOut,
    ParseFailed(String),
    InvalidUtf8,
}

pub struct ParseWarning {
    pub file_path: String,
    pub reason: SkipReason,
}

/// Implements C4's worker-pool half of the parsing processor (§4.4, §5):
/// a bounded rayon pool, batched dispatch, per-language parser reuse, and a
/// content-hash table shared across workers so an unchanged file is never
/// re-extracted twice within a run (a supplemental optimization beyond the
/// spec's literal per-file contract).
pub struct ParsePipeline {
    config: ParsingConfig,
    content_cache: DashMap<String, (String, ExtractionResult)>,
    parser_pool: DashMap<Language, Mutex<Vec<Parser>>>,
}

impl ParsePipeline {
    pub fn new(config: ParsingConfig) -> Self {
        ParsePipeline {
            config,
            content_cache: DashMap::new(),
            parser_pool: DashMap::new(),
        }
    }

    /// Checks a recycled parser for `language` out of the pool, building a
    /// fresh one only if none is idle.
    fn checkout_parser(&self, language: Language) -> Option<Parser> {
        let slot = self.parser_pool.entry(language).or_insert_with(|| Mutex::new(Vec::new()));
        if let Some(parser) = slot.lock().pop() {
            return Some(parser);
        }
        language::create_parser(language)
    }

    /// Returns a parser to the pool for the next file of the same language
    /// to reuse, instead of dropping it and paying grammar-load cost again.
    fn checkin_parser(&self, language: Language, parser: Parser) {
        let slot = self.parser_pool.entry(language).or_insert_with(|| Mutex::new(Vec::new()));
        slot.lock().push(parser);
    }

    /// Parses every file in `files` (already deduplicated and ignore-filtered
    /// by C1), largest-first to reduce tail latency (§ supplemented
    /// features), and returns outcomes in that same deterministic order,
    /// plus any per-file warnings.
    pub fn parse_all(&self, mut files: Vec<(String, Vec<u8>)>) -> (Vec<FileOutcome>, Vec<ParseWarning>) {
        files.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count.max(1))
            .build()
            .expect("worker pool should build with a bounded thread count");

        let mut outcomes = Vec::with_capacity(files.len());
        let mut warnings = Vec::new();

        for batch in files.chunks(self.config.batch_size.max(1)) {
            let batch_results: Vec<(String, Result<FileOutcome, SkipReason>)> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|(path, bytes)| (path.clone(), self.parse_one(path, bytes)))
                    .collect()
            });

            for (path, result) in batch_results {
                match result {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(reason) => {
                        warn!(file = %path, ?reason, "skipping file");
                        warnings.push(ParseWarning { file_path: path, reason });
                    }
                }
            }
            // Batch boundary doubles as the cooperative yield point (§5).
        }

        (outcomes, warnings)
    }

    fn parse_one(&self, path: &str, bytes: &[u8]) -> Result<FileOutcome, SkipReason> {
        if bytes.len() as u64 > self.config.max_file_bytes {
            return Err(SkipReason::TooLarge {
                bytes: bytes.len() as u64,
                limit: self.config.max_file_bytes,
            });
        }

        let language = language::detect_language(path).ok_or(SkipReason::UnsupportedExtension)?;

        let content = std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| SkipReason::InvalidUtf8)?;

        let hash = content_hash(&content);
        if let Some(cached) = self.content_cache.get(path) {
            let (cached_hash, cached_extraction) = cached.value();
            if *cached_hash == hash {
                // Unchanged since an earlier phase of this same run touched
                // it (e.g. re-entrant incremental seeding): reuse the cached
                // extraction rather than re-parsing.
                return Ok(FileOutcome {
                    file_path: path.to_string(),
                    content,
                    language,
                    extraction: cached_extraction.clone(),
                });
            }
        }

        let parser = self.checkout_parser(language).ok_or_else(|| SkipReason::ParseFailed("no grammar".into()))?;
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let (result, parser) = self.parse_with_timeout(parser, language, path, &content, timeout);
        if let Some(parser) = parser {
            self.checkin_parser(language, parser);
        }
        let extraction = result?;
        self.content_cache.insert(path.to_string(), (hash, extraction.clone()));

        Ok(FileOutcome {
            file_path: path.to_string(),
            content,
            language,
            extraction,
        })
    }

    /// Runs the parse on a dedicated thread so a pathological grammar can be
    /// abandoned after `timeout` without blocking the worker. The checked-out
    /// parser travels into the spawned thread and comes back over the same
    /// channel as the result; a timed-out thread keeps it and it is not
    /// returned to the pool.
    fn parse_with_timeout(
        &self,
        mut parser: Parser,
        language: Language,
        path: &str,
        content: &str,
        timeout: Duration,
    ) -> (Result<ExtractionResult, SkipReason>, Option<Parser>) {
        let path_owned = path.to_string();
        let content_owned = content.to_string();
        let (tx, rx) = std::sync::mpsc::channel();

        let spawned = std::thread::Builder::new()
            .name(format!("codegraph-parse-{path_owned}"))
            .spawn(move || {
                let result = parse_content(&mut parser, language, &path_owned, &content_owned);
                let _ = tx.send((result, parser));
            });

        if let Err(e) = spawned {
            return (Err(SkipReason::ParseFailed(e.to_string())), None);
        }

        match rx.recv_timeout(timeout) {
            Ok((result, parser)) => (result, Some(parser)),
            Err(_) => (Err(SkipReason::ParseTimedOut), None),
        }
    }
}

fn parse_content(parser: &mut Parser, language: Language, path: &str, content: &str) -> Result<ExtractionResult, SkipReason> {
    let tree = parser
        .parse(content, None)
        .ok_or_else(|| SkipReason::ParseFailed("tree-sitter returned no tree".into()))?;

    // Syntax errors yield a partial tree; the file is still processed
    // (§4.4 step 3). If the error count is high, a tolerant re-parse on a
    // comment-stripped copy sometimes recovers a cleaner tree.
    if has_many_errors(&tree) {
        let cleaned = tolerant_clean(content);
        if let Some(retry_tree) = parser.parse(&cleaned, None) {
            if count_errors(&retry_tree) < count_errors(&tree) {
                let visitor = AstVisitor::new(language, path, &cleaned);
                return Ok(visitor.visit(&retry_tree));
            }
        }
    }

    let visitor = AstVisitor::new(language, path, content);
    Ok(visitor.visit(&tree))
}

fn has_many_errors(tree: &tree_sitter::Tree) -> bool {
    count_errors(tree) > 3
}

fn count_errors(tree: &tree_sitter::Tree) -> usize {
    let mut count = 0;
    let mut cursor = tree.root_node().walk();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            count += 1;
        }
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    count
}

/// A conservative, language-agnostic cleanup pass used only to retry a
/// failed parse: strips block and line comments, which are the most common
/// source of partial-tree noise in hand-edited files mid-save.
fn tolerant_clean(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            while let Some(c) = chars.next() {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    break;
                }
            }
            out.push(' ');
        } else if c == '/' && chars.peek() == Some(&'/') {
            for c in chars.by_ref() {
                if c == '\n' {
                    out.push('\n');
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn content_hash(content: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(content.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_small_batch_deterministically() {
        let files = vec![
            ("a.rs".to_string(), b"fn foo() { bar(); }".to_vec()),
            ("b.rs".to_string(), b"fn bar() {}".to_vec()),
        ];
        let pipeline = ParsePipeline::new(ParsingConfig::default());
        let (outcomes, warnings) = pipeline.parse_all(files);
        assert!(warnings.is_empty());
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn oversized_file_is_skipped() {
        let mut config = ParsingConfig::default();
        config.max_file_bytes = 4;
        let pipeline = ParsePipeline::new(config);
        let (outcomes, warnings) = pipeline.parse_all(vec![("big.rs".to_string(), b"fn foo() {}".to_vec())]);
        assert!(outcomes.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0].reason, SkipReason::TooLarge { .. }));
    }

    #[test]
    fn unsupported_extension_is_skipped() {
        let pipeline = ParsePipeline::new(ParsingConfig::default());
        let (outcomes, warnings) = pipeline.parse_all(vec![("README.md".to_string(), b"# hi".to_vec())]);
        assert!(outcomes.is_empty());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0].reason, SkipReason::UnsupportedExtension));
    }

    #[test]
    fn unchanged_content_reuses_cached_extraction() {
        let pipeline = ParsePipeline::new(ParsingConfig::default());
        let file = || vec![("a.rs".to_string(), b"fn foo() { bar(); }".to_vec())];

        let (first, warnings_a) = pipeline.parse_all(file());
        let (second, warnings_b) = pipeline.parse_all(file());

        assert!(warnings_a.is_empty());
        assert!(warnings_b.is_empty());
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].extraction.definitions.len(), second[0].extraction.definitions.len());
    }

    #[test]
    fn tolerant_clean_strips_comments() {
        let cleaned = tolerant_clean("fn a() {} // trailing\n/* block */ fn b() {}");
        assert!(!cleaned.contains("trailing"));
        assert!(!cleaned.contains("block"));
    }
}
