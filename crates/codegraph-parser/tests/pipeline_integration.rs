use codegraph_core::{IgnoreConfig, FileWalker, ParsingConfig};
use codegraph_parser::{IgnoreFilterWalker, ParsePipeline};
use std::fs;

#[test]
fn walks_and_parses_a_two_file_repository() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a.ts"),
        "import { bar } from './b';\nfunction foo() { bar(); }\n",
    )
    .unwrap();
    fs::write(dir.path().join("b.ts"), "export function bar() {}\n").unwrap();

    let walker = IgnoreFilterWalker::new(IgnoreConfig::default());
    let files = walker.walk(dir.path()).unwrap();
    assert_eq!(files.len(), 2);

    let pipeline = ParsePipeline::new(ParsingConfig::default());
    let (outcomes, warnings) = pipeline.parse_all(files);
    assert!(warnings.is_empty());
    assert_eq!(outcomes.len(), 2);

    let a = outcomes.iter().find(|o| o.file_path == "a.ts").unwrap();
    assert_eq!(a.extraction.definitions.len(), 1);
    assert_eq!(a.extraction.imports.len(), 1);
    assert_eq!(a.extraction.call_sites.len(), 1);
    assert_eq!(a.extraction.call_sites[0].called_name, "bar");
}
