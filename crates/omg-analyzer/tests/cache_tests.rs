//! Document cache: version invalidation, parse reuse and re-validation.

use std::fs;

use omg_analyzer::{DocumentCache, ValidatorConfig};
use omg_types::DiagnosticCode;

const URI: &str = "file:///work/greetings.omg";

#[test]
fn test_update_and_get() {
    let mut cache = DocumentCache::new();
    assert!(cache.is_empty());
    let doc = cache.update(URI, 1, "greeting = hello", None);
    assert_eq!(doc.version, 1);
    assert_eq!(doc.diagnostics.len(), 1);
    assert_eq!(doc.diagnostics[0].code, DiagnosticCode::UndefinedReference);

    assert_eq!(cache.len(), 1);
    let got = cache.get(URI, 1).unwrap();
    assert_eq!(got.text, "greeting = hello");
    assert!(got.parse.errors.is_empty());
}

#[test]
fn test_new_text_replaces_entry() {
    let mut cache = DocumentCache::new();
    cache.update(URI, 1, "greeting = hello", None);
    cache.update(URI, 2, "greeting = \"hello\"", None);

    assert!(cache.get(URI, 1).is_none());
    let doc = cache.get(URI, 2).unwrap();
    assert!(doc.diagnostics.is_empty());
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().parse_misses, 2);
}

#[test]
fn test_resubmitting_same_revision_is_a_hit() {
    let mut cache = DocumentCache::new();
    let first = cache.update(URI, 3, "a = \"x\"", None).fingerprint.clone();
    let second = cache.update(URI, 3, "a = \"x\"", None).fingerprint.clone();
    assert_eq!(first, second);
    let stats = cache.stats();
    assert_eq!(stats.parse_misses, 1);
    assert_eq!(stats.parse_hits, 1);
}

#[test]
fn test_documents_are_independent() {
    let mut cache = DocumentCache::new();
    cache.update("file:///a.omg", 1, "a = \"x\"", None);
    cache.update("file:///b.omg", 7, "b = y", None);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("file:///b.omg", 7).map(|d| d.version), Some(7));

    let removed = cache.remove("file:///a.omg").unwrap();
    assert_eq!(removed.version, 1);
    assert!(cache.get("file:///a.omg", 1).is_none());
    assert!(cache.remove("file:///a.omg").is_none());
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_new_version_revalidates_files() {
    let dir = tempfile::tempdir().unwrap();
    let text = "import \"names.txt\" as names\nr = [[names]]";
    let mut cache = DocumentCache::new();

    let doc = cache.update(URI, 1, text, Some(dir.path()));
    assert_eq!(doc.diagnostics.len(), 1);
    assert_eq!(doc.diagnostics[0].code, DiagnosticCode::MissingImportFile);

    fs::write(dir.path().join("names.txt"), "ada\n").unwrap();
    let doc = cache.update(URI, 2, text, Some(dir.path()));
    assert!(doc.diagnostics.is_empty());
    assert_eq!(cache.stats().parse_misses, 1);
}

#[test]
fn test_cache_config_applies() {
    let config = ValidatorConfig {
        check_files: false,
        ..ValidatorConfig::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let mut cache = DocumentCache::with_config(config);
    assert!(!cache.config().check_files);
    let doc = cache.update(URI, 1, "import \"none.txt\" as n", Some(dir.path()));
    assert!(doc.diagnostics.is_empty());
}

#[test]
fn test_syntax_errors_cached_as_diagnostics() {
    let mut cache = DocumentCache::new();
    let doc = cache.update(URI, 1, "r = (\"x\"", None);
    assert_eq!(doc.parse.errors.len(), 1);
    assert_eq!(doc.diagnostics.len(), 1);
    assert_eq!(doc.diagnostics[0].code, DiagnosticCode::SyntaxError);
}
