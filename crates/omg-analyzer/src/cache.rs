//! Per-document analysis cache.
//!
//! Entries are keyed by document URI and tagged with the editor's version
//! number. A lookup for any other version misses. When a new version has
//! the same text as the cached one (a save, or an undo back to it) the
//! parse is reused and only the validator runs again, since files on disk
//! may have changed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use omg_types::{Diagnostic, ParseResult};

use crate::config::ValidatorConfig;

/// One analyzed revision of a document.
#[derive(Debug, Clone)]
pub struct CachedDocument {
    pub version: i32,
    /// SHA-256 of the text, lowercase hex.
    pub fingerprint: String,
    pub text: String,
    pub parse: ParseResult,
    pub diagnostics: Vec<Diagnostic>,
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Updates that reused an existing parse.
    pub parse_hits: u64,
    /// Updates that had to parse.
    pub parse_misses: u64,
    /// Lookups for a version other than the cached one.
    pub stale_lookups: u64,
}

#[derive(Debug, Default)]
struct Counters {
    parse_hits: AtomicU64,
    parse_misses: AtomicU64,
    stale_lookups: AtomicU64,
}

impl Counters {
    fn record_hit(&self) {
        self.parse_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.parse_misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_stale(&self) {
        self.stale_lookups.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            parse_hits: self.parse_hits.load(Ordering::Relaxed),
            parse_misses: self.parse_misses.load(Ordering::Relaxed),
            stale_lookups: self.stale_lookups.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default)]
pub struct DocumentCache {
    documents: HashMap<String, CachedDocument>,
    config: ValidatorConfig,
    counters: Counters,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Record revision `version` of `uri` and return its analysis.
    ///
    /// Re-submitting the version already cached, with the same text and
    /// base directory, returns the cached entry untouched.
    pub fn update(
        &mut self,
        uri: &str,
        version: i32,
        text: &str,
        base_dir: Option<&Path>,
    ) -> &CachedDocument {
        let fingerprint = fingerprint(text);
        let base_dir = base_dir.map(Path::to_path_buf);

        let previous = self.documents.remove(uri);
        let entry = match previous {
            Some(doc)
                if doc.version == version
                    && doc.fingerprint == fingerprint
                    && doc.base_dir == base_dir =>
            {
                trace!(uri, version, "document unchanged");
                self.counters.record_hit();
                doc
            }
            Some(doc) if doc.fingerprint == fingerprint => {
                debug!(uri, version, "text unchanged; reusing parse");
                self.counters.record_hit();
                let diagnostics =
                    crate::diagnostics_for(&doc.parse, text, base_dir.as_deref(), &self.config);
                CachedDocument {
                    version,
                    diagnostics,
                    base_dir,
                    ..doc
                }
            }
            _ => {
                debug!(uri, version, "parsing new revision");
                self.counters.record_miss();
                let parse = omg_parser::parse(text);
                let diagnostics =
                    crate::diagnostics_for(&parse, text, base_dir.as_deref(), &self.config);
                CachedDocument {
                    version,
                    fingerprint,
                    text: text.to_string(),
                    parse,
                    diagnostics,
                    base_dir,
                }
            }
        };

        self.documents.entry(uri.to_string()).or_insert(entry)
    }

    /// The cached analysis of `uri` if it is for exactly `version`.
    pub fn get(&self, uri: &str, version: i32) -> Option<&CachedDocument> {
        let doc = self.documents.get(uri)?;
        if doc.version == version {
            Some(doc)
        } else {
            trace!(uri, cached = doc.version, requested = version, "stale cache lookup");
            self.counters.record_stale();
            None
        }
    }

    /// Forget `uri`, e.g. when the editor closes it.
    pub fn remove(&mut self, uri: &str) -> Option<CachedDocument> {
        self.documents.remove(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

/// SHA-256 of `text` as lowercase hex.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
