//! Layered extraction context threaded through every pipeline call.
//!
//! `ScrapeContext` replaces ambient/global state: it carries the active
//! [`Config`], the HTTP [`Fetcher`], the URL of the page being worked on,
//! and the shared provenance accumulator. `with_*` methods derive a child
//! context that overrides one value; the parent is never mutated, so
//! sibling extractions cannot observe each other's overrides.
//!
//! The one deliberately shared piece is the [`SourceLog`]: children created
//! with [`ScrapeContext::with_url`] keep pointing at the same accumulator,
//! so nested producers contribute provenance to the document being built.
//! [`ScrapeContext::with_fresh_sources`] starts a new accumulator at each
//! top-level document boundary.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::config::Config;
use crate::document::{Document, Value};
use crate::http::Fetcher;

/// A provenance record: one distinct url with its merged notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub url: String,
    /// All notes recorded for this url, lexicographically sorted and
    /// joined with `", "`.
    pub note: String,
}

impl SourceRecord {
    /// Render as a `{url, note}` document for embedding in output.
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("url", Value::Text(self.url.clone()));
        doc.insert("note", Value::Text(self.note.clone()));
        doc
    }
}

/// Accumulates `(note, url)` provenance pairs during one document build.
///
/// Urls keep first-seen order; notes for the same url are deduplicated.
#[derive(Debug, Default)]
pub struct SourceLog {
    entries: IndexMap<String, BTreeSet<String>>,
}

impl SourceLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one provenance pair.
    pub fn add(&mut self, note: impl Into<String>, url: impl Into<String>) {
        self.entries
            .entry(url.into())
            .or_default()
            .insert(note.into());
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One record per distinct url, in first-seen url order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SourceRecord> {
        self.entries
            .iter()
            .map(|(url, notes)| SourceRecord {
                url: url.clone(),
                note: notes.iter().cloned().collect::<Vec<_>>().join(", "),
            })
            .collect()
    }
}

/// Immutable layered context for one extraction call chain.
#[derive(Clone)]
pub struct ScrapeContext {
    config: Rc<Config>,
    fetcher: Rc<dyn Fetcher>,
    url: String,
    sources: Rc<RefCell<SourceLog>>,
}

impl ScrapeContext {
    /// Create a root context for a jurisdiction.
    ///
    /// The current url starts at the config's `root_url` and a fresh
    /// source log is attached.
    #[must_use]
    pub fn new(config: Rc<Config>, fetcher: Rc<dyn Fetcher>) -> Self {
        let url = config.root_url.clone();
        Self {
            config,
            fetcher,
            url,
            sources: Rc::new(RefCell::new(SourceLog::new())),
        }
    }

    /// Child context working on a different page url.
    ///
    /// The source log is shared by reference with the parent.
    #[must_use]
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.url = url.into();
        child
    }

    /// Child context with a new, empty source log.
    ///
    /// Called at each top-level document boundary so sibling documents
    /// never share provenance.
    #[must_use]
    pub fn with_fresh_sources(&self) -> Self {
        let mut child = self.clone();
        child.sources = Rc::new(RefCell::new(SourceLog::new()));
        child
    }

    /// The active jurisdiction config.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the active config.
    #[must_use]
    pub fn config_rc(&self) -> Rc<Config> {
        Rc::clone(&self.config)
    }

    /// The HTTP fetcher.
    #[must_use]
    pub fn fetcher(&self) -> &dyn Fetcher {
        self.fetcher.as_ref()
    }

    /// Url of the page this context is working on.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Record one provenance pair into the shared log.
    pub fn record_source(&self, note: impl Into<String>, url: impl Into<String>) {
        self.sources.borrow_mut().add(note, url);
    }

    /// Snapshot of the shared log as records.
    #[must_use]
    pub fn source_records(&self) -> Vec<SourceRecord> {
        self.sources.borrow().snapshot()
    }

    /// Snapshot of the shared log as a `sources` list field value.
    #[must_use]
    pub fn sources_value(&self) -> Value {
        Value::List(
            self.source_records()
                .iter()
                .map(SourceRecord::to_document)
                .collect(),
        )
    }
}

impl fmt::Debug for ScrapeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrapeContext")
            .field("jurisdiction", &self.config.name)
            .field("url", &self.url)
            .field("sources", &self.sources.borrow().entries.len())
            .finish()
    }
}
