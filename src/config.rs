//! Corpus configuration
//!
//! Line patterns for the boundary scanner, the streaming memory policy and
//! the cache location. Every field has a default matching the OpenCorpora
//! annotation dump, so `CorpusConfig::default()` opens that format as-is.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default document start line: `<text id="..." ... name="...">`
pub const DEFAULT_DOCUMENT_START: &str = r#"\s*<text\s+id="(?P<id>[^"]+)"[^>]*\sname="(?P<title>[^"]*)""#;

/// Default document end line
pub const DEFAULT_DOCUMENT_END: &str = r#"\s*</text>"#;

/// Default category element; every occurrence inside a document is collected
pub const DEFAULT_CATEGORY_LINE: &str = r#"<tag>(?P<category>.*?)</tag>"#;

/// Where the index snapshot is persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSetting {
    /// Next to the source file as `<source>.~`
    #[default]
    Beside,
    /// At an explicit path
    At(PathBuf),
    /// No persistence; the snapshot lives only in memory
    Disabled,
}

impl CacheSetting {
    /// Resolve the cache file path for a source file
    pub fn path_for(&self, source: &Path) -> Option<PathBuf> {
        match self {
            CacheSetting::Beside => Some(beside_path(source)),
            CacheSetting::At(path) => Some(path.clone()),
            CacheSetting::Disabled => None,
        }
    }
}

/// `<source>.~`
pub fn beside_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(".~");
    PathBuf::from(name)
}

/// Corpus reader configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Regex matching a document's opening line; captures `id` and `title`
    pub document_start: String,
    /// Regex matching a document's closing line
    pub document_end: String,
    /// Regex matching one category line inside an open document; captures `category`
    pub category_line: String,
    /// Element name of a document for streaming traversal
    pub document_tag: String,
    /// Snapshot persistence
    pub cache: CacheSetting,
    /// Bytes read per chunk while streaming
    pub read_chunk_size: usize,
    /// Release parser buffers after every streamed element
    pub clear_after_yield: bool,
    /// Capacity of the compiled category glob cache
    pub pattern_cache_capacity: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        CorpusConfig {
            document_start: DEFAULT_DOCUMENT_START.to_string(),
            document_end: DEFAULT_DOCUMENT_END.to_string(),
            category_line: DEFAULT_CATEGORY_LINE.to_string(),
            document_tag: "text".to_string(),
            cache: CacheSetting::Beside,
            read_chunk_size: 64 * 1024,
            clear_after_yield: true,
            pattern_cache_capacity: 64,
        }
    }
}

impl CorpusConfig {
    pub fn with_document_start(mut self, pattern: impl Into<String>) -> Self {
        self.document_start = pattern.into();
        self
    }

    pub fn with_document_end(mut self, pattern: impl Into<String>) -> Self {
        self.document_end = pattern.into();
        self
    }

    pub fn with_category_line(mut self, pattern: impl Into<String>) -> Self {
        self.category_line = pattern.into();
        self
    }

    pub fn with_document_tag(mut self, tag: impl Into<String>) -> Self {
        self.document_tag = tag.into();
        self
    }

    pub fn with_cache(mut self, cache: CacheSetting) -> Self {
        self.cache = cache;
        self
    }

    /// Chunk size is clamped to at least one byte
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    pub fn with_clear_after_yield(mut self, clear: bool) -> Self {
        self.clear_after_yield = clear;
        self
    }

    pub fn with_pattern_cache_capacity(mut self, capacity: usize) -> Self {
        self.pattern_cache_capacity = capacity;
        self
    }
}
