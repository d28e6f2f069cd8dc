//! Corpus facade
//!
//! `CorpusIndex` ties the pieces together:
//! - the index snapshot is loaded from the store or rebuilt by the boundary
//!   scanner on first use, then kept for the life of the handle
//! - selections resolve to boundary records; each document is fetched with
//!   the chunk loader and parsed into a `DocumentView`
//! - unfiltered bulk reads skip the index and stream the file by tag
//!
//! Every accessor exists in a lazy `iter_*` form returning [`CorpusIter`]
//! and a list form that collects it.

pub mod selection;
pub mod views;

pub use selection::{GlobMatcher, Selection};
pub use views::{
    Analysis, DocumentView, Paragraph, ParagraphView, ParsedParagraph, ParsedSentence, ParsedWord,
    Sentence, SentenceView, TaggedParagraph, TaggedSentence, TaggedWord, TextUnit, TokenView,
};

use crate::config::{CacheSetting, CorpusConfig};
use crate::dom::{NodeId, XmlTree};
use crate::error::{CorpusError, Result};
use crate::index::store::{self, FileIndexStore, IndexStore, NoopIndexStore};
use crate::index::{boundary, chunk, IndexSnapshot, LoadPath, ScanPatterns};
use crate::strategy::tag_stream::{iter_tag_with_chunk_size, read_root_attributes};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{debug, info, warn};
use views::{TAG_PARAGRAPH, TAG_SENTENCE};

/// Name of the corpus root element carrying version information
const ANNOTATION_TAG: &str = "annotation";

/// Version and revision of the corpus dump
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationInfo {
    pub version: String,
    pub revision: String,
}

/// Lazy sequence of corpus items
///
/// Stops after the first error. Dropping it closes any open file.
pub struct CorpusIter<'c, T> {
    inner: Box<dyn Iterator<Item = Result<T>> + 'c>,
    failed: bool,
}

impl<'c, T> CorpusIter<'c, T> {
    fn new(inner: impl Iterator<Item = Result<T>> + 'c) -> Self {
        CorpusIter {
            inner: Box::new(inner),
            failed: false,
        }
    }
}

impl<T> Iterator for CorpusIter<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.inner.next()?;
        self.failed = item.is_err();
        Some(item)
    }
}

/// Indexed, streaming reader over one corpus file
pub struct CorpusIndex {
    path: PathBuf,
    config: CorpusConfig,
    patterns: ScanPatterns,
    store: Box<dyn IndexStore>,
    snapshot: OnceLock<IndexSnapshot>,
    globs: GlobMatcher,
}

impl CorpusIndex {
    /// Open a corpus with the default configuration
    ///
    /// Nothing is read until the first operation that needs the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_config(path, CorpusConfig::default())
    }

    /// Open a corpus; the snapshot store follows `config.cache`
    pub fn with_config(path: impl AsRef<Path>, config: CorpusConfig) -> Result<Self> {
        let path = path.as_ref();
        let store: Box<dyn IndexStore> = match &config.cache {
            CacheSetting::Beside => Box::new(FileIndexStore::beside(path)),
            CacheSetting::At(cache) => Box::new(FileIndexStore::new(cache)),
            CacheSetting::Disabled => Box::new(NoopIndexStore),
        };
        Self::build(path, config, store)
    }

    /// Open a corpus with an explicit snapshot store
    pub fn with_store(path: impl AsRef<Path>, config: CorpusConfig, store: impl IndexStore + 'static) -> Result<Self> {
        Self::build(path.as_ref(), config, Box::new(store))
    }

    fn build(path: &Path, config: CorpusConfig, store: Box<dyn IndexStore>) -> Result<Self> {
        let patterns = ScanPatterns::from_config(&config)?;
        let globs = GlobMatcher::new(config.pattern_cache_capacity);
        Ok(CorpusIndex {
            path: path.to_path_buf(),
            config,
            patterns,
            store,
            snapshot: OnceLock::new(),
            globs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &CorpusConfig {
        &self.config
    }

    // ========================================================================
    // Index
    // ========================================================================

    /// The index snapshot, loading or building it on first use
    pub fn snapshot(&self) -> Result<&IndexSnapshot> {
        if let Some(snapshot) = self.snapshot.get() {
            return Ok(snapshot);
        }
        let snapshot = self.load_or_build()?;
        Ok(self.snapshot.get_or_init(|| snapshot))
    }

    fn load_or_build(&self) -> Result<IndexSnapshot> {
        match self.store.load(&self.path) {
            Ok(Some(snapshot)) => {
                debug!(documents = snapshot.len(), "index snapshot loaded from cache");
                return Ok(snapshot);
            }
            Ok(None) => debug!(path = %self.path.display(), "index cache miss"),
            Err(e) => warn!(error = %e, "index cache unusable, rescanning"),
        }

        let started = Instant::now();
        let source_mtime = store::modified(&self.path).map_err(|e| CorpusError::io(&self.path, e))?;
        let records = boundary::scan_records(&self.path, self.patterns.clone())?;
        let snapshot = IndexSnapshot::from_records(records, source_mtime);
        info!(
            documents = snapshot.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index snapshot built"
        );

        if let Err(e) = self.store.store(&self.path, &snapshot) {
            warn!(error = %e, "failed to store index snapshot");
        }
        Ok(snapshot)
    }

    /// `(id, title)` of the selected documents
    pub fn catalog(&self, selection: &Selection) -> Result<Vec<(String, String)>> {
        let records = selection::resolve(self.snapshot()?, selection, &self.globs)?;
        Ok(records
            .into_iter()
            .map(|r| (r.document_id.clone(), r.title.clone()))
            .collect())
    }

    /// Ids of the selected documents
    pub fn fileids(&self, selection: &Selection) -> Result<Vec<String>> {
        let records = selection::resolve(self.snapshot()?, selection, &self.globs)?;
        Ok(records.into_iter().map(|r| r.document_id.clone()).collect())
    }

    /// Sorted union of the categories of `selection.fileids` (all documents if None)
    ///
    /// `selection.categories` narrows the returned categories to those matching a glob.
    pub fn categories(&self, selection: &Selection) -> Result<Vec<String>> {
        let by_id = Selection {
            fileids: selection.fileids.clone(),
            categories: None,
        };
        let records = selection::resolve(self.snapshot()?, &by_id, &self.globs)?;
        let globs = match &selection.categories {
            Some(patterns) => Some(self.globs.compile_all(patterns)?),
            None => None,
        };

        let categories: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.categories.iter())
            .filter(|c| match &globs {
                Some(globs) => globs.iter().any(|g| g.is_match(c)),
                None => true,
            })
            .map(String::as_str)
            .collect();
        Ok(categories.into_iter().map(str::to_string).collect())
    }

    /// Raw text of one document through the chosen extraction path
    pub fn load_document_raw(&self, document_id: &str, path: LoadPath) -> Result<String> {
        let record = self
            .snapshot()?
            .get(document_id)
            .ok_or_else(|| CorpusError::unknown(document_id))?;
        match path {
            LoadPath::Fast => chunk::load_fast(&self.path, record),
            LoadPath::Slow => chunk::load_slow(&self.path, record),
        }
    }

    /// Fetch and parse one document
    pub fn get_document(&self, document_id: &str) -> Result<DocumentView> {
        let raw = self.load_document_raw(document_id, LoadPath::Fast)?;
        DocumentView::parse(&raw)
    }

    /// Version and revision from the root `annotation` element
    pub fn annotation_info(&self) -> Result<Option<AnnotationInfo>> {
        let Some(attrs) = read_root_attributes(&self.path, ANNOTATION_TAG)? else {
            return Ok(None);
        };
        let get = |name: &str| {
            attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        Ok(Some(AnnotationInfo {
            version: get("version"),
            revision: get("revision"),
        }))
    }

    // ========================================================================
    // Lazy accessors
    // ========================================================================

    fn stream(&self, tag: &str) -> Result<crate::strategy::TagStream<std::fs::File>> {
        iter_tag_with_chunk_size(&self.path, tag, self.config.clear_after_yield, self.config.read_chunk_size)
    }

    /// Items from streamed `stream_tag` elements when unfiltered, else from selected documents
    fn iter_units<'c, T, S, D>(
        &'c self,
        selection: &Selection,
        stream_tag: &str,
        from_stream: S,
        from_document: D,
    ) -> Result<CorpusIter<'c, T>>
    where
        T: 'c,
        S: Fn(&XmlTree, NodeId) -> Vec<T> + 'c,
        D: Fn(&DocumentView) -> Vec<T> + 'c,
    {
        if selection.is_unfiltered() {
            let items = self.stream(stream_tag)?.flat_map(move |tree| -> Vec<Result<T>> {
                match tree {
                    Ok(tree) => match tree.root_element_id() {
                        Some(root) => from_stream(&tree, root).into_iter().map(Ok).collect(),
                        None => Vec::new(),
                    },
                    Err(e) => vec![Err(e)],
                }
            });
            return Ok(CorpusIter::new(items));
        }

        let ids: Vec<String> = selection::resolve(self.snapshot()?, selection, &self.globs)?
            .into_iter()
            .map(|r| r.document_id.clone())
            .collect();
        let items = ids.into_iter().flat_map(move |id| -> Vec<Result<T>> {
            match self.get_document(&id) {
                Ok(doc) => from_document(&doc).into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            }
        });
        Ok(CorpusIter::new(items))
    }

    pub fn iter_documents(&self, selection: &Selection) -> Result<CorpusIter<'_, DocumentView>> {
        if selection.is_unfiltered() {
            let docs = self
                .stream(&self.config.document_tag)?
                .map(|tree| tree.and_then(DocumentView::from_tree));
            return Ok(CorpusIter::new(docs));
        }

        let ids = self.fileids(selection)?;
        Ok(CorpusIter::new(ids.into_iter().map(move |id| self.get_document(&id))))
    }

    pub fn iter_raw_documents(&self, selection: &Selection) -> Result<CorpusIter<'_, String>> {
        let docs = self.iter_documents(selection)?;
        Ok(CorpusIter::new(docs.map(|doc| doc.map(|d| d.raw()))))
    }

    pub fn iter_words(&self, selection: &Selection) -> Result<CorpusIter<'_, String>> {
        self.iter_units(
            selection,
            TAG_SENTENCE,
            |tree, node| SentenceView::new(tree, node).words(),
            |doc| doc.words(),
        )
    }

    pub fn iter_tagged_words(&self, selection: &Selection) -> Result<CorpusIter<'_, TaggedWord>> {
        self.iter_units(
            selection,
            TAG_SENTENCE,
            |tree, node| SentenceView::new(tree, node).tagged_words(),
            |doc| doc.tagged_words(),
        )
    }

    pub fn iter_parsed_words(&self, selection: &Selection) -> Result<CorpusIter<'_, ParsedWord>> {
        self.iter_units(
            selection,
            TAG_SENTENCE,
            |tree, node| SentenceView::new(tree, node).parsed_words(),
            |doc| doc.parsed_words(),
        )
    }

    pub fn iter_sents(&self, selection: &Selection) -> Result<CorpusIter<'_, Sentence>> {
        self.iter_units(
            selection,
            TAG_SENTENCE,
            |tree, node| vec![SentenceView::new(tree, node).words()],
            |doc| doc.sents(),
        )
    }

    pub fn iter_tagged_sents(&self, selection: &Selection) -> Result<CorpusIter<'_, TaggedSentence>> {
        self.iter_units(
            selection,
            TAG_SENTENCE,
            |tree, node| vec![SentenceView::new(tree, node).tagged_words()],
            |doc| doc.tagged_sents(),
        )
    }

    pub fn iter_parsed_sents(&self, selection: &Selection) -> Result<CorpusIter<'_, ParsedSentence>> {
        self.iter_units(
            selection,
            TAG_SENTENCE,
            |tree, node| vec![SentenceView::new(tree, node).parsed_words()],
            |doc| doc.parsed_sents(),
        )
    }

    pub fn iter_raw_sents(&self, selection: &Selection) -> Result<CorpusIter<'_, String>> {
        self.iter_units(
            selection,
            TAG_SENTENCE,
            |tree, node| vec![SentenceView::new(tree, node).source()],
            |doc| doc.raw_sents(),
        )
    }

    pub fn iter_paras(&self, selection: &Selection) -> Result<CorpusIter<'_, Paragraph>> {
        self.iter_units(
            selection,
            TAG_PARAGRAPH,
            |tree, node| vec![ParagraphView::new(tree, node).sents()],
            |doc| doc.paras(),
        )
    }

    pub fn iter_tagged_paras(&self, selection: &Selection) -> Result<CorpusIter<'_, TaggedParagraph>> {
        self.iter_units(
            selection,
            TAG_PARAGRAPH,
            |tree, node| vec![ParagraphView::new(tree, node).tagged_sents()],
            |doc| doc.tagged_paras(),
        )
    }

    pub fn iter_parsed_paras(&self, selection: &Selection) -> Result<CorpusIter<'_, ParsedParagraph>> {
        self.iter_units(
            selection,
            TAG_PARAGRAPH,
            |tree, node| vec![ParagraphView::new(tree, node).parsed_sents()],
            |doc| doc.parsed_paras(),
        )
    }

    pub fn iter_raw_paras(&self, selection: &Selection) -> Result<CorpusIter<'_, String>> {
        self.iter_units(
            selection,
            TAG_PARAGRAPH,
            |tree, node| vec![ParagraphView::new(tree, node).raw()],
            |doc| doc.raw_paras(),
        )
    }

    // ========================================================================
    // List accessors
    // ========================================================================

    pub fn documents(&self, selection: &Selection) -> Result<Vec<DocumentView>> {
        self.iter_documents(selection)?.collect()
    }

    pub fn raw_documents(&self, selection: &Selection) -> Result<Vec<String>> {
        self.iter_raw_documents(selection)?.collect()
    }

    /// Raw text of the selected documents separated by two blank lines
    pub fn raw(&self, selection: &Selection) -> Result<String> {
        Ok(self.raw_documents(selection)?.join("\n\n\n"))
    }

    pub fn words(&self, selection: &Selection) -> Result<Vec<String>> {
        self.iter_words(selection)?.collect()
    }

    pub fn tagged_words(&self, selection: &Selection) -> Result<Vec<TaggedWord>> {
        self.iter_tagged_words(selection)?.collect()
    }

    pub fn parsed_words(&self, selection: &Selection) -> Result<Vec<ParsedWord>> {
        self.iter_parsed_words(selection)?.collect()
    }

    pub fn sents(&self, selection: &Selection) -> Result<Vec<Sentence>> {
        self.iter_sents(selection)?.collect()
    }

    pub fn tagged_sents(&self, selection: &Selection) -> Result<Vec<TaggedSentence>> {
        self.iter_tagged_sents(selection)?.collect()
    }

    pub fn parsed_sents(&self, selection: &Selection) -> Result<Vec<ParsedSentence>> {
        self.iter_parsed_sents(selection)?.collect()
    }

    pub fn raw_sents(&self, selection: &Selection) -> Result<Vec<String>> {
        self.iter_raw_sents(selection)?.collect()
    }

    pub fn paras(&self, selection: &Selection) -> Result<Vec<Paragraph>> {
        self.iter_paras(selection)?.collect()
    }

    pub fn tagged_paras(&self, selection: &Selection) -> Result<Vec<TaggedParagraph>> {
        self.iter_tagged_paras(selection)?.collect()
    }

    pub fn parsed_paras(&self, selection: &Selection) -> Result<Vec<ParsedParagraph>> {
        self.iter_parsed_paras(selection)?.collect()
    }

    pub fn raw_paras(&self, selection: &Selection) -> Result<Vec<String>> {
        self.iter_raw_paras(selection)?.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MemoryIndexStore;

    const CORPUS: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
<annotation version=\"0.12\" revision=\"4063674\">\n\
<text id=\"1\" parent=\"0\" name=\"Первый\">\n\
<tags>\n\
<tag>Тип:Газета</tag>\n\
</tags>\n\
<paragraphs><paragraph id=\"1\"><sentence id=\"1\"><source>Раз два</source><tokens>\n\
<token id=\"1\" text=\"Раз\"><tfr rev_id=\"1\" t=\"Раз\"><v><l id=\"1\" t=\"раз\"><g v=\"NOUN\"/></l></v></tfr></token>\n\
<token id=\"2\" text=\"два\"><tfr rev_id=\"2\" t=\"два\"><v><l id=\"2\" t=\"два\"><g v=\"NUMR\"/></l></v></tfr></token>\n\
</tokens></sentence></paragraph></paragraphs>\n\
</text>\n\
<text id=\"2\" parent=\"0\" name=\"Второй\">\n\
<tags>\n\
<tag>Автор:Кто-то</tag>\n\
</tags>\n\
<paragraphs><paragraph id=\"2\"><sentence id=\"2\"><source>Три</source><tokens>\n\
<token id=\"3\" text=\"Три\"><tfr rev_id=\"3\" t=\"Три\"><v/></tfr></token>\n\
</tokens></sentence></paragraph></paragraphs>\n\
</text>\n\
</annotation>\n";

    fn corpus() -> (tempfile::TempDir, CorpusIndex) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annot.xml");
        std::fs::write(&path, CORPUS).unwrap();
        let config = CorpusConfig::default().with_cache(CacheSetting::Disabled);
        let corpus = CorpusIndex::with_config(&path, config).unwrap();
        (dir, corpus)
    }

    #[test]
    fn test_catalog_and_fileids() {
        let (_dir, corpus) = corpus();
        assert_eq!(corpus.fileids(&Selection::all()).unwrap(), vec!["1", "2"]);
        assert_eq!(
            corpus.catalog(&Selection::all()).unwrap(),
            vec![("1".to_string(), "Первый".to_string()), ("2".to_string(), "Второй".to_string())]
        );
        assert_eq!(
            corpus.fileids(&Selection::all().with_category("Автор:*")).unwrap(),
            vec!["2"]
        );
    }

    #[test]
    fn test_categories() {
        let (_dir, corpus) = corpus();
        assert_eq!(corpus.categories(&Selection::all()).unwrap(), vec!["Автор:Кто-то", "Тип:Газета"]);
        assert_eq!(corpus.categories(&Selection::fileid("1")).unwrap(), vec!["Тип:Газета"]);
        assert_eq!(
            corpus.categories(&Selection::all().with_category("Автор:*")).unwrap(),
            vec!["Автор:Кто-то"]
        );
    }

    #[test]
    fn test_streamed_and_selected_agree() {
        let (_dir, corpus) = corpus();
        let streamed = corpus.words(&Selection::all()).unwrap();
        let selected = corpus.words(&Selection::fileids(["1", "2"])).unwrap();
        assert_eq!(streamed, vec!["Раз", "два", "Три"]);
        assert_eq!(streamed, selected);

        assert_eq!(
            corpus.tagged_words(&Selection::fileid("2")).unwrap(),
            vec![("Три".to_string(), "UNKN".to_string())]
        );
        assert_eq!(corpus.raw_paras(&Selection::all()).unwrap(), vec!["Раз два", "Три"]);
    }

    #[test]
    fn test_raw_and_documents() {
        let (_dir, corpus) = corpus();
        let docs = corpus.documents(&Selection::all()).unwrap();
        assert_eq!(docs.iter().map(|d| d.id()).collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(corpus.raw(&Selection::all()).unwrap(), "Раз два\n\n\nТри");
    }

    #[test]
    fn test_unknown_document() {
        let (_dir, corpus) = corpus();
        assert!(matches!(corpus.get_document("9"), Err(CorpusError::UnknownDocument { .. })));
        assert!(matches!(
            corpus.words(&Selection::fileids(["1", "9"])),
            Err(CorpusError::UnknownDocument { .. })
        ));
    }

    #[test]
    fn test_annotation_info() {
        let (_dir, corpus) = corpus();
        assert_eq!(
            corpus.annotation_info().unwrap(),
            Some(AnnotationInfo {
                version: "0.12".into(),
                revision: "4063674".into()
            })
        );
    }

    #[test]
    fn test_memory_store_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annot.xml");
        std::fs::write(&path, CORPUS).unwrap();

        let first = CorpusIndex::with_store(&path, CorpusConfig::default(), MemoryIndexStore::new()).unwrap();
        let snapshot = first.snapshot().unwrap().clone();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("2").unwrap().categories, vec!["Автор:Кто-то"]);

        let store = MemoryIndexStore::with_snapshot(snapshot.clone());
        let second = CorpusIndex::with_store(&path, CorpusConfig::default(), store).unwrap();
        assert_eq!(second.snapshot().unwrap(), &snapshot);
    }

    #[test]
    fn test_invalid_config_pattern() {
        let config = CorpusConfig::default().with_document_start("(");
        assert!(matches!(
            CorpusIndex::with_config("/nonexistent", config),
            Err(CorpusError::Pattern { .. })
        ));
    }
}
