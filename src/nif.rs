//! NIF surface (`Elixir.RustyCorpus.Native`)
//!
//! Every call that touches the corpus file runs on a dirty I/O scheduler.
//! Selections arrive as two optional lists: document ids and category globs.

use crate::config::{CacheSetting, CorpusConfig};
use crate::corpus::views::{ParsedWord, TaggedWord};
use crate::corpus::Selection;
use crate::index::LoadPath;
use crate::resource::{CorpusRef, CorpusResource};
use crate::term::{error_to_nif, str_to_binary};
use rustler::{Env, NifResult, ResourceArc, Term};
use std::path::{Path, PathBuf};

fn selection(ids: Option<Vec<String>>, globs: Option<Vec<String>>) -> Selection {
    Selection {
        fileids: ids,
        categories: globs,
    }
}

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

#[rustler::nif]
fn get_rust_memory() -> usize {
    crate::memory_stats().0
}

#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    crate::memory_stats().1
}

#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    crate::reset_memory_stats()
}

// ============================================================================
// Corpus Handle
// ============================================================================

/// Open a corpus; `cache` is `nil` for the default location, `""` to disable
#[rustler::nif]
fn corpus_open(path: String, cache: Option<String>) -> NifResult<CorpusRef> {
    let cache = match cache.as_deref() {
        None => CacheSetting::Beside,
        Some("") => CacheSetting::Disabled,
        Some(p) => CacheSetting::At(PathBuf::from(p)),
    };
    let config = CorpusConfig::default().with_cache(cache);
    let resource = CorpusResource::open(Path::new(&path), config).map_err(error_to_nif)?;
    Ok(ResourceArc::new(resource))
}

/// Number of indexed documents; builds or loads the index
#[rustler::nif(schedule = "DirtyIo")]
fn corpus_document_count(corpus: CorpusRef) -> NifResult<usize> {
    corpus.corpus.snapshot().map(|s| s.len()).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_annotation_info(corpus: CorpusRef) -> NifResult<Option<(String, String)>> {
    let info = corpus.corpus.annotation_info().map_err(error_to_nif)?;
    Ok(info.map(|i| (i.version, i.revision)))
}

// ============================================================================
// Catalog
// ============================================================================

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_fileids(corpus: CorpusRef, ids: Option<Vec<String>>, globs: Option<Vec<String>>) -> NifResult<Vec<String>> {
    corpus.corpus.fileids(&selection(ids, globs)).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_catalog(corpus: CorpusRef, globs: Option<Vec<String>>) -> NifResult<Vec<(String, String)>> {
    corpus.corpus.catalog(&selection(None, globs)).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_categories(corpus: CorpusRef, ids: Option<Vec<String>>, patterns: Option<Vec<String>>) -> NifResult<Vec<String>> {
    corpus.corpus.categories(&selection(ids, patterns)).map_err(error_to_nif)
}

// ============================================================================
// Text Accessors
// ============================================================================

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_words(corpus: CorpusRef, ids: Option<Vec<String>>, globs: Option<Vec<String>>) -> NifResult<Vec<String>> {
    corpus.corpus.words(&selection(ids, globs)).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_tagged_words(
    corpus: CorpusRef,
    ids: Option<Vec<String>>,
    globs: Option<Vec<String>>,
) -> NifResult<Vec<TaggedWord>> {
    corpus.corpus.tagged_words(&selection(ids, globs)).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_parsed_words(
    corpus: CorpusRef,
    ids: Option<Vec<String>>,
    globs: Option<Vec<String>>,
) -> NifResult<Vec<ParsedWord>> {
    corpus.corpus.parsed_words(&selection(ids, globs)).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_sents(corpus: CorpusRef, ids: Option<Vec<String>>, globs: Option<Vec<String>>) -> NifResult<Vec<Vec<String>>> {
    corpus.corpus.sents(&selection(ids, globs)).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_tagged_sents(
    corpus: CorpusRef,
    ids: Option<Vec<String>>,
    globs: Option<Vec<String>>,
) -> NifResult<Vec<Vec<TaggedWord>>> {
    corpus.corpus.tagged_sents(&selection(ids, globs)).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_paras(
    corpus: CorpusRef,
    ids: Option<Vec<String>>,
    globs: Option<Vec<String>>,
) -> NifResult<Vec<Vec<Vec<String>>>> {
    corpus.corpus.paras(&selection(ids, globs)).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_raw_sents(corpus: CorpusRef, ids: Option<Vec<String>>, globs: Option<Vec<String>>) -> NifResult<Vec<String>> {
    corpus.corpus.raw_sents(&selection(ids, globs)).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_raw_paras(corpus: CorpusRef, ids: Option<Vec<String>>, globs: Option<Vec<String>>) -> NifResult<Vec<String>> {
    corpus.corpus.raw_paras(&selection(ids, globs)).map_err(error_to_nif)
}

#[rustler::nif(schedule = "DirtyIo")]
fn corpus_raw<'a>(
    env: Env<'a>,
    corpus: CorpusRef,
    ids: Option<Vec<String>>,
    globs: Option<Vec<String>>,
) -> NifResult<Term<'a>> {
    let text = corpus.corpus.raw(&selection(ids, globs)).map_err(error_to_nif)?;
    Ok(str_to_binary(env, &text))
}

/// Raw XML of one document; `slow` forces line-based extraction
#[rustler::nif(schedule = "DirtyIo")]
fn corpus_document_raw<'a>(env: Env<'a>, corpus: CorpusRef, id: String, slow: bool) -> NifResult<Term<'a>> {
    let path = if slow { LoadPath::Slow } else { LoadPath::Fast };
    let xml = corpus.corpus.load_document_raw(&id, path).map_err(error_to_nif)?;
    Ok(str_to_binary(env, &xml))
}

rustler::init!("Elixir.RustyCorpus.Native");
