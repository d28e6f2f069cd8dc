//! RustyCorpus - indexed streaming access to OpenCorpora-style XML corpora
//!
//! Access paths:
//! A: Boundary scan (index) - one line-oriented pass records where each document lives
//! B: Index cache (index::store) - the scan result persisted beside the corpus
//! C: Chunk load (index::chunk) - byte-range or line-range extraction of one document
//! D: Document views (corpus::views) - words, sentences, paragraphs and raw text of one document
//! E: Tag streaming (strategy) - bulk traversal of the whole file by element name
//!
//! `CorpusIndex` is the entry point:
//!
//! ```no_run
//! use rustycorpus::{CorpusIndex, Selection};
//!
//! let corpus = CorpusIndex::open("annot.opcorpora.xml")?;
//! let words = corpus.words(&Selection::fileids(["2", "3"]))?;
//! let authors = corpus.fileids(&Selection::all().with_category("Автор:*"))?;
//! # Ok::<(), rustycorpus::CorpusError>(())
//! ```

pub mod config;
pub mod core;
pub mod corpus;
pub mod dom;
pub mod error;
pub mod index;
pub mod reader;
pub mod strategy;

#[cfg(feature = "nif")]
mod nif;
#[cfg(feature = "nif")]
mod resource;
#[cfg(feature = "nif")]
mod term;

pub use config::{CacheSetting, CorpusConfig};
pub use corpus::{views, AnnotationInfo, CorpusIndex, CorpusIter, DocumentView, Selection, TextUnit};
pub use error::{CorpusError, Result};
pub use index::{BoundaryRecord, IndexSnapshot, IndexStore, LoadPath};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
pub(crate) mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                PEAK_ALLOCATED.fetch_max(current, Ordering::Relaxed);
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Bytes currently allocated and the peak since the last reset
///
/// Both are zero unless built with `memory_tracking`.
pub fn memory_stats() -> (usize, usize) {
    #[cfg(feature = "memory_tracking")]
    {
        use std::sync::atomic::Ordering;
        (
            tracking::ALLOCATED.load(Ordering::SeqCst),
            tracking::PEAK_ALLOCATED.load(Ordering::SeqCst),
        )
    }
    #[cfg(not(feature = "memory_tracking"))]
    {
        (0, 0)
    }
}

/// Reset the peak to the current allocation, returning the previous `(current, peak)`
pub fn reset_memory_stats() -> (usize, usize) {
    #[cfg(feature = "memory_tracking")]
    {
        use std::sync::atomic::Ordering;
        let current = tracking::ALLOCATED.load(Ordering::SeqCst);
        let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
        (current, peak)
    }
    #[cfg(not(feature = "memory_tracking"))]
    {
        (0, 0)
    }
}
