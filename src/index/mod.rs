//! Document Index Module
//!
//! Locates documents inside the source file without parsing it:
//!
//! ```text
//! boundary::scan ──> BoundaryRecord* ──> IndexSnapshot ──> IndexStore (cache)
//!                                             │
//!                                             └──> chunk::load_fast / load_slow
//! ```
//!
//! - **boundary**: regex-per-line scanner producing one record per document
//! - **snapshot**: ordered, id-addressable set of records plus the source mtime
//! - **store**: snapshot persistence behind the `IndexStore` trait
//! - **chunk**: raw text extraction by byte range or by line range

pub mod boundary;
pub mod chunk;
pub mod snapshot;
pub mod store;

pub use boundary::{scan, scan_reader, BoundaryScan, ScanMatch, ScanPatterns};
pub use chunk::{load_fast, load_slow, LoadPath};
pub use snapshot::{BoundaryRecord, IndexSnapshot};
pub use store::{CacheError, FileIndexStore, IndexStore, MemoryIndexStore, NoopIndexStore};
