//! Streaming Strategy Module
//!
//! Bulk traversal that bypasses the document index:
//! - StreamingParser: chunk-fed capture of complete elements by tag name
//! - TagStream: file-driven iterator yielding each captured element as an `XmlTree`

pub mod streaming;
pub mod tag_stream;

pub use streaming::{CapturedElement, StreamingParser};
pub use tag_stream::{iter_tag, iter_tag_with_chunk_size, read_root_attributes, stream_reader, TagStream};
