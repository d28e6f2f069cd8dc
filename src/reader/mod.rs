//! XML Reader Module
//!
//! Provides the pull-parsing layer used by the corpus:
//! - SliceReader: Zero-copy slice parser over one captured element
//! - BufferedReader: Chunked reads from any `Read` source for streaming
//! - Events: XML event types for pull parsing

pub mod buffered;
pub mod events;
pub mod slice;

pub use buffered::BufferedReader;
pub use events::{EndElement, StartElement, XmlEvent};
pub use slice::SliceReader;
