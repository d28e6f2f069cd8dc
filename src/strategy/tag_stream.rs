//! Tag Stream - file-driven streaming iterator
//!
//! Reads the source in fixed-size chunks, feeds a [`StreamingParser`] and
//! yields every captured element as an owned [`XmlTree`]. Only the element
//! being yielded and the unconsumed tail of the current chunk are held in
//! memory, so peak usage follows the largest single element, not the file.
//!
//! Each call opens a fresh pass; dropping the stream closes the file.

use super::streaming::StreamingParser;
use crate::dom::XmlTree;
use crate::error::{CorpusError, Result};
use crate::reader::buffered::{BufferedReader, DEFAULT_BUFFER_SIZE};
use crate::reader::events::XmlEvent;
use crate::reader::slice::SliceReader;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Iterator over every `tag` element of a file, in document order
pub struct TagStream<R: Read> {
    reader: BufferedReader<R>,
    parser: StreamingParser,
    path: PathBuf,
    clear_after_yield: bool,
    finished: bool,
    yielded: usize,
}

/// Stream every `tag` element of the file at `path`
pub fn iter_tag(path: &Path, tag: &str, clear_after_yield: bool) -> Result<TagStream<File>> {
    iter_tag_with_chunk_size(path, tag, clear_after_yield, DEFAULT_BUFFER_SIZE)
}

/// Same as [`iter_tag`] with an explicit read size
pub fn iter_tag_with_chunk_size(
    path: &Path,
    tag: &str,
    clear_after_yield: bool,
    chunk_size: usize,
) -> Result<TagStream<File>> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    debug!(path = %path.display(), tag, chunk_size, "opening tag stream");
    Ok(stream_reader(file, path, tag, clear_after_yield, chunk_size))
}

/// Stream from any reader; `path` only labels errors
pub fn stream_reader<R: Read>(
    reader: R,
    path: impl Into<PathBuf>,
    tag: &str,
    clear_after_yield: bool,
    chunk_size: usize,
) -> TagStream<R> {
    TagStream {
        reader: BufferedReader::with_capacity(reader, chunk_size),
        parser: StreamingParser::with_filter(tag.as_bytes()),
        path: path.into(),
        clear_after_yield,
        finished: false,
        yielded: 0,
    }
}

impl<R: Read> Iterator for TagStream<R> {
    type Item = Result<XmlTree>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(element) = self.parser.take_element() {
                let line = element.line;
                let text = match String::from_utf8(element.bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        self.finished = true;
                        self.parser.finalize();
                        return Some(Err(CorpusError::Decode { line }));
                    }
                };

                let tree = XmlTree::parse(&text);
                drop(text);
                if self.clear_after_yield {
                    self.parser.release_memory();
                }
                self.yielded += 1;
                return Some(Ok(tree));
            }

            if self.finished {
                return None;
            }

            match self.reader.fill_buffer() {
                Ok(true) => {
                    let n = self.reader.buffered().len();
                    self.parser.feed(self.reader.buffered());
                    self.reader.consume(n);
                }
                Ok(false) => {
                    self.finished = true;
                    let truncated = self.parser.in_element();
                    let leftover = self.parser.finalize();
                    debug!(elements = self.yielded, leftover, truncated, "tag stream finished");
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(CorpusError::io(&self.path, e)));
                }
            }
        }
    }
}

/// Upper bound on how much of the file head is read looking for the root element
const ROOT_SEARCH_LIMIT: usize = 1024 * 1024;

/// Attributes of the root element, if it is named `tag`
///
/// Reads only as much of the file as is needed to see the first start tag.
pub fn read_root_attributes(path: &Path, tag: &str) -> Result<Option<Vec<(String, String)>>> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    let mut reader = BufferedReader::with_capacity(file, 8192);

    loop {
        let more = reader.fill_buffer().map_err(|e| CorpusError::io(path, e))?;
        let head = reader.buffered();

        let mut events = SliceReader::new(head);
        while let Some(event) = events.next_event() {
            match event {
                XmlEvent::StartElement(elem) | XmlEvent::EmptyElement(elem) => {
                    if elem.name != tag.as_bytes() {
                        return Ok(None);
                    }
                    let attrs = elem
                        .attributes
                        .iter()
                        .map(|a| {
                            (
                                String::from_utf8_lossy(&a.name).into_owned(),
                                String::from_utf8_lossy(&a.value).into_owned(),
                            )
                        })
                        .collect();
                    return Ok(Some(attrs));
                }
                XmlEvent::EndElement(_) => return Ok(None),
                _ => {}
            }
        }

        if !more || head.len() >= ROOT_SEARCH_LIMIT {
            return Ok(None);
        }
    }
}
