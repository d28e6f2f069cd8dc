//! Streaming Element Capture
//!
//! Stateful parser that processes XML in chunks with bounded memory. Bytes
//! are fed in arbitrary pieces; every complete element whose name matches
//! the tag filter is captured as raw bytes, together with the line it
//! starts on. Consumed input is drained from the buffer as soon as it has
//! been tokenized.

use crate::core::scanner::{count_newlines, find_tag_end_quoted};
use crate::core::tokenizer::{TokenKind, Tokenizer};
use memchr::{memchr, memmem};
use std::collections::VecDeque;

/// A captured element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedElement {
    /// Raw bytes from `<tag` through the matching `</tag>`
    pub bytes: Vec<u8>,
    /// 0-based line of the opening tag in the whole stream
    pub line: usize,
}

/// Stateful streaming parser with a tag filter
pub struct StreamingParser {
    /// Accumulated buffer for incomplete input
    buffer: Vec<u8>,
    /// Complete elements ready to be consumed
    complete_elements: VecDeque<CapturedElement>,
    /// Builder for current element being captured
    element_builder: Option<ElementBuilder>,
    /// Current depth in element tree
    depth: usize,
    /// Tag filter (None captures every top-level element)
    tag_filter: Option<Vec<u8>>,
    /// Depth when we entered a target element (0 = not inside target)
    inside_target_depth: usize,
    /// Newlines in bytes already drained from the buffer
    lines_consumed: usize,
}

/// Builder for capturing complete elements
struct ElementBuilder {
    /// Accumulated bytes from previous chunks
    accumulated: Vec<u8>,
    /// Start position in current buffer (where element begins)
    start_in_buffer: usize,
    /// Line of the opening tag
    line: usize,
}

impl StreamingParser {
    /// Create a new streaming parser capturing every element at the outermost target depth
    pub fn new() -> Self {
        StreamingParser {
            buffer: Vec::with_capacity(8192),
            complete_elements: VecDeque::with_capacity(16),
            element_builder: None,
            depth: 0,
            tag_filter: None,
            inside_target_depth: 0,
            lines_consumed: 0,
        }
    }

    /// Create a new streaming parser with a tag filter
    pub fn with_filter(tag: &[u8]) -> Self {
        StreamingParser {
            tag_filter: Some(tag.to_vec()),
            ..Self::new()
        }
    }

    /// Feed a chunk of data to the parser
    pub fn feed(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
        self.process_buffer();
    }

    /// Process the buffer to extract complete elements
    fn process_buffer(&mut self) {
        let boundary = find_safe_boundary(&self.buffer);
        if boundary == 0 {
            return; // Not enough data
        }

        let consumed = self.process_slice(boundary);

        // If we're building an element that spans chunks, save processed content
        if let Some(ref mut builder) = self.element_builder {
            builder.accumulated.extend_from_slice(&self.buffer[builder.start_in_buffer..consumed]);
            builder.start_in_buffer = 0;
        }

        self.lines_consumed += count_newlines(&self.buffer[..consumed]);
        self.buffer.drain(..consumed);
    }

    /// Tokenize `buffer[..boundary]`, returning how many bytes were consumed
    fn process_slice(&mut self, boundary: usize) -> usize {
        let mut tokenizer = Tokenizer::new(&self.buffer[..boundary]);

        while let Some(token) = tokenizer.next_token() {
            match token.kind {
                TokenKind::Eof => break,

                TokenKind::StartTag => {
                    self.depth += 1;
                    let is_entering_target =
                        self.inside_target_depth == 0 && token.name.is_some_and(|n| self.is_target_tag(n));
                    if is_entering_target {
                        self.inside_target_depth = self.depth;
                        let start = token.span.0;
                        self.element_builder = Some(ElementBuilder {
                            accumulated: Vec::new(),
                            start_in_buffer: start,
                            line: self.lines_consumed + count_newlines(&self.buffer[..start]),
                        });
                    }
                }

                TokenKind::EndTag => {
                    if self.depth > 0 && self.depth == self.inside_target_depth {
                        self.inside_target_depth = 0;
                        if let Some(builder) = self.element_builder.take() {
                            let mut element = builder.accumulated;
                            element.extend_from_slice(&self.buffer[builder.start_in_buffer..token.span.1]);
                            self.complete_elements.push_back(CapturedElement {
                                bytes: element,
                                line: builder.line,
                            });
                        }
                    }
                    self.depth = self.depth.saturating_sub(1);
                }

                TokenKind::EmptyTag => {
                    let is_target_at_top =
                        self.inside_target_depth == 0 && token.name.is_some_and(|n| self.is_target_tag(n));
                    if is_target_at_top {
                        let (start, end) = token.span;
                        self.complete_elements.push_back(CapturedElement {
                            bytes: self.buffer[start..end].to_vec(),
                            line: self.lines_consumed + count_newlines(&self.buffer[..start]),
                        });
                    }
                }

                _ => {}
            }
        }

        tokenizer.position()
    }

    /// Check if this is a target tag we're looking for
    fn is_target_tag(&self, tag: &[u8]) -> bool {
        match &self.tag_filter {
            Some(filter) => tag == filter.as_slice(),
            None => true,
        }
    }

    /// Take the next complete element, in document order
    pub fn take_element(&mut self) -> Option<CapturedElement> {
        self.complete_elements.pop_front()
    }

    /// Get buffer size
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Check if an element is being captured across chunks
    pub fn in_element(&self) -> bool {
        self.element_builder.is_some()
    }

    /// Lines fully consumed so far
    pub fn lines_consumed(&self) -> usize {
        self.lines_consumed
    }

    /// Finalize at end of input
    ///
    /// An element still open at end of input is dropped. Returns the number
    /// of trailing bytes that could not be tokenized.
    pub fn finalize(&mut self) -> usize {
        let leftover = self.buffer.len();
        self.buffer.clear();
        self.element_builder = None;
        self.inside_target_depth = 0;
        leftover
    }

    /// Release buffer capacity left over from large elements
    pub fn release_memory(&mut self) {
        self.buffer.shrink_to(8192);
        self.complete_elements.shrink_to(16);
    }
}

impl Default for StreamingParser {
    fn default() -> Self {
        Self::new()
    }
}

/// End of the last complete markup construct in `buf`
///
/// Walks from '<' to '<' so that '>' inside text, quoted attribute values,
/// comments, CDATA and processing instructions never ends a chunk early.
/// Returns 0 if no construct is complete yet.
pub fn find_safe_boundary(buf: &[u8]) -> usize {
    let mut last = 0;
    let mut pos = 0;

    while let Some(offset) = memchr(b'<', &buf[pos..]) {
        let start = pos + offset;
        let rest = &buf[start..];

        let end = if rest.starts_with(b"<!--") {
            memmem::find(&rest[4..], b"-->").map(|i| start + 4 + i + 3)
        } else if rest.starts_with(b"<![CDATA[") {
            memmem::find(&rest[9..], b"]]>").map(|i| start + 9 + i + 3)
        } else if rest.starts_with(b"<?") {
            memmem::find(&rest[2..], b"?>").map(|i| start + 2 + i + 2)
        } else if rest.len() < 9 && (b"<![CDATA[".starts_with(rest) || b"<!--".starts_with(rest)) {
            // Too short to tell which construct this is
            None
        } else {
            find_tag_end_quoted(buf, start + 1).map(|i| i + 1)
        };

        match end {
            Some(end) => {
                last = end;
                pos = end;
            }
            None => break,
        }
    }

    last
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(parser: &mut StreamingParser) -> Vec<String> {
        std::iter::from_fn(|| parser.take_element())
            .map(|e| String::from_utf8(e.bytes).unwrap())
            .collect()
    }

    #[test]
    fn test_capture_filtered_elements() {
        let mut parser = StreamingParser::with_filter(b"item");
        parser.feed(b"<root><item a=\"1\">x</item><other/><item/></root>");
        assert_eq!(texts(&mut parser), vec!["<item a=\"1\">x</item>", "<item/>"]);
    }

    #[test]
    fn test_element_split_across_chunks() {
        let mut parser = StreamingParser::with_filter(b"token");
        for chunk in [&b"<sentence><tok"[..], b"en text=\"a>b\">", b"<l t=\"x\"/></tok", b"en></sentence>"] {
            parser.feed(chunk);
        }
        assert_eq!(texts(&mut parser), vec!["<token text=\"a>b\"><l t=\"x\"/></token>"]);
        assert!(!parser.in_element());
    }

    #[test]
    fn test_nested_same_name_captured_once() {
        let mut parser = StreamingParser::with_filter(b"v");
        parser.feed(b"<v><v/></v><v/>");
        assert_eq!(texts(&mut parser), vec!["<v><v/></v>", "<v/>"]);
    }

    #[test]
    fn test_line_numbers() {
        let mut parser = StreamingParser::with_filter(b"text");
        parser.feed(b"<annotation>\n<text id=\"1\">\n</te");
        parser.feed(b"xt>\r\n\n<text id=\"2\"/>\n</annotation>\n");
        let elements: Vec<_> = std::iter::from_fn(|| parser.take_element()).collect();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].line, 1);
        assert_eq!(elements[1].line, 4);
        assert_eq!(parser.lines_consumed(), 5);
    }

    #[test]
    fn test_buffer_drained() {
        let mut parser = StreamingParser::with_filter(b"s");
        parser.feed(b"<r><s>a</s>");
        assert_eq!(parser.buffer_size(), 0);
        assert!(parser.take_element().is_some());
        assert!(parser.take_element().is_none());
        parser.feed(b"<s>partial");
        assert!(parser.in_element());
        assert_eq!(parser.finalize(), 7);
    }

    #[test]
    fn test_safe_boundary() {
        assert_eq!(find_safe_boundary(b"<a>text > more"), 3);
        assert_eq!(find_safe_boundary(b"<a b=\"x>y\""), 0);
        assert_eq!(find_safe_boundary(b"<a/><!-- > -->"), 14);
        assert_eq!(find_safe_boundary(b"<a/><!-- > "), 4);
        assert_eq!(find_safe_boundary(b"<a/><![CDATA[ >"), 4);
        assert_eq!(find_safe_boundary(b"<a/><!-"), 4);
        assert_eq!(find_safe_boundary(b"text only"), 0);
    }
}
