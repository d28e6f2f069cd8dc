//! Zero-Copy Slice Parser
//!
//! Parses XML from a byte slice with zero-copy semantics.
//! Input references are maintained directly in the output.

use super::events::{EndElement, StartElement, XmlEvent};
use crate::core::attributes::{parse_attributes, tag_attribute_bytes, Attribute};
use crate::core::tokenizer::{Token, TokenKind, Tokenizer};
use std::borrow::Cow;

/// Zero-copy XML reader from a byte slice
pub struct SliceReader<'a> {
    input: &'a [u8],
    tokenizer: Tokenizer<'a>,
    finished: bool,
}

impl<'a> SliceReader<'a> {
    /// Create a new slice reader
    pub fn new(input: &'a [u8]) -> Self {
        SliceReader {
            input,
            tokenizer: Tokenizer::new(input),
            finished: false,
        }
    }

    /// Byte offset just past the last event returned
    pub fn position(&self) -> usize {
        self.tokenizer.position()
    }

    /// Get the next XML event
    ///
    /// Returns `EndDocument` once, then None. Input cut off inside markup
    /// also ends the document.
    pub fn next_event(&mut self) -> Option<XmlEvent<'a>> {
        if self.finished {
            return None;
        }

        loop {
            let Some(token) = self.tokenizer.next_token() else {
                self.finished = true;
                return Some(XmlEvent::EndDocument);
            };

            match token.kind {
                TokenKind::Eof => {
                    self.finished = true;
                    return Some(XmlEvent::EndDocument);
                }

                TokenKind::StartTag => {
                    let attrs = self.tag_attributes(&token);
                    let name = token.name?;
                    return Some(XmlEvent::StartElement(StartElement::new(name, attrs)));
                }

                TokenKind::EndTag => {
                    let name = token.name?;
                    return Some(XmlEvent::EndElement(EndElement::new(name)));
                }

                TokenKind::EmptyTag => {
                    let attrs = self.tag_attributes(&token);
                    let name = token.name?;
                    return Some(XmlEvent::EmptyElement(StartElement::new(name, attrs)));
                }

                TokenKind::Text => {
                    if let Some(content) = token.content {
                        if !content.is_empty() {
                            return Some(XmlEvent::Text(content));
                        }
                    }
                }

                TokenKind::CData => {
                    if let Some(content) = token.content {
                        return Some(XmlEvent::CData(content));
                    }
                }

                TokenKind::Comment => {
                    if let Some(content) = token.content {
                        return Some(XmlEvent::Comment(content));
                    }
                }

                TokenKind::ProcessingInstruction => {
                    return Some(XmlEvent::ProcessingInstruction {
                        target: token.name.unwrap_or(b""),
                        data: token.content,
                    });
                }

                TokenKind::XmlDeclaration => {
                    let attrs = self.tag_attributes(&token);
                    let version = find_value(&attrs, b"version").unwrap_or(Cow::Borrowed(b"1.0" as &[u8]));
                    let encoding = find_value(&attrs, b"encoding");
                    return Some(XmlEvent::XmlDeclaration { version, encoding });
                }

                TokenKind::DocType => {
                    let (start, end) = token.span;
                    return Some(XmlEvent::DocType(&self.input[start..end]));
                }
            }
        }
    }

    /// Parse attributes from a tag token
    fn tag_attributes(&self, token: &Token<'a>) -> Vec<Attribute<'a>> {
        let (start, end) = token.span;
        parse_attributes(tag_attribute_bytes(&self.input[start..end]))
    }
}

fn find_value<'a>(attrs: &[Attribute<'a>], name: &[u8]) -> Option<Cow<'a, [u8]>> {
    attrs.iter().find(|a| a.name.as_ref() == name).map(|a| a.value.clone())
}

impl<'a> Iterator for SliceReader<'a> {
    type Item = XmlEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event()? {
            XmlEvent::EndDocument => None,
            event => Some(event),
        }
    }
}
