//! XML Tokenizer - State machine for XML token extraction
//!
//! Implements a lenient pull-parser style tokenizer that extracts XML tokens:
//! - Element start/end tags
//! - Text content (entity-decoded)
//! - CDATA sections
//! - Comments
//! - Processing instructions and the XML declaration
//! - DOCTYPE declarations (skipped as a single token)
//!
//! Well-formedness is not validated. A construct that is cut off by the end
//! of the input stops tokenization and leaves [`Tokenizer::position`] at its
//! first byte, so a chunked caller can retry once more input arrives.

use super::entities::decode_text;
use super::scanner::Scanner;
use std::borrow::Cow;

/// Current parsing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// Initial state before parsing starts
    Init,
    /// Between tokens
    InsideText,
    /// End of input reached, or an incomplete construct was found
    Done,
}

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...--> (also unknown <!...> declarations)
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
    /// End of input
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input (start, end)
    pub span: (usize, usize),
    /// For tags and PIs: the name
    pub name: Option<&'a [u8]>,
    /// For text/cdata/comments: the content (owned only if entities were decoded)
    pub content: Option<Cow<'a, [u8]>>,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: &'a [u8]) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: Cow<'a, [u8]>) -> Self {
        self.content = Some(content);
        self
    }
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    state: ParseState,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            state: ParseState::Init,
        }
    }

    /// Get the current parse state
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Byte offset just past the last complete token
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Get the next token, or None at end of input / on an incomplete construct
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        if self.state == ParseState::Done {
            return None;
        }

        if self.state == ParseState::Init {
            self.scanner.skip_whitespace();
            self.state = ParseState::InsideText;
        }

        let start = self.scanner.position();
        if self.scanner.is_eof() {
            self.state = ParseState::Done;
            return Some(Token::new(TokenKind::Eof, (start, start)));
        }

        let token = match self.scanner.peek() {
            Some(b'<') => self.parse_markup(start),
            _ => self.parse_text(start),
        };

        if token.is_none() {
            self.scanner.set_position(start);
            self.state = ParseState::Done;
        }
        token
    }

    /// Parse markup starting with '<'
    fn parse_markup(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1);

        match self.scanner.peek()? {
            b'/' => self.parse_end_tag(start),
            b'!' => self.parse_bang_markup(start),
            b'?' => self.parse_pi(start),
            _ => self.parse_start_tag(start),
        }
    }

    /// Parse a start tag or empty element tag
    fn parse_start_tag(&mut self, start: usize) -> Option<Token<'a>> {
        let Some(name) = self.scanner.read_name() else {
            return Some(self.stray_angle(start));
        };

        let end = self.scanner.find_tag_end_quoted()?;
        let is_empty = end > start && self.scanner.slice(end - 1, end) == b"/";
        self.scanner.set_position(end + 1);

        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Some(Token::new(kind, (start, end + 1)).with_name(name))
    }

    /// Parse an end tag
    fn parse_end_tag(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1); // Skip '/'

        let Some(name) = self.scanner.read_name() else {
            return Some(self.stray_angle(start));
        };

        let end = self.scanner.find_byte(b'>')?;
        self.scanner.set_position(end + 1);
        Some(Token::new(TokenKind::EndTag, (start, end + 1)).with_name(name))
    }

    /// A '<' that does not open markup is kept as text
    fn stray_angle(&mut self, start: usize) -> Token<'a> {
        self.scanner.set_position(start + 1);
        Token::new(TokenKind::Text, (start, start + 1)).with_content(Cow::Borrowed(self.scanner.slice(start, start + 1)))
    }

    /// Parse markup starting with '!' (comment, CDATA, DOCTYPE)
    fn parse_bang_markup(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1); // Skip '!'

        if self.scanner.starts_with(b"--") {
            self.scanner.advance(2);
            self.parse_delimited(start, b"-->", TokenKind::Comment)
        } else if self.scanner.starts_with(b"[CDATA[") {
            self.scanner.advance(7);
            self.parse_delimited(start, b"]]>", TokenKind::CData)
        } else if self.scanner.starts_with(b"DOCTYPE") {
            self.parse_doctype(start)
        } else {
            // Unknown declaration: skip it like a comment
            let content_start = self.scanner.position();
            let end = self.scanner.find_byte(b'>')?;
            self.scanner.set_position(end + 1);
            Some(Token::new(TokenKind::Comment, (start, end + 1))
                .with_content(Cow::Borrowed(self.scanner.slice(content_start, end))))
        }
    }

    /// Parse content up to a terminator (comments, CDATA)
    fn parse_delimited(&mut self, start: usize, terminator: &[u8], kind: TokenKind) -> Option<Token<'a>> {
        let content_start = self.scanner.position();
        let end = self.scanner.find_sequence(terminator)?;
        self.scanner.set_position(end + terminator.len());
        Some(Token::new(kind, (start, self.scanner.position()))
            .with_content(Cow::Borrowed(self.scanner.slice(content_start, end))))
    }

    /// Parse a DOCTYPE declaration, including an internal subset
    fn parse_doctype(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(7); // Skip 'DOCTYPE'

        let rest = self.scanner.remaining();
        let base = self.scanner.position();
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;

        for (i, &b) in rest.iter().enumerate() {
            match (quote, b) {
                (Some(q), _) if q == b => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => {
                    let end = base + i + 1;
                    self.scanner.set_position(end);
                    return Some(Token::new(TokenKind::DocType, (start, end)));
                }
                _ => {}
            }
        }
        None
    }

    /// Parse a processing instruction <?...?>
    fn parse_pi(&mut self, start: usize) -> Option<Token<'a>> {
        self.scanner.advance(1); // Skip '?'

        let name = self.scanner.read_name().unwrap_or(b"");
        let content_start = self.scanner.position();
        let end = self.scanner.find_sequence(b"?>")?;
        self.scanner.set_position(end + 2);

        let kind = if name.eq_ignore_ascii_case(b"xml") {
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };
        Some(Token::new(kind, (start, end + 2))
            .with_name(name)
            .with_content(Cow::Borrowed(self.scanner.slice(content_start, end))))
    }

    /// Parse text content up to the next '<'
    fn parse_text(&mut self, start: usize) -> Option<Token<'a>> {
        let end = self.scanner.find_tag_start().unwrap_or(start + self.scanner.remaining().len());
        let content = self.scanner.slice(start, end);
        self.scanner.set_position(end);
        Some(Token::new(TokenKind::Text, (start, end)).with_content(decode_text(content)))
    }
}

/// Iterator adapter for tokenizer
impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token()?;
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
