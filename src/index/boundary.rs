//! Boundary scanner
//!
//! One pass over the source, line by line, with caller-supplied regexes:
//! - a start pattern captures the document id and title
//! - an end pattern closes the open document; it is searched anywhere in the
//!   line, so a document may open and close on the same line
//! - an optional category pattern is searched for every occurrence on each
//!   line of an open document, its start and end lines included
//!
//! The scanner never parses XML. It assumes documents are not nested and
//! tolerates `\n`, `\r\n` and mixed line endings since offsets are counted
//! on raw bytes.

use super::snapshot::BoundaryRecord;
use crate::config::CorpusConfig;
use crate::core::entities::decode_str;
use crate::error::{CorpusError, Result};
use regex::{Captures, Regex};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compiled line patterns; only the start pattern is anchored at line start
#[derive(Debug, Clone)]
pub struct ScanPatterns {
    start: Regex,
    end: Regex,
    category: Option<Regex>,
}

impl ScanPatterns {
    /// Compile start and end patterns
    pub fn new(start: &str, end: &str) -> Result<Self> {
        Ok(ScanPatterns {
            start: anchored(start)?,
            end: unanchored(end)?,
            category: None,
        })
    }

    /// Also collect categories matched by `pattern` inside open documents
    pub fn with_category(mut self, pattern: &str) -> Result<Self> {
        self.category = Some(unanchored(pattern)?);
        Ok(self)
    }

    /// Patterns from a corpus configuration
    pub fn from_config(config: &CorpusConfig) -> Result<Self> {
        Self::new(&config.document_start, &config.document_end)?.with_category(&config.category_line)
    }
}

fn anchored(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})")).map_err(|source| CorpusError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn unanchored(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| CorpusError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Groups captured by the start pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanMatch {
    /// `id` group, or group 1
    pub document_id: String,
    /// `title` group, or group 2, as written in the file
    pub raw_title: String,
    /// All numbered groups of the start match
    pub groups: Vec<Option<String>>,
}

impl ScanMatch {
    fn from_captures(caps: &Captures<'_>) -> Self {
        let group = |name: &str, index: usize| {
            caps.name(name)
                .or_else(|| caps.get(index))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };
        ScanMatch {
            document_id: group("id", 1),
            raw_title: group("title", 2),
            groups: caps
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()))
                .collect(),
        }
    }
}

/// A document whose start line was seen but not yet its end line
///
/// `record.line_end` and `record.byte_end` are filled in on close.
struct OpenDocument {
    matched: ScanMatch,
    record: BoundaryRecord,
}

/// Lazy scan over a line source, yielding one record per closed document
///
/// Fused after the first error.
pub struct BoundaryScan<R: BufRead> {
    reader: R,
    path: PathBuf,
    patterns: ScanPatterns,
    buf: Vec<u8>,
    line: usize,
    offset: u64,
    open: Option<OpenDocument>,
    emitted: usize,
    done: bool,
}

/// Scan a file from the start
pub fn scan(path: &Path, patterns: ScanPatterns) -> Result<BoundaryScan<BufReader<File>>> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    Ok(scan_reader(BufReader::new(file), path, patterns))
}

/// Scan any buffered reader; `path` only labels errors
pub fn scan_reader<R: BufRead>(reader: R, path: impl Into<PathBuf>, patterns: ScanPatterns) -> BoundaryScan<R> {
    BoundaryScan {
        reader,
        path: path.into(),
        patterns,
        buf: Vec::with_capacity(256),
        line: 0,
        offset: 0,
        open: None,
        emitted: 0,
        done: false,
    }
}

impl<R: BufRead> BoundaryScan<R> {
    fn fail(&mut self, err: CorpusError) -> Option<Result<(ScanMatch, BoundaryRecord)>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for BoundaryScan<R> {
    type Item = Result<(ScanMatch, BoundaryRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            let n = match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(n) => n,
                Err(source) => {
                    let path = self.path.clone();
                    return self.fail(CorpusError::Scan { path, source });
                }
            };

            if n == 0 {
                self.done = true;
                if let Some(open) = self.open.take() {
                    debug!(document_id = %open.matched.document_id, "document left open at end of file");
                }
                debug!(documents = self.emitted, lines = self.line, bytes = self.offset, "boundary scan finished");
                return None;
            }

            let line_index = self.line;
            let line_offset = self.offset;
            self.line += 1;
            self.offset += n as u64;

            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line,
                Err(_) => {
                    self.done = true;
                    return Some(Err(CorpusError::Decode { line: line_index }));
                }
            };

            if let Some(caps) = self.patterns.start.captures(line) {
                if let Some(prev) = &self.open {
                    debug!(document_id = %prev.matched.document_id, line = line_index, "unterminated document replaced");
                }
                let matched = ScanMatch::from_captures(&caps);
                let record = BoundaryRecord {
                    document_id: matched.document_id.clone(),
                    title: decode_str(&matched.raw_title).into_owned(),
                    line_start: line_index,
                    line_end: line_index,
                    byte_start: line_offset,
                    byte_end: self.offset,
                    categories: Vec::new(),
                };
                self.open = Some(OpenDocument { matched, record });
            }

            if let (Some(open), Some(category)) = (self.open.as_mut(), self.patterns.category.as_ref()) {
                for caps in category.captures_iter(line) {
                    if let Some(value) = caps.name("category").or_else(|| caps.get(1)) {
                        open.record.push_category(decode_str(value.as_str()).into_owned());
                    }
                }
            }

            // A close without an open is ignored; either way nothing stays open
            if self.patterns.end.is_match(line) {
                if let Some(OpenDocument { matched, mut record }) = self.open.take() {
                    self.emitted += 1;
                    record.line_end = line_index;
                    record.byte_end = self.offset;
                    return Some(Ok((matched, record)));
                }
            }
        }
        None
    }
}

impl<R: BufRead> std::iter::FusedIterator for BoundaryScan<R> {}

/// Scan a whole file into records
pub fn scan_records(path: &Path, patterns: ScanPatterns) -> Result<Vec<BoundaryRecord>> {
    scan(path, patterns)?
        .map(|item| item.map(|(_, record)| record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"yes\"?>\n\
<annotation version=\"0.12\" revision=\"4063674\">\n\
<text id=\"1\" parent=\"0\" name=\"&quot;Частный корреспондент&quot;\">\n\
<tags>\n\
<tag>url:http://www.chaskor.ru</tag>\n\
<tag>Тип:Газета</tag>\n\
</tags>\n\
<paragraphs/>\n\
</text>\n\
<text id=\"2\" parent=\"1\" name=\"00021 Школа злословия\"><tags><tag>Тема:ЧасКор:Медиа</tag></tags>\n\
</text>\n\
</annotation>\n";

    fn patterns() -> ScanPatterns {
        ScanPatterns::from_config(&CorpusConfig::default()).unwrap()
    }

    fn scan_str(input: &str) -> Vec<BoundaryRecord> {
        scan_reader(Cursor::new(input.as_bytes().to_vec()), "test.xml", patterns())
            .map(|r| r.unwrap().1)
            .collect()
    }

    #[test]
    fn test_records_and_offsets() {
        let records = scan_str(SAMPLE);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.document_id, "1");
        assert_eq!(first.title, "\"Частный корреспондент\"");
        assert_eq!((first.line_start, first.line_end), (2, 8));
        assert_eq!(first.categories, vec!["url:http://www.chaskor.ru", "Тип:Газета"]);

        let text = &SAMPLE.as_bytes()[first.byte_start as usize..first.byte_end as usize];
        let text = std::str::from_utf8(text).unwrap();
        assert!(text.starts_with("<text id=\"1\""));
        assert!(text.ends_with("</text>\n"));
    }

    #[test]
    fn test_single_line_document() {
        let records = scan_str("<text id=\"7\" name=\"t\"><p/></text>\n");
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].line_start, records[0].line_end), (0, 0));
        assert_eq!(records[0].byte_end, 34);
    }

    #[test]
    fn test_categories_on_start_line() {
        let records = scan_str(SAMPLE);
        assert_eq!(records[1].categories, vec!["Тема:ЧасКор:Медиа"]);
    }

    #[test]
    fn test_several_categories_per_line() {
        let input = "<text id=\"1\" name=\"a\">\n\
<tags><tag>Автор:Яна</tag><tag>Культура</tag><tag>Автор:Яна</tag></tags>\n\
</text>\n\
<text id=\"2\" name=\"b\"><tags><tag>Автор:Кто</tag><tag>Тип:&quot;Газета&quot;</tag></tags><paragraphs/></text>\n";
        let records = scan_str(input);
        assert_eq!(records[0].categories, vec!["Автор:Яна", "Культура"]);
        assert_eq!(records[1].categories, vec!["Автор:Кто", "Тип:\"Газета\""]);
        assert_eq!((records[1].line_start, records[1].line_end), (3, 3));
    }

    #[test]
    fn test_categories_outside_documents_ignored() {
        let records = scan_str("<tag>Лишняя</tag>\n<text id=\"1\" name=\"a\">\n</text>\n<tag>Лишняя</tag>\n");
        assert_eq!(records.len(), 1);
        assert!(records[0].categories.is_empty());
    }

    #[test]
    fn test_dangling_close_ignored() {
        let records = scan_str("</text>\n<text id=\"1\" name=\"a\">\n</text>\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line_start, 1);
        assert_eq!(records[0].byte_start, 8);
    }

    #[test]
    fn test_crlf_offsets() {
        let input = "<a>\r\n<text id=\"1\" name=\"a\">\r\n</text>\r\n<text id=\"2\" name=\"b\">\n</text>\n";
        let records = scan_str(input);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].byte_start, 5);
        assert_eq!(&input[records[1].byte_start as usize..records[1].byte_end as usize],
            "<text id=\"2\" name=\"b\">\n</text>\n");
    }

    #[test]
    fn test_missing_final_newline() {
        let input = "<text id=\"1\" name=\"a\">\n</text>";
        let records = scan_str(input);
        assert_eq!(records[0].byte_end as usize, input.len());
    }

    #[test]
    fn test_decode_error_names_line() {
        let mut bytes = b"<text id=\"1\" name=\"a\">\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let mut scan = scan_reader(Cursor::new(bytes), "bad.xml", patterns());
        match scan.next() {
            Some(Err(CorpusError::Decode { line })) => assert_eq!(line, 1),
            other => panic!("Expected decode error, got {:?}", other.map(|r| r.map(|(_, rec)| rec))),
        }
        assert!(scan.next().is_none());
    }

    #[test]
    fn test_positional_groups() {
        let patterns = ScanPatterns::new(r#"<doc key="(\d+)" label="([^"]*)""#, "</doc>").unwrap();
        let input = "<doc key=\"42\" label=\"x\">\n</doc>\n";
        let (matched, record) = scan_reader(Cursor::new(input.as_bytes().to_vec()), "t", patterns)
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(record.document_id, "42");
        assert_eq!(record.title, "x");
        assert_eq!(matched.groups, vec![Some("42".to_string()), Some("x".to_string())]);
    }

    #[test]
    fn test_invalid_pattern() {
        match ScanPatterns::new("(unclosed", "</text>") {
            Err(CorpusError::Pattern { pattern, .. }) => assert_eq!(pattern, "(unclosed"),
            other => panic!("Expected pattern error, got {:?}", other.map(|_| ())),
        }
    }
}
