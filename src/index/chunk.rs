//! Chunk loader
//!
//! Extracts the raw text of one document given its boundary record:
//! - fast path: seek to `byte_start` and read `byte_end - byte_start` bytes
//! - slow path: re-read lines `line_start..=line_end` and concatenate them
//!
//! Lines keep their original terminators, so both paths return identical
//! text for bounds produced by the boundary scanner.

use super::snapshot::BoundaryRecord;
use crate::error::{CorpusError, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::warn;

/// Upper bound on buffer preallocation from a record's byte range
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Which extraction path to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPath {
    /// Byte-offset seek
    #[default]
    Fast,
    /// Line accumulation
    Slow,
}

/// Load a document's raw text by byte offsets, falling back to lines if the range is unusable
pub fn load_fast(path: &Path, record: &BoundaryRecord) -> Result<String> {
    let mut file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    match read_range(&mut file, record).map_err(|e| CorpusError::io(path, e))? {
        Some(text) => Ok(text),
        None => {
            warn!(
                document_id = %record.document_id,
                byte_start = record.byte_start,
                byte_end = record.byte_end,
                "byte range unusable, falling back to line accumulation"
            );
            load_slow(path, record)
        }
    }
}

/// Load a document's raw text by accumulating its lines
pub fn load_slow(path: &Path, record: &BoundaryRecord) -> Result<String> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    read_lines(BufReader::new(file), record).map_err(|err| match err {
        LineError::Io(e) => CorpusError::io(path, e),
        LineError::Decode(line) => CorpusError::Decode { line },
    })
}

/// Read exactly the record's byte range
///
/// Returns None when the file is shorter than the range or the bytes are not UTF-8.
pub fn read_range<R: Read + Seek>(reader: &mut R, record: &BoundaryRecord) -> io::Result<Option<String>> {
    reader.seek(SeekFrom::Start(record.byte_start))?;

    let mut bytes = Vec::with_capacity(record.byte_len().min(MAX_PREALLOC) as usize);
    reader.by_ref().take(record.byte_len()).read_to_end(&mut bytes)?;
    if bytes.len() as u64 != record.byte_len() {
        return Ok(None);
    }

    Ok(String::from_utf8(bytes).ok())
}

/// Failure while accumulating lines
#[derive(Debug)]
pub enum LineError {
    Io(io::Error),
    /// 0-based index of the line that is not UTF-8
    Decode(usize),
}

/// Concatenate lines `line_start..=line_end` of a line source
pub fn read_lines<R: BufRead>(mut reader: R, record: &BoundaryRecord) -> std::result::Result<String, LineError> {
    let mut text = String::with_capacity(record.byte_len().min(MAX_PREALLOC) as usize);
    let mut buf = Vec::with_capacity(256);

    for index in 0..=record.line_end {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).map_err(LineError::Io)? == 0 {
            break;
        }
        if index < record.line_start {
            continue;
        }
        let line = std::str::from_utf8(&buf).map_err(|_| LineError::Decode(index))?;
        text.push_str(line);
    }

    Ok(text)
}
