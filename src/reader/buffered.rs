//! Buffered Chunk Reader
//!
//! Reads from any source implementing `Read` in fixed-size chunks,
//! feeding the streaming tag parser without loading the whole file.

use std::io::{self, Read};

/// Default chunk size for streaming reads
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Buffered reader for chunked streaming input
pub struct BufferedReader<R: Read> {
    reader: R,
    buffer: Vec<u8>,
    pos: usize,
    end: usize,
    eof: bool,
}

impl<R: Read> BufferedReader<R> {
    /// Create a new buffered reader
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new buffered reader with specified buffer capacity
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        BufferedReader {
            reader,
            buffer: vec![0u8; capacity.max(1)],
            pos: 0,
            end: 0,
            eof: false,
        }
    }

    /// Fill the buffer from the reader
    ///
    /// Returns false once the underlying reader is exhausted.
    pub fn fill_buffer(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }

        // Compact: move remaining data to start
        if self.pos > 0 {
            let remaining = self.end - self.pos;
            if remaining > 0 {
                self.buffer.copy_within(self.pos..self.end, 0);
            }
            self.end = remaining;
            self.pos = 0;
        }

        if self.end == self.buffer.len() {
            // Caller did not consume anything; grow rather than stall
            let len = self.buffer.len();
            self.buffer.resize(len * 2, 0);
        }

        let read = loop {
            match self.reader.read(&mut self.buffer[self.end..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };

        if read == 0 {
            self.eof = true;
            Ok(false)
        } else {
            self.end += read;
            Ok(true)
        }
    }

    /// Get current buffered data as a slice
    pub fn buffered(&self) -> &[u8] {
        &self.buffer[self.pos..self.end]
    }

    /// Check if we've reached end of input
    pub fn is_eof(&self) -> bool {
        self.eof && self.pos >= self.end
    }

    /// Consume n bytes from the buffer
    pub fn consume(&mut self, n: usize) {
        self.pos += n.min(self.end - self.pos);
    }

    /// Current buffer allocation in bytes
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_buffered_reader() {
        let data = b"<root>content</root>";
        let mut reader = BufferedReader::new(Cursor::new(data.to_vec()));

        assert!(reader.fill_buffer().unwrap());
        assert_eq!(reader.buffered(), data);
    }

    #[test]
    fn test_small_chunks() {
        let mut reader = BufferedReader::with_capacity(Cursor::new(b"abcdef".to_vec()), 4);
        assert!(reader.fill_buffer().unwrap());
        assert_eq!(reader.buffered(), b"abcd");
        reader.consume(4);
        assert!(reader.fill_buffer().unwrap());
        assert_eq!(reader.buffered(), b"ef");
        reader.consume(2);
        assert!(!reader.fill_buffer().unwrap());
        assert!(reader.is_eof());
    }

    #[test]
    fn test_grows_when_unconsumed() {
        let mut reader = BufferedReader::with_capacity(Cursor::new(b"abcdef".to_vec()), 2);
        reader.fill_buffer().unwrap();
        reader.fill_buffer().unwrap();
        assert_eq!(reader.buffered(), b"abcd");
        assert_eq!(reader.capacity(), 4);
    }
}
