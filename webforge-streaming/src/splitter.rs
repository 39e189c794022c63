//! Line splitting for chunked transports.
//!
//! The generation endpoint delivers its body as byte chunks whose
//! boundaries fall anywhere, including mid-line and mid-character. This
//! module turns that chunk sequence into complete logical lines, buffering
//! the trailing partial line between feeds.

use crate::error::{StreamError, StreamResult};

/// Default cap on a single buffered line.
pub const DEFAULT_MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Splits an incoming byte stream into `\n`-terminated lines.
///
/// The internal buffer is raw bytes rather than text: a chunk boundary may
/// fall inside a multi-byte UTF-8 character, so conversion to text only
/// happens once a full line is available. One trailing `\r` is stripped
/// from each completed line.
#[derive(Debug)]
pub struct LineSplitter {
    buffer: Vec<u8>,
    max_line_bytes: usize,
}

impl Default for LineSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSplitter {
    /// Create a new splitter with the default line cap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Override the cap on a single unterminated line.
    #[must_use]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Feed a chunk of bytes, returning every line it completes.
    ///
    /// Lines are emitted exactly once, in byte order, and only once fully
    /// terminated. Whatever follows the last `\n` stays buffered for the
    /// next call.
    pub fn feed(&mut self, chunk: &[u8]) -> StreamResult<Vec<String>> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let newline = start + offset;
            let mut end = newline;
            if end > start && self.buffer[end - 1] == b'\r' {
                end -= 1;
            }
            lines.push(String::from_utf8_lossy(&self.buffer[start..end]).into_owned());
            start = newline + 1;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        if self.buffer.len() > self.max_line_bytes {
            self.buffer.clear();
            return Err(StreamError::BufferOverflow(self.max_line_bytes));
        }

        Ok(lines)
    }

    /// Call when the transport ends to take any unterminated trailing line.
    ///
    /// The bytes are returned as-is (no `\r` stripping: the line never
    /// completed). Callers decide whether to parse or discard the tail; the
    /// decoder discards it, since a cut-off frame cannot be trusted.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let tail = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        Some(tail)
    }

    /// Number of bytes currently buffered without a terminator.
    #[must_use]
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_complete_line() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.feed(b"hello\n").unwrap();
        assert_eq!(lines, vec!["hello"]);
        assert_eq!(splitter.pending_bytes(), 0);
    }

    #[test]
    fn test_multiple_lines_one_chunk() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.feed(b"one\ntwo\nthree\n").unwrap();
        assert_eq!(lines, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_partial_line_buffered() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.feed(b"hel").unwrap().is_empty());
        assert_eq!(splitter.pending_bytes(), 3);

        let lines = splitter.feed(b"lo\nwor").unwrap();
        assert_eq!(lines, vec!["hello"]);
        assert_eq!(splitter.pending_bytes(), 3);

        let lines = splitter.feed(b"ld\n").unwrap();
        assert_eq!(lines, vec!["world"]);
    }

    #[test]
    fn test_crlf_stripped_once() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.feed(b"a\r\nb\r\r\n").unwrap();
        assert_eq!(lines, vec!["a", "b\r"]);
    }

    #[test]
    fn test_crlf_split_between_chunks() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.feed(b"data\r").unwrap().is_empty());
        let lines = splitter.feed(b"\n").unwrap();
        assert_eq!(lines, vec!["data"]);
    }

    #[test]
    fn test_empty_lines_emitted() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.feed(b"\n\na\n").unwrap();
        assert_eq!(lines, vec!["", "", "a"]);
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let text = "héllo\n";
        let bytes = text.as_bytes();
        // Cut inside the two-byte 'é'
        let mut splitter = LineSplitter::new();
        assert!(splitter.feed(&bytes[..2]).unwrap().is_empty());
        let lines = splitter.feed(&bytes[2..]).unwrap();
        assert_eq!(lines, vec!["héllo"]);
    }

    #[test]
    fn test_finish_returns_dangling_tail() {
        let mut splitter = LineSplitter::new();
        splitter.feed(b"done\nleft over").unwrap();
        assert_eq!(splitter.finish(), Some("left over".to_string()));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_finish_empty() {
        let mut splitter = LineSplitter::new();
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_overflow_without_newline() {
        let mut splitter = LineSplitter::new().with_max_line_bytes(8);
        assert!(splitter.feed(b"12345678").is_ok());
        let err = splitter.feed(b"9").unwrap_err();
        assert!(matches!(err, StreamError::BufferOverflow(8)));
    }

    #[test]
    fn test_overflow_not_triggered_by_terminated_lines() {
        let mut splitter = LineSplitter::new().with_max_line_bytes(4);
        let lines = splitter.feed(b"aaaa\nbbbb\n").unwrap();
        assert_eq!(lines, vec!["aaaa", "bbbb"]);
    }
}
