//! The pull-based stream decoder.
//!
//! [`StreamDecoder`] is the synchronous core: the owner reads chunks from
//! the transport, feeds them in, and finishes with either
//! [`finish`](StreamDecoder::finish) (clean close) or
//! [`abort`](StreamDecoder::abort) (abnormal close). One decoder serves
//! exactly one in-flight generation request; construct a fresh one per
//! request and drop it after finishing.

use crate::assembler::{AssembledResult, DeltaAssembler};
use crate::error::{StreamError, StreamResult};
use crate::splitter::LineSplitter;
use tracing::{debug, warn};

/// Incremental decoder for a streamed generation response.
///
/// Combines a [`LineSplitter`] and a [`DeltaAssembler`]; the only
/// buffering beyond the assembled text is the current partial line.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    splitter: LineSplitter,
    assembler: DeltaAssembler,
}

impl StreamDecoder {
    /// Create a decoder for one generation stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the cap on a single unterminated line.
    #[must_use]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.splitter = LineSplitter::new().with_max_line_bytes(max_line_bytes);
        self
    }

    /// Feed a chunk of transport bytes.
    ///
    /// Returns the content deltas accepted from this chunk, in arrival
    /// order, for progressive rendering. After the `[DONE]` sentinel has
    /// been seen, further chunks are ignored.
    pub fn feed(&mut self, chunk: &[u8]) -> StreamResult<Vec<String>> {
        if self.assembler.is_done() {
            return Ok(Vec::new());
        }

        let lines = self.splitter.feed(chunk)?;
        let mut deltas = Vec::new();
        for line in lines {
            if let Some(delta) = self.assembler.push_line(&line) {
                deltas.push(delta);
            }
            if self.assembler.is_done() {
                break;
            }
        }
        Ok(deltas)
    }

    /// Whether the `[DONE]` sentinel has been observed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.assembler.is_done()
    }

    /// The text assembled so far.
    #[must_use]
    pub fn text(&self) -> &str {
        self.assembler.text()
    }

    /// Finish after a clean transport close.
    ///
    /// Any unterminated trailing line is discarded rather than parsed: a
    /// cut-off line can never be a valid sentinel or complete JSON, and
    /// attempting it risks corrupting the result.
    #[must_use]
    pub fn finish(mut self) -> AssembledResult {
        if let Some(tail) = self.splitter.finish() {
            debug!(bytes = tail.len(), "discarding unterminated trailing line");
        }
        self.assembler.finalize(true)
    }

    /// Finish after an abnormal transport close.
    ///
    /// The result carries the partial text assembled so far along with
    /// `error`, so callers can surface a best-effort result.
    #[must_use]
    pub fn abort(mut self, error: StreamError) -> AssembledResult {
        self.splitter.clear();
        warn!(error = %error, decoded = self.assembler.text().len(), "stream interrupted");
        self.assembler.finalize_with_error(error)
    }
}
