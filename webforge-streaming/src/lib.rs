//! # webforge-streaming
//!
//! Incremental decoder for webforge's streaming site-generation endpoint.
//!
//! The endpoint answers with a chunked body of SSE-style frames, each
//! wrapping a JSON delta of generated text. This crate reconstructs the
//! full text in order, tolerating chunk boundaries that fall mid-line or
//! mid-character, recognizing the `[DONE]` sentinel, and degrading to a
//! partial result when the connection dies early.
//!
//! ## Core Concepts
//!
//! - **[`LineSplitter`]**: turn raw byte chunks into complete logical lines
//! - **[`DeltaAssembler`]**: classify lines and accumulate content deltas
//! - **[`StreamDecoder`]**: the two combined behind one pull API
//! - **[`DeltaStream`] / [`assemble`]**: async adapters over any
//!   `futures::Stream` of byte chunks
//! - **[`AssembledResult`]**: terminal outcome — assembled text plus how
//!   the stream finished
//!
//! ## Example - Synchronous feeding
//!
//! ```
//! use webforge_streaming::StreamDecoder;
//!
//! let mut decoder = StreamDecoder::new();
//! decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n")?;
//! decoder.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n")?;
//! decoder.feed(b"data: [DONE]\n\n")?;
//!
//! let result = decoder.finish();
//! assert_eq!(result.text(), "Hello");
//! assert!(result.is_done());
//! # Ok::<(), webforge_streaming::StreamError>(())
//! ```
//!
//! ## Example - Progressive rendering
//!
//! ```ignore
//! use webforge_streaming::DeltaStream;
//! use futures::StreamExt;
//!
//! let mut deltas = DeltaStream::new(response.bytes_stream());
//! while let Some(delta) = deltas.next().await {
//!     render_fragment(&delta?);
//! }
//! let result = deltas.take_result();
//! ```
//!
//! One decoder serves one in-flight request; never share an instance
//! across requests.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod assembler;
pub mod decoder;
pub mod error;
pub mod splitter;
pub mod stream;

// Re-exports
pub use assembler::{AssembledResult, DeltaAssembler, FinishStatus, DONE_SENTINEL};
pub use decoder::StreamDecoder;
pub use error::{StreamError, StreamResult};
pub use splitter::{LineSplitter, DEFAULT_MAX_LINE_BYTES};
pub use stream::{assemble, DeltaStream};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        assemble, AssembledResult, DeltaAssembler, DeltaStream, FinishStatus, LineSplitter,
        StreamDecoder, StreamError, StreamResult,
    };
}
