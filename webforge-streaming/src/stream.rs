//! Async adapters over chunked byte transports.
//!
//! Two ways to drive a [`StreamDecoder`] from a `futures::Stream` of byte
//! chunks, e.g. `reqwest::Response::bytes_stream()`:
//!
//! - [`DeltaStream`] yields every accepted content delta in order, for
//!   progressive rendering; the terminal [`AssembledResult`] is available
//!   from [`take_result`](DeltaStream::take_result) once the stream is
//!   exhausted.
//! - [`assemble`] drives the whole stream and returns only the terminal
//!   result.
//!
//! An `Err` item from the transport counts as an abnormal close; the
//! stream ending counts as a clean one.

use crate::assembler::AssembledResult;
use crate::decoder::StreamDecoder;
use crate::error::{StreamError, StreamResult};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

// StreamError owns an io::Error and so cannot be Clone; when the decode
// fails we need one copy for the yielded item and one for the stored
// result.
fn clone_cause(err: &StreamError) -> StreamError {
    match err {
        StreamError::Interrupted => StreamError::Interrupted,
        StreamError::BufferOverflow(max) => StreamError::BufferOverflow(*max),
        StreamError::Io(io) => StreamError::Transport(io.to_string()),
        StreamError::Transport(message) => StreamError::Transport(message.clone()),
    }
}

pin_project! {
    /// Stream adapter yielding accepted content deltas from a byte stream.
    ///
    /// Once the `[DONE]` sentinel has been decoded the underlying
    /// transport is not polled again.
    pub struct DeltaStream<S, E> {
        #[pin]
        inner: S,
        decoder: Option<StreamDecoder>,
        pending: VecDeque<String>,
        result: Option<AssembledResult>,
        _error: std::marker::PhantomData<E>,
    }
}

impl<S, E> DeltaStream<S, E>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    /// Create a delta stream over a byte-chunk transport.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            decoder: Some(StreamDecoder::new()),
            pending: VecDeque::new(),
            result: None,
            _error: std::marker::PhantomData,
        }
    }

    /// Take the terminal result, available once the stream has ended.
    pub fn take_result(&mut self) -> Option<AssembledResult> {
        self.result.take()
    }

    /// The text assembled so far, while the stream is still open.
    pub fn text(&self) -> Option<&str> {
        self.decoder.as_ref().map(StreamDecoder::text)
    }
}

impl<S, E> Stream for DeltaStream<S, E>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    type Item = StreamResult<String>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(delta) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(delta)));
            }

            if this.decoder.is_none() {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    let fed = match this.decoder.as_mut() {
                        Some(decoder) => decoder.feed(&chunk),
                        None => return Poll::Ready(None),
                    };
                    match fed {
                        Ok(deltas) => {
                            this.pending.extend(deltas);
                            let done = this.decoder.as_ref().is_some_and(StreamDecoder::is_done);
                            if done {
                                if let Some(decoder) = this.decoder.take() {
                                    *this.result = Some(decoder.finish());
                                }
                            }
                        }
                        Err(err) => {
                            let cause = clone_cause(&err);
                            if let Some(decoder) = this.decoder.take() {
                                *this.result = Some(decoder.abort(err));
                            }
                            return Poll::Ready(Some(Err(cause)));
                        }
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    let err = StreamError::transport(err);
                    let cause = clone_cause(&err);
                    if let Some(decoder) = this.decoder.take() {
                        *this.result = Some(decoder.abort(err));
                    }
                    return Poll::Ready(Some(Err(cause)));
                }
                Poll::Ready(None) => {
                    if let Some(decoder) = this.decoder.take() {
                        *this.result = Some(decoder.finish());
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Decode an entire byte-chunk stream into its terminal result.
///
/// Stops reading as soon as the `[DONE]` sentinel is decoded. A transport
/// `Err` item or a decode failure yields an interrupted result that still
/// carries the partial text.
pub async fn assemble<S, E>(stream: S) -> AssembledResult
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    futures::pin_mut!(stream);

    let mut decoder = StreamDecoder::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => match decoder.feed(&chunk) {
                Ok(_) => {
                    if decoder.is_done() {
                        return decoder.finish();
                    }
                }
                Err(err) => return decoder.abort(err),
            },
            Err(err) => return decoder.abort(StreamError::transport(err)),
        }
    }
    decoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::FinishStatus;
    use futures::stream;

    fn chunk(s: &str) -> Result<Bytes, std::io::Error> {
        Ok(Bytes::copy_from_slice(s.as_bytes()))
    }

    fn frame(content: &str) -> String {
        format!("data: {{\"choices\":[{{\"delta\":{{\"content\":\"{content}\"}}}}]}}\n\n")
    }

    #[tokio::test]
    async fn test_delta_stream_yields_in_order() {
        let body = stream::iter(vec![
            chunk(&frame("Hel")),
            chunk(&frame("lo")),
            chunk("data: [DONE]\n\n"),
        ]);

        let mut deltas = DeltaStream::new(body);
        let mut seen = Vec::new();
        while let Some(item) = deltas.next().await {
            seen.push(item.unwrap());
        }
        assert_eq!(seen, vec!["Hel".to_string(), "lo".to_string()]);

        let result = deltas.take_result().unwrap();
        assert_eq!(result.text(), "Hello");
        assert_eq!(result.status(), FinishStatus::Sentinel);
    }

    #[tokio::test]
    async fn test_delta_stream_stops_at_sentinel() {
        let body = stream::iter(vec![
            chunk(&frame("only")),
            chunk("data: [DONE]\n\n"),
            chunk(&frame("never read")),
        ]);

        let mut deltas = DeltaStream::new(body);
        let mut seen = Vec::new();
        while let Some(item) = deltas.next().await {
            seen.push(item.unwrap());
        }
        assert_eq!(seen, vec!["only".to_string()]);
        assert_eq!(deltas.take_result().unwrap().text(), "only");
    }

    #[tokio::test]
    async fn test_delta_stream_transport_error() {
        let body = stream::iter(vec![
            chunk(&frame("partial")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            )),
        ]);

        let mut deltas = DeltaStream::new(body);
        assert_eq!(deltas.next().await.unwrap().unwrap(), "partial");
        assert!(deltas.next().await.unwrap().is_err());
        assert!(deltas.next().await.is_none());

        let result = deltas.take_result().unwrap();
        assert_eq!(result.status(), FinishStatus::Interrupted);
        assert_eq!(result.text(), "partial");
    }

    #[tokio::test]
    async fn test_assemble_happy_path() {
        let body = stream::iter(vec![
            chunk(&frame("Hel")),
            chunk(&frame("lo")),
            chunk("data: [DONE]\n\n"),
        ]);
        let result = assemble(body).await;
        assert_eq!(result.into_text(), "Hello");
    }

    #[tokio::test]
    async fn test_assemble_clean_close_without_sentinel() {
        let body = stream::iter(vec![chunk(&frame("all of it"))]);
        let result = assemble(body).await;
        assert_eq!(result.status(), FinishStatus::CleanClose);
        assert_eq!(result.text(), "all of it");
    }

    #[tokio::test]
    async fn test_assemble_interrupted_keeps_partial() {
        let body = stream::iter(vec![
            chunk(&frame("best ")),
            chunk(&frame("effort")),
            Err(std::io::Error::other("wire cut")),
        ]);
        let result = assemble(body).await;
        assert_eq!(result.status(), FinishStatus::Interrupted);
        assert_eq!(result.text(), "best effort");
        assert!(matches!(result.error(), Some(StreamError::Transport(_))));
    }

    #[tokio::test]
    async fn test_assemble_empty_stream() {
        let body = stream::iter(Vec::<Result<Bytes, std::io::Error>>::new());
        let result = assemble(body).await;
        assert_eq!(result.text(), "");
        assert_eq!(result.status(), FinishStatus::CleanClose);
    }
}
