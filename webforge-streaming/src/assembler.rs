//! Delta assembly.
//!
//! This module interprets the logical lines of a generation stream and
//! accumulates the text deltas they carry into the final assembled result.
//!
//! Each data line wraps a JSON payload of the shape
//! `{"choices":[{"delta":{"content":"..."}}]}`; only
//! `choices[0].delta.content` is meaningful. The literal payload `[DONE]`
//! marks intentional end of stream.

use crate::error::StreamError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

/// Sentinel payload signaling successful end of stream.
pub const DONE_SENTINEL: &str = "[DONE]";

const DATA_PREFIX: &str = "data: ";

/// How a decode reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishStatus {
    /// The `[DONE]` sentinel was observed.
    Sentinel,
    /// The transport closed cleanly without an explicit sentinel.
    ///
    /// Treated as successful completion (some producers omit the
    /// sentinel), but kept distinct so strict callers can reject it.
    CleanClose,
    /// The transport ended abnormally before any terminal signal.
    Interrupted,
}

impl FinishStatus {
    /// Whether this status counts as successful completion.
    #[must_use]
    pub fn is_done(&self) -> bool {
        !matches!(self, Self::Interrupted)
    }
}

/// Terminal outcome of decoding one generation stream.
///
/// Carries the assembled text in every case: on interruption the partial
/// text decoded so far is still returned, so in-progress generations are
/// never silently lost.
#[derive(Debug)]
pub struct AssembledResult {
    text: String,
    status: FinishStatus,
    error: Option<StreamError>,
}

impl AssembledResult {
    /// The assembled text (partial if the stream was interrupted).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the result, returning the assembled text.
    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    /// How the stream terminated.
    #[must_use]
    pub fn status(&self) -> FinishStatus {
        self.status
    }

    /// The error that ended the stream, if it did not complete.
    #[must_use]
    pub fn error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    /// Whether decoding completed successfully.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }
}

/// Accumulates content deltas from classified stream lines.
///
/// Feed lines via [`push_line`](Self::push_line); the return value is the
/// newly accepted delta, letting a UI render progressively without
/// re-scanning the whole buffer. Once terminal, convert with
/// [`finalize`](Self::finalize) — taking `self` by value makes feeding
/// after finalization unrepresentable.
#[derive(Debug, Default)]
pub struct DeltaAssembler {
    text: String,
    done: bool,
}

impl DeltaAssembler {
    /// Create a new assembler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one logical line, returning the content delta it carried.
    ///
    /// Classification, in order of precedence: blank lines (event
    /// separators), `:`-prefixed comments, and lines without the `data: `
    /// prefix are ignored; the `[DONE]` sentinel latches the assembler as
    /// done and every later line is ignored; payloads that fail to parse
    /// as JSON are dropped without failing the stream; parsed payloads
    /// contribute `choices[0].delta.content` when it is a non-empty
    /// string, with any missing or mistyped level meaning "no delta".
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        if self.done {
            return None;
        }

        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        let payload = line.strip_prefix(DATA_PREFIX)?.trim();
        if payload == DONE_SENTINEL {
            self.done = true;
            return None;
        }

        let value: Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "dropping malformed data frame");
                return None;
            }
        };

        let content = value
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("delta"))
            .and_then(|delta| delta.get("content"))
            .and_then(Value::as_str);

        match content {
            Some(delta) if !delta.is_empty() => {
                self.text.push_str(delta);
                trace!(delta_len = delta.len(), total = self.text.len(), "appended delta");
                Some(delta.to_string())
            }
            _ => None,
        }
    }

    /// Whether the `[DONE]` sentinel has been observed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The text accumulated so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Convert into the terminal result once the transport has ended.
    ///
    /// `clean` reports whether the transport closed normally. A sentinel
    /// seen earlier always wins; otherwise a clean close completes the
    /// result and an unclean one marks it interrupted, keeping the partial
    /// text either way.
    #[must_use]
    pub fn finalize(self, clean: bool) -> AssembledResult {
        if self.done {
            AssembledResult {
                text: self.text,
                status: FinishStatus::Sentinel,
                error: None,
            }
        } else if clean {
            AssembledResult {
                text: self.text,
                status: FinishStatus::CleanClose,
                error: None,
            }
        } else {
            AssembledResult {
                text: self.text,
                status: FinishStatus::Interrupted,
                error: Some(StreamError::Interrupted),
            }
        }
    }

    /// Convert into an interrupted result carrying the transport's error.
    #[must_use]
    pub fn finalize_with_error(self, error: StreamError) -> AssembledResult {
        if self.done {
            // Sentinel already seen: the stream completed before the
            // transport died, so the error is moot.
            return self.finalize(true);
        }
        AssembledResult {
            text: self.text,
            status: FinishStatus::Interrupted,
            error: Some(error),
        }
    }
}
