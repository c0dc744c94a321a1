//! Byte stream → [`TurnStream`] adapter.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::provider::{LlmError, TurnStream};
use crate::types::TurnResponseStreamChunk;

use super::sse::{decode_payload, SseDecoder};

type Item = Result<TurnResponseStreamChunk, LlmError>;

struct State<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Item>,
    finished: bool,
}

/// Turn a raw SSE response body into decoded turn chunks.
///
/// A transport error is yielded once and ends the stream.
pub(super) fn turn_stream<S, E>(bytes: S) -> TurnStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = State {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    let chunks = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for payload in state.decoder.feed(&chunk) {
                        state.pending.extend(decode_payload(&payload));
                    }
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .pending
                        .push_back(Err(LlmError::StreamError(e.to_string())));
                }
                None => {
                    state.finished = true;
                    if let Some(payload) = state.decoder.finish() {
                        state.pending.extend(decode_payload(&payload));
                    }
                }
            }
        }
    });

    Box::pin(chunks)
}
