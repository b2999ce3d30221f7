//! Server-Sent-Events framing.
//!
//! SSE streams are newline-delimited and TCP chunk boundaries do not line
//! up with event boundaries, so [`SseDecoder`] buffers raw bytes and only
//! decodes complete lines. Multi-byte UTF-8 sequences split across chunks
//! are therefore decoded correctly.

use std::fmt;
use std::mem;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};

use stockpulse_core::error::AppError;
use stockpulse_core::result::AppResult;

/// Event type assigned when the server omits the `event:` field.
pub const DEFAULT_EVENT: &str = "message";

/// Longest line accepted before the stream is treated as broken.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// A dispatched SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    /// Event type (`event:` field, or `"message"`).
    pub event: String,
    /// Payload, with multiple `data:` lines joined by `\n`.
    pub data: String,
    /// Last event ID seen on the stream, if any.
    pub id: Option<String>,
}

impl SseMessage {
    /// Build a message with the given event type and payload.
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id: None,
        }
    }
}

/// Incremental SSE decoder.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes not yet terminated by a newline.
    pending: Vec<u8>,
    /// `event:` of the event being assembled.
    event: Option<String>,
    /// `data:` lines of the event being assembled.
    data: Vec<String>,
    /// Last `id:` value; persists across events.
    last_id: Option<String>,
}

impl SseDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes and return every event completed by it.
    ///
    /// Fails once an unterminated line exceeds [`MAX_LINE_BYTES`].
    pub fn feed(&mut self, chunk: &[u8]) -> AppResult<Vec<SseMessage>> {
        self.pending.extend_from_slice(chunk);

        let mut messages = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(message) = self.process_line(&line) {
                messages.push(message);
            }
        }

        if self.pending.len() > MAX_LINE_BYTES {
            let len = self.pending.len();
            self.pending.clear();
            return Err(AppError::transport(format!(
                "SSE line exceeds {MAX_LINE_BYTES} bytes ({len} buffered without a newline)"
            )));
        }
        Ok(messages)
    }

    /// Process any unterminated trailing line and dispatch the pending event.
    ///
    /// Called once the byte stream ends.
    pub fn flush(&mut self) -> Option<SseMessage> {
        let rest = mem::take(&mut self.pending);
        if !rest.is_empty() {
            let line = String::from_utf8_lossy(&rest);
            let line = line.trim_end_matches('\r').to_string();
            if let Some(message) = self.process_line(&line) {
                return Some(message);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseMessage> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            // `retry:` is a browser reconnect hint; the client runs its own backoff.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseMessage> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = mem::take(&mut self.data).join("\n");
        Some(SseMessage {
            event: event
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
            id: self.last_id.clone(),
        })
    }
}

/// Decode a raw byte stream into SSE messages.
///
/// A read error is yielded once as a transport error and ends the stream.
pub fn decode_stream<S, E>(byte_stream: S) -> BoxStream<'static, AppResult<SseMessage>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = (byte_stream.boxed(), SseDecoder::new(), false);

    stream::unfold(state, |(mut bytes, mut decoder, ended)| async move {
        if ended {
            return None;
        }
        match bytes.next().await {
            Some(Ok(chunk)) => match decoder.feed(&chunk) {
                Ok(messages) => {
                    let batch: Vec<AppResult<SseMessage>> =
                        messages.into_iter().map(Ok).collect();
                    Some((batch, (bytes, decoder, false)))
                }
                Err(e) => Some((vec![Err(e)], (bytes, decoder, true))),
            },
            Some(Err(e)) => {
                let err = AppError::transport(format!("Stream read error: {e}"));
                Some((vec![Err(err)], (bytes, decoder, true)))
            }
            None => {
                let batch = decoder.flush().into_iter().map(Ok).collect();
                Some((batch, (bytes, decoder, true)))
            }
        }
    })
    .flat_map(stream::iter)
    .boxed()
}

#[cfg(test)]
mod tests {
    use stockpulse_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_named_event() {
        let mut decoder = SseDecoder::new();
        let messages = decoder.feed(b"event: notification\ndata: {\"a\":1}\n\n").unwrap();
        assert_eq!(messages, vec![SseMessage::new("notification", "{\"a\":1}")]);
    }

    #[test]
    fn test_default_event_type() {
        let mut decoder = SseDecoder::new();
        let messages = decoder.feed(b"data: hello\n\n").unwrap();
        assert_eq!(messages[0].event, DEFAULT_EVENT);
    }

    #[test]
    fn test_partial_lines_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: notif").unwrap().is_empty());
        assert!(decoder.feed(b"ication\ndata: {\"x\"").unwrap().is_empty());
        let messages = decoder.feed(b":2}\r\n\r\n").unwrap();
        assert_eq!(messages, vec![SseMessage::new("notification", "{\"x\":2}")]);
    }

    #[test]
    fn test_split_utf8_sequence() {
        let text = "data: café\n\n".as_bytes();
        let split = text.iter().position(|b| *b == 0xc3).unwrap() + 1;
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&text[..split]).unwrap().is_empty());
        let messages = decoder.feed(&text[split..]).unwrap();
        assert_eq!(messages[0].data, "café");
    }

    #[test]
    fn test_multiline_data_and_comments() {
        let mut decoder = SseDecoder::new();
        let messages = decoder.feed(b": keepalive\ndata: one\ndata: two\nretry: 5000\n\n").unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data, "one\ntwo");
    }

    #[test]
    fn test_id_persists_across_events() {
        let mut decoder = SseDecoder::new();
        let messages = decoder.feed(b"id: 7\ndata: a\n\ndata: b\n\n").unwrap();
        assert_eq!(messages[0].id.as_deref(), Some("7"));
        assert_eq!(messages[1].id.as_deref(), Some("7"));
    }

    #[test]
    fn test_event_without_data_is_not_dispatched() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: ping\n\n").unwrap().is_empty());
        let messages = decoder.feed(b"data: x\n\n").unwrap();
        assert_eq!(messages[0].event, DEFAULT_EVENT);
    }

    #[test]
    fn test_flush_dispatches_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: notification\ndata: tail").unwrap().is_empty());
        let message = decoder.flush().unwrap();
        assert_eq!(message, SseMessage::new("notification", "tail"));
        assert!(decoder.flush().is_none());
    }

    #[tokio::test]
    async fn test_decode_stream_surfaces_read_error() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"data: first\n\n")),
            Err("connection reset".to_string()),
            Ok(Bytes::from_static(b"data: never\n\n")),
        ];
        let items: Vec<_> = decode_stream(stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().data, "first");
        assert_eq!(items[1].as_ref().unwrap_err().kind, ErrorKind::Transport);
    }

    #[test]
    fn test_oversized_line_is_rejected() {
        let mut decoder = SseDecoder::new();
        let chunk = vec![b'x'; MAX_LINE_BYTES / 2 + 1];
        assert!(decoder.feed(&chunk).unwrap().is_empty());
        let err = decoder.feed(&chunk).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);

        let messages = decoder.feed(b"\ndata: recovered\n\n").unwrap();
        assert_eq!(messages[0].data, "recovered");
    }

    #[tokio::test]
    async fn test_decode_stream_ends_after_oversized_line() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from(vec![b'x'; MAX_LINE_BYTES + 1])),
            Ok(Bytes::from_static(b"data: never\n\n")),
        ];
        let items: Vec<_> = decode_stream(stream::iter(chunks)).collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }
}
