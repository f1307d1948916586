//! Incremental ingestion of the backend's chat event stream.
//!
//! The chat endpoint responds with server-sent-event framing: newline
//! separated lines, the interesting ones prefixed `data:`, each payload a
//! small JSON object. Chunks arrive with arbitrary boundaries, so the
//! ingestor buffers bytes until a full line is available and only then
//! decodes it. Notifications come out in arrival order, synchronously
//! within each `feed` call.

use std::collections::VecDeque;
use std::pin::Pin;

use futures_util::Stream;
use serde::Deserialize;

use crate::client::{ApiError, ApiResult};

/// One decoded frame from the event stream.
///
/// In normal operation exactly one field is meaningfully populated. The
/// backend also emits bookkeeping events (`userMessage`, `done`) whose
/// payloads carry none of these fields; those deserialize to an empty frame
/// and are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct StreamFrame {
    /// Server-assigned id of the assistant message being created.
    #[serde(default, rename = "messageId")]
    pub message_id: Option<String>,
    /// Incremental text delta.
    #[serde(default)]
    pub content: Option<String>,
    /// Error text surfaced mid-stream.
    #[serde(default)]
    pub error: Option<String>,
}

/// Notifications emitted while ingesting a chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamNotification {
    /// The assistant message was created server-side. Fires at most once
    /// per stream, on the first frame carrying a non-empty `messageId`.
    MessageStart { id: String },
    /// A delta arrived; `content` is the full cumulative text so far.
    ContentAppended { id: String, content: String },
    /// The backend reported an error. The stream may still continue.
    Error { message: String },
}

/// Reassembles an arbitrarily-chunked SSE text stream into notifications.
///
/// One instance per in-flight chat request; `feed` must not be called
/// concurrently. Cancellation is the caller's concern: stop feeding.
#[derive(Debug, Default)]
pub struct StreamIngestor {
    /// Unprocessed bytes, ending in at most one partial line. Keeping raw
    /// bytes here means a multi-byte UTF-8 sequence split across chunks is
    /// never decoded until its line is complete.
    buffer: Vec<u8>,
    message_id: Option<String>,
    accumulated: String,
}

impl StreamIngestor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the in-flight assistant message, once the stream has started.
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// Cumulative content appended so far.
    pub fn content(&self) -> &str {
        &self.accumulated
    }

    /// Feeds one text chunk and returns the notifications it completed.
    pub fn feed(&mut self, chunk: &str) -> Vec<StreamNotification> {
        self.feed_bytes(chunk.as_bytes())
    }

    /// Feeds one raw chunk and returns the notifications it completed.
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Vec<StreamNotification> {
        self.buffer.extend_from_slice(chunk);

        let mut out = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line[..newline]);
            self.process_line(&line, &mut out);
        }
        out
    }

    /// Ends the stream. A trailing line without a terminator is discarded,
    /// matching the one-line-break-minimum framing. Returns the final
    /// accumulated content, or `None` if no message ever started.
    pub fn close(self) -> Option<String> {
        if !self.buffer.is_empty() {
            tracing::debug!(
                bytes = self.buffer.len(),
                "discarding unterminated trailing line at end of stream"
            );
        }
        self.message_id.map(|_| self.accumulated)
    }

    fn process_line(&mut self, line: &str, out: &mut Vec<StreamNotification>) {
        let Some(payload) = line.strip_prefix("data:") else {
            return;
        };
        let payload = payload.trim();
        if payload.is_empty() {
            return;
        }

        match serde_json::from_str::<StreamFrame>(payload) {
            Ok(frame) => self.apply_frame(frame, out),
            Err(err) => {
                tracing::warn!(%err, payload, "dropping malformed stream frame");
            }
        }
    }

    /// Applies one frame. Field precedence mirrors the chat protocol: a
    /// first unseen message id starts the message, otherwise content
    /// appends, otherwise an error is surfaced. Empty strings count as
    /// absent.
    fn apply_frame(&mut self, frame: StreamFrame, out: &mut Vec<StreamNotification>) {
        let message_id = frame.message_id.filter(|s| !s.is_empty());
        let content = frame.content.filter(|s| !s.is_empty());
        let error = frame.error.filter(|s| !s.is_empty());

        if let Some(id) = message_id.filter(|_| self.message_id.is_none()) {
            self.message_id = Some(id.clone());
            out.push(StreamNotification::MessageStart { id });
        } else if let Some(delta) = content {
            let Some(id) = self.message_id.clone() else {
                tracing::debug!("dropping content delta before message start");
                return;
            };
            self.accumulated.push_str(&delta);
            out.push(StreamNotification::ContentAppended {
                id,
                content: self.accumulated.clone(),
            });
        } else if let Some(message) = error {
            out.push(StreamNotification::Error { message });
        }
    }
}

/// Adapts a byte stream (e.g. a reqwest response body) into a stream of
/// [`StreamNotification`]s by feeding an owned [`StreamIngestor`].
pub struct NotificationStream<S> {
    inner: S,
    ingestor: StreamIngestor,
    pending: VecDeque<StreamNotification>,
    done: bool,
}

impl<S> NotificationStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            ingestor: StreamIngestor::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Consumes the adapter and returns the final accumulated content.
    pub fn finish(self) -> Option<String> {
        self.ingestor.close()
    }
}

impl<S, E> Stream for NotificationStream<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = ApiResult<StreamNotification>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        let this = self.get_mut();
        loop {
            if let Some(notification) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(notification)));
            }
            if this.done {
                return Poll::Ready(None);
            }
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    this.pending.extend(this.ingestor.feed_bytes(&chunk));
                }
                Poll::Ready(Some(Err(e))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(ApiError::transport(format!(
                        "chat stream failed: {e}"
                    )))));
                }
                Poll::Ready(None) => {
                    this.done = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    /// Fixture mirroring a full backend response: bookkeeping events with
    /// no significant fields, a start event, content deltas, a done event.
    const CHAT_STREAM: &str = "data: {\"id\": \"temp_1\"}\n\
        data: {\"messageId\": \"msg-1\"}\n\
        data: {\"content\": \"Hello\"}\n\
        data: {\"content\": \" world\"}\n\
        data: {\"messageId\": \"msg-1\"}\n";

    fn collect(chunks: &[&str]) -> Vec<StreamNotification> {
        let mut ingestor = StreamIngestor::new();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(ingestor.feed(chunk));
        }
        out
    }

    #[test]
    fn test_single_chunk_stream() {
        let notifications = collect(&[CHAT_STREAM]);

        assert_eq!(
            notifications,
            vec![
                StreamNotification::MessageStart {
                    id: "msg-1".to_string()
                },
                StreamNotification::ContentAppended {
                    id: "msg-1".to_string(),
                    content: "Hello".to_string()
                },
                StreamNotification::ContentAppended {
                    id: "msg-1".to_string(),
                    content: "Hello world".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_chunk_boundary_insensitivity() {
        let whole = collect(&[CHAT_STREAM]);

        // Re-feed the same stream one byte at a time.
        let mut ingestor = StreamIngestor::new();
        let mut tiny = Vec::new();
        for byte in CHAT_STREAM.as_bytes() {
            tiny.extend(ingestor.feed_bytes(std::slice::from_ref(byte)));
        }

        assert_eq!(whole, tiny);
    }

    #[test]
    fn test_spec_scenario_split_mid_payload() {
        let notifications = collect(&[
            "data: {\"messageId\":\"m1\"}\n",
            "data: {\"content\":\"Hel",
            "lo\"}\n",
        ]);

        assert_eq!(
            notifications,
            vec![
                StreamNotification::MessageStart {
                    id: "m1".to_string()
                },
                StreamNotification::ContentAppended {
                    id: "m1".to_string(),
                    content: "Hello".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_message_start_at_most_once() {
        let notifications = collect(&[
            "data: {\"messageId\": \"first\"}\n\
             data: {\"messageId\": \"second\"}\n\
             data: {\"content\": \"x\"}\n",
        ]);

        let starts = notifications
            .iter()
            .filter(|n| matches!(n, StreamNotification::MessageStart { .. }))
            .count();
        assert_eq!(starts, 1);
        assert_eq!(
            notifications[0],
            StreamNotification::MessageStart {
                id: "first".to_string()
            }
        );
    }

    #[test]
    fn test_cumulative_content_is_concatenation() {
        let deltas = ["a", "bc", "def"];
        let mut ingestor = StreamIngestor::new();
        ingestor.feed("data: {\"messageId\": \"m\"}\n");

        let mut expected = String::new();
        for delta in deltas {
            expected.push_str(delta);
            let notes = ingestor.feed(&format!("data: {{\"content\": \"{delta}\"}}\n"));
            assert_eq!(
                notes,
                vec![StreamNotification::ContentAppended {
                    id: "m".to_string(),
                    content: expected.clone()
                }]
            );
        }
        assert_eq!(ingestor.close(), Some("abcdef".to_string()));
    }

    #[test]
    fn test_malformed_payload_dropped_stream_continues() {
        let notifications = collect(&[
            "data: {\"messageId\": \"m\"}\n\
             data: {not json at all\n\
             data: {\"content\": \"ok\"}\n",
        ]);

        assert_eq!(notifications.len(), 2);
        assert_eq!(
            notifications[1],
            StreamNotification::ContentAppended {
                id: "m".to_string(),
                content: "ok".to_string()
            }
        );
    }

    #[test]
    fn test_error_frame_does_not_terminate() {
        let notifications = collect(&[
            "data: {\"messageId\": \"m\"}\n\
             data: {\"error\": \"model overloaded\"}\n\
             data: {\"content\": \"still here\"}\n",
        ]);

        assert_eq!(
            notifications[1],
            StreamNotification::Error {
                message: "model overloaded".to_string()
            }
        );
        assert!(matches!(
            &notifications[2],
            StreamNotification::ContentAppended { content, .. } if content == "still here"
        ));
    }

    #[test]
    fn test_ignores_non_data_lines_and_empty_payloads() {
        let notifications = collect(&[
            "event: start\n\
             data:\n\
             data:   \n\
             : comment\n\
             \n\
             data: {\"messageId\": \"m\"}\n",
        ]);

        assert_eq!(notifications.len(), 1);
    }

    #[test]
    fn test_content_before_start_is_dropped() {
        let notifications = collect(&[
            "data: {\"content\": \"orphan\"}\n\
             data: {\"messageId\": \"m\"}\n\
             data: {\"content\": \"kept\"}\n",
        ]);

        assert_eq!(notifications.len(), 2);
        assert_eq!(
            notifications[1],
            StreamNotification::ContentAppended {
                id: "m".to_string(),
                content: "kept".to_string()
            }
        );
    }

    #[test]
    fn test_empty_fields_count_as_absent() {
        let notifications = collect(&[
            "data: {\"messageId\": \"\"}\n\
             data: {\"messageId\": \"m\", \"content\": \"\"}\n\
             data: {\"error\": \"\"}\n\
             data: {}\n",
        ]);

        assert_eq!(
            notifications,
            vec![StreamNotification::MessageStart {
                id: "m".to_string()
            }]
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let notifications = collect(&[
            "data: {\"messageId\": \"m\"}\r\ndata: {\"content\": \"hi\"}\r\n",
        ]);

        assert_eq!(notifications.len(), 2);
        assert_eq!(
            notifications[1],
            StreamNotification::ContentAppended {
                id: "m".to_string(),
                content: "hi".to_string()
            }
        );
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        // 👋 is F0 9F 91 8B; split it down the middle.
        let line = "data: {\"content\": \"hi 👋\"}\n".as_bytes();
        let emoji = line
            .windows(4)
            .position(|w| w == [0xF0, 0x9F, 0x91, 0x8B])
            .expect("emoji not found");
        let split = emoji + 2;

        let mut ingestor = StreamIngestor::new();
        ingestor.feed("data: {\"messageId\": \"m\"}\n");
        assert!(ingestor.feed_bytes(&line[..split]).is_empty());
        let notes = ingestor.feed_bytes(&line[split..]);

        assert_eq!(
            notes,
            vec![StreamNotification::ContentAppended {
                id: "m".to_string(),
                content: "hi 👋".to_string()
            }]
        );
    }

    #[test]
    fn test_accessors_track_stream_state() {
        let mut ingestor = StreamIngestor::new();
        assert_eq!(ingestor.message_id(), None);
        assert_eq!(ingestor.content(), "");

        ingestor.feed("data: {\"messageId\": \"m\"}\n");
        assert_eq!(ingestor.message_id(), Some("m"));
        assert_eq!(ingestor.content(), "");

        ingestor.feed("data: {\"content\": \"par\"}\ndata: {\"content\": \"tial\"}\n");
        assert_eq!(ingestor.content(), "partial");
    }

    #[test]
    fn test_close_discards_trailing_partial_line() {
        let mut ingestor = StreamIngestor::new();
        ingestor.feed("data: {\"messageId\": \"m\"}\ndata: {\"content\": \"done\"}\n");
        ingestor.feed("data: {\"content\": \"never terminated\"}");

        assert_eq!(ingestor.close(), Some("done".to_string()));
    }

    #[test]
    fn test_close_without_start_returns_none() {
        let ingestor = StreamIngestor::new();
        assert_eq!(ingestor.close(), None);
    }

    /// Helper to build a chunked byte stream from a string.
    fn mock_byte_stream(
        data: &str,
        chunk_size: usize,
    ) -> impl Stream<Item = std::result::Result<bytes::Bytes, std::io::Error>> {
        let chunks: Vec<_> = data
            .as_bytes()
            .chunks(chunk_size)
            .map(|c| Ok(bytes::Bytes::copy_from_slice(c)))
            .collect();
        futures_util::stream::iter(chunks)
    }

    #[tokio::test]
    async fn test_notification_stream_over_bytes() {
        let mut stream = NotificationStream::new(mock_byte_stream(CHAT_STREAM, 7));

        let mut notifications = Vec::new();
        while let Some(result) = stream.next().await {
            notifications.push(result.expect("expected valid notification"));
        }

        assert_eq!(notifications.len(), 3);
        assert_eq!(
            notifications[0],
            StreamNotification::MessageStart {
                id: "msg-1".to_string()
            }
        );
        assert_eq!(stream.finish(), Some("Hello world".to_string()));
    }

    #[tokio::test]
    async fn test_notification_stream_surfaces_transport_error() {
        let chunks: Vec<std::result::Result<bytes::Bytes, std::io::Error>> = vec![
            Ok(bytes::Bytes::from_static(b"data: {\"messageId\": \"m\"}\n")),
            Err(std::io::Error::other("connection reset")),
        ];
        let mut stream = NotificationStream::new(futures_util::stream::iter(chunks));

        let first = stream.next().await.unwrap();
        assert!(first.is_ok());
        let second = stream.next().await.unwrap();
        assert!(second.is_err());
        assert!(stream.next().await.is_none());
    }
}
