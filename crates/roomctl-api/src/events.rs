//! Server-sent event stream.
//!
//! The server pushes room lifecycle notifications on `GET /api/events?sse`
//! as `text/event-stream` frames:
//!
//! ```text
//! event: rooms
//! data: {"id":"3f1c...","action":"started"}
//!
//! : ping
//! ```
//!
//! [`SseDecoder`] turns raw body chunks into [`SseFrame`]s and
//! [`ServerEvent::from_frame`] types them. [`EventSubscription`] glues both
//! onto a live response body.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;
use serde::Serialize;

use crate::error::Error;
use crate::types::{PullStatusResponse, RoomEvent};

const ROOMS_EVENT: &str = "rooms";
const PULL_EVENT: &str = "pull";

// ── Frames ───────────────────────────────────────────────────────────

/// One dispatched SSE frame: the `event:` name and the joined `data:` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
///
/// Chunks may split lines or frames anywhere; partial input stays
/// buffered until the terminating newline arrives. Comment lines (`:`)
/// and fields other than `event` and `data` are dropped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: BytesMut,
    event: String,
    data: String,
    has_data: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and collect every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw = self.buf.split_to(pos + 1);
            let line = String::from_utf8_lossy(&raw[..pos]);
            if let Some(frame) = self.process_line(line.trim_end_matches('\r')) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
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
            "event" => value.clone_into(&mut self.event),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = std::mem::take(&mut self.event);
        let data = std::mem::take(&mut self.data);
        if !std::mem::replace(&mut self.has_data, false) {
            return None;
        }

        Some(SseFrame {
            event: if event.is_empty() {
                "message".to_owned()
            } else {
                event
            },
            data,
        })
    }
}

// ── Typed events ─────────────────────────────────────────────────────

/// A typed server push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum ServerEvent {
    /// Room lifecycle transition (`event: rooms`).
    Rooms(RoomEvent),
    /// Full image-pull status snapshot (`event: pull`).
    Pull(PullStatusResponse),
    /// Any event name this client does not understand.
    Unknown { event: String, data: String },
}

impl ServerEvent {
    /// Type a decoded frame. Known event names with malformed payloads
    /// produce [`Error::Deserialization`]; unknown names never fail.
    pub fn from_frame(frame: SseFrame) -> Result<Self, Error> {
        match frame.event.as_str() {
            ROOMS_EVENT => decode(&frame.data).map(Self::Rooms),
            PULL_EVENT => decode(&frame.data).map(Self::Pull),
            _ => Ok(Self::Unknown {
                event: frame.event,
                data: frame.data,
            }),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(data: &str) -> Result<T, Error> {
    serde_json::from_str(data).map_err(|e| Error::Deserialization {
        message: format!("invalid event payload: {e}"),
        body: data.to_owned(),
    })
}

// ── Subscription ─────────────────────────────────────────────────────

type EventStream = Pin<Box<dyn Stream<Item = Result<ServerEvent, Error>> + Send>>;

/// Live event subscription.
///
/// Yields `Ok` for each typed event and `Err(Deserialization)` for a
/// frame that could not be decoded (the stream continues). A broken body
/// yields one `Err(EventStream)` and then ends. The stream also ends
/// when the server closes the connection.
pub struct EventSubscription {
    inner: EventStream,
}

impl EventSubscription {
    /// Build a subscription over any byte stream, e.g. a response body.
    pub fn from_byte_stream<S, E>(body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut body = Box::pin(body);
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        for frame in decoder.push(&bytes) {
                            yield ServerEvent::from_frame(frame);
                        }
                    }
                    Err(e) => {
                        yield Err(Error::EventStream(format!("stream interrupted: {e}")));
                        break;
                    }
                }
            }
        };
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Next event, or `None` once the stream has ended.
    pub async fn next_event(&mut self) -> Option<Result<ServerEvent, Error>> {
        self.inner.next().await
    }
}

impl Stream for EventSubscription {
    type Item = Result<ServerEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSubscription").finish_non_exhaustive()
    }
}

pub(crate) fn subscription(resp: reqwest::Response) -> EventSubscription {
    EventSubscription::from_byte_stream(resp.bytes_stream())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoomEventAction;

    #[test]
    fn decodes_frame_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: ro").is_empty());
        assert!(decoder.push(b"oms\ndata: {\"id\":\"a\",").is_empty());
        let frames = decoder.push(b"\"action\":\"ready\"}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "rooms".into(),
                data: r#"{"id":"a","action":"ready"}"#.into(),
            }]
        );
    }

    #[test]
    fn ping_comments_produce_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b": ping\n\n: ping\n\n").is_empty());
    }

    #[test]
    fn crlf_and_multiline_data_are_handled() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"data: one\r\ndata: two\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "message");
        assert_eq!(frames[0].data, "one\ntwo");
    }

    #[test]
    fn typed_rooms_event() {
        let event = ServerEvent::from_frame(SseFrame {
            event: "rooms".into(),
            data: r#"{"id":"r1","action":"paused"}"#.into(),
        })
        .expect("decode");
        assert_eq!(
            event,
            ServerEvent::Rooms(RoomEvent {
                id: "r1".into(),
                action: RoomEventAction::Paused,
            })
        );
    }

    #[test]
    fn malformed_rooms_payload_is_a_deserialization_error() {
        let err = ServerEvent::from_frame(SseFrame {
            event: "rooms".into(),
            data: "not json".into(),
        })
        .expect_err("must fail");
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn unknown_event_name_is_kept() {
        let event = ServerEvent::from_frame(SseFrame {
            event: "members".into(),
            data: "{}".into(),
        })
        .expect("decode");
        assert!(matches!(event, ServerEvent::Unknown { ref event, .. } if event == "members"));
    }

    #[tokio::test]
    async fn subscription_yields_events_then_ends() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b": ping\n\nevent: rooms\n")),
            Ok(Bytes::from_static(
                b"data: {\"id\":\"r1\",\"action\":\"created\"}\n\n",
            )),
            Ok(Bytes::from_static(
                b"event: pull\ndata: {\"active\":true,\"status\":[\"Pulling\"]}\n\n",
            )),
        ];
        let mut sub = EventSubscription::from_byte_stream(futures_util::stream::iter(chunks));

        let first = sub.next_event().await.expect("item").expect("event");
        assert!(matches!(first, ServerEvent::Rooms(ref e) if e.action == RoomEventAction::Created));

        let second = sub.next_event().await.expect("item").expect("event");
        match second {
            ServerEvent::Pull(status) => {
                assert!(status.active);
                assert_eq!(status.status, vec!["Pulling".to_owned()]);
            }
            other => panic!("expected pull event, got {other:?}"),
        }

        assert!(sub.next_event().await.is_none());
    }

    #[tokio::test]
    async fn broken_body_reports_stream_error() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"event: rooms\n")),
            Err(std::io::Error::other("reset by peer")),
        ];
        let mut sub = EventSubscription::from_byte_stream(futures_util::stream::iter(chunks));

        let err = sub.next_event().await.expect("item").expect_err("error");
        assert!(matches!(err, Error::EventStream(ref msg) if msg.contains("reset by peer")));
        assert!(sub.next_event().await.is_none());
    }
}
