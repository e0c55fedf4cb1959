//! Live video feed
//!
//! A server pushes `{"videoUrl": "..."}` messages over a server-sent event
//! stream; every message replaces whatever the player is showing. The
//! decoder here is incremental so the body can be consumed chunk by chunk
//! as it arrives.

use crate::{Error, Result};
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use futures::channel::mpsc;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// A request to switch the player to another video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoUpdate {
    pub video_url: String,
}

impl VideoUpdate {
    pub fn new(video_url: impl Into<String>) -> Self {
        Self {
            video_url: video_url.into(),
        }
    }

    /// Decode the JSON payload of an event
    pub fn from_event(event: &SseEvent) -> Result<Self> {
        serde_json::from_str(&event.data).map_err(|e| Error::FeedDecode(e.to_string()))
    }
}

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// `event:` field, if present
    pub event: Option<String>,
    /// `data:` lines joined with newlines
    pub data: String,
    /// `id:` field, if present
    pub id: Option<String>,
}

impl SseEvent {
    /// Unnamed events and events named `message` carry feed payloads
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Incremental `text/event-stream` decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current, unterminated line
    line: BytesMut,
    /// Fields of the event being assembled
    pending: SseEvent,
    data_lines: Vec<String>,
    /// Previous chunk ended on `\r`; a leading `\n` belongs to it
    after_cr: bool,
    /// A leading byte order mark has been ruled out or consumed
    past_bom: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the body, returning every event it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();

        for &byte in chunk {
            if !self.past_bom {
                // Until the mark is complete, `line` holds only its prefix
                let matched = self.line.len();
                if byte == BOM[matched] {
                    self.line.put_u8(byte);
                    if matched + 1 == BOM.len() {
                        self.line.clear();
                        self.past_bom = true;
                    }
                    continue;
                }
                self.past_bom = true;
            }

            if self.after_cr {
                self.after_cr = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\n' => self.end_line(&mut events),
                b'\r' => {
                    self.after_cr = true;
                    self.end_line(&mut events);
                }
                _ => self.line.put_u8(byte),
            }
        }

        events
    }

    fn end_line(&mut self, events: &mut Vec<SseEvent>) {
        let line = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();

        if line.is_empty() {
            self.dispatch(events);
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line.as_str(), ""),
        };

        match field {
            "data" => self.data_lines.push(value.to_string()),
            "event" => self.pending.event = Some(value.to_string()),
            "id" => self.pending.id = Some(value.to_string()),
            // `retry` only matters to reconnecting clients
            _ => {}
        }
    }

    fn dispatch(&mut self, events: &mut Vec<SseEvent>) {
        let mut event = std::mem::take(&mut self.pending);
        if self.data_lines.is_empty() {
            return;
        }
        event.data = self.data_lines.join("\n");
        self.data_lines.clear();
        events.push(event);
    }
}

/// Source of video updates
#[async_trait]
pub trait VideoFeed: Send + Sync {
    /// Open a subscription. Dropping the stream closes it.
    async fn subscribe(&self) -> Result<BoxStream<'static, Result<VideoUpdate>>>;
}

/// Video feed over a server-sent event endpoint
pub struct SseVideoFeed {
    client: Client,
    url: Url,
}

impl SseVideoFeed {
    /// `connect_timeout` bounds connection setup only; the stream itself
    /// stays open indefinitely.
    pub fn new(url: Url, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl VideoFeed for SseVideoFeed {
    async fn subscribe(&self) -> Result<BoxStream<'static, Result<VideoUpdate>>> {
        let response = self
            .client
            .get(self.url.clone())
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| Error::FeedConnect {
                url: self.url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FeedStatus {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }

        info!(url = %self.url, "Video feed connected");

        Ok(decode_body(response.bytes_stream()))
    }
}

/// Decode a `text/event-stream` body into video updates.
///
/// Malformed messages come through as `Err` and the stream goes on; a
/// transport error is yielded once and ends the stream. An event still
/// unterminated when the body ends is dropped.
fn decode_body<S>(body: S) -> BoxStream<'static, Result<VideoUpdate>>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    stream::unfold(
        (Some(body.boxed()), SseDecoder::new(), VecDeque::<SseEvent>::new()),
        |(mut body, mut decoder, mut ready)| async move {
            loop {
                if let Some(event) = ready.pop_front() {
                    let update = VideoUpdate::from_event(&event);
                    return Some((update, (body, decoder, ready)));
                }

                let chunk = body.as_mut()?.next().await;
                match chunk {
                    Some(Ok(bytes)) => {
                        ready.extend(decoder.feed(&bytes).into_iter().filter(|e| {
                            if !e.is_message() {
                                debug!(event = ?e.event, "Ignoring named event");
                            }
                            e.is_message()
                        }));
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Video feed transport error");
                        return Some((Err(Error::Network(e)), (None, decoder, ready)));
                    }
                    None => {
                        debug!("Video feed body ended");
                        return None;
                    }
                }
            }
        },
    )
    .boxed()
}

/// In-process feed for hosts that receive updates over their own transport
///
/// Supports a single subscriber; later subscriptions fail.
pub struct ChannelFeed {
    receiver: Mutex<Option<mpsc::UnboundedReceiver<VideoUpdate>>>,
}

impl ChannelFeed {
    /// Create a feed and the sender that drives it
    pub fn new() -> (Self, mpsc::UnboundedSender<VideoUpdate>) {
        let (tx, rx) = mpsc::unbounded();
        (
            Self {
                receiver: Mutex::new(Some(rx)),
            },
            tx,
        )
    }
}

#[async_trait]
impl VideoFeed for ChannelFeed {
    async fn subscribe(&self) -> Result<BoxStream<'static, Result<VideoUpdate>>> {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
            .ok_or_else(|| Error::FeedUnavailable("channel feed already subscribed".into()))?;

        Ok(receiver.map(Ok).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {\"videoUrl\":\"a.mp4\"}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(
            VideoUpdate::from_event(&events[0]).unwrap(),
            VideoUpdate::new("a.mp4")
        );
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"da").is_empty());
        assert!(decoder.feed(b"ta: {\"videoUrl\":").is_empty());
        assert!(decoder.feed(b"\"b.mp4\"}\n").is_empty());
        let events = decoder.feed(b"\n");
        assert_eq!(events[0].data, "{\"videoUrl\":\"b.mp4\"}");
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let payload = "data: café\n\n".as_bytes();
        // Split inside the two-byte 'é'
        let split = payload.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(&payload[..split]).is_empty());
        let events = decoder.feed(&payload[split..]);
        assert_eq!(events[0].data, "café");
    }

    #[test]
    fn test_crlf_and_multiline_data() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"id: 7\r\ndata: one\r\ndata: two\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "one\ntwo");
        assert_eq!(events[0].id.as_deref(), Some("7"));
    }

    #[test]
    fn test_crlf_split_between_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: x\r").is_empty());
        let events = decoder.feed(b"\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_comments_and_empty_events_skipped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b": keep-alive\n\nretry: 1000\n\ndata: y\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "y");
    }

    #[test]
    fn test_named_events() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"event: ping\ndata: {}\n\nevent: message\ndata: {}\n\n");
        assert!(!events[0].is_message());
        assert!(events[1].is_message());
        // Name does not leak into the next event
        let events = decoder.feed(b"data: z\n\n");
        assert_eq!(events[0].event, None);
    }

    #[test]
    fn test_leading_bom_stripped() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed("\u{FEFF}data: {\"videoUrl\":\"a.mp4\"}\n\n".as_bytes());
        assert_eq!(events.len(), 1);
        assert_eq!(VideoUpdate::from_event(&events[0]).unwrap(), VideoUpdate::new("a.mp4"));

        // Mark split across chunks
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"\xEF").is_empty());
        let events = decoder.feed(b"\xBB\xBFdata: x\n\n");
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn test_unterminated_event_not_dispatched() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: x\n").is_empty());
    }

    #[tokio::test]
    async fn test_body_ending_mid_event_drops_it() {
        let body = stream::iter(vec![Ok(Bytes::from_static(
            b"data: {\"videoUrl\":\"a.mp4\"}\n\ndata: {\"videoUrl\":\"b.mp4\"}\n",
        ))]);
        let mut updates = decode_body(body);

        assert_eq!(updates.next().await.unwrap().unwrap(), VideoUpdate::new("a.mp4"));
        assert!(updates.next().await.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_ends_stream() {
        let transport_error = Client::new().get("not a url").send().await.unwrap_err();
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"videoUrl\":\"a.mp4\"}\n\n")),
            Err(transport_error),
            Ok(Bytes::from_static(b"data: {\"videoUrl\":\"b.mp4\"}\n\n")),
        ]);
        let mut updates = decode_body(body);

        assert_eq!(updates.next().await.unwrap().unwrap(), VideoUpdate::new("a.mp4"));
        assert!(matches!(updates.next().await, Some(Err(Error::Network(_)))));
        assert!(updates.next().await.is_none());
    }

    #[test]
    fn test_malformed_payload() {
        let event = SseEvent {
            data: "{\"url\": 1}".into(),
            ..Default::default()
        };
        let err = VideoUpdate::from_event(&event).unwrap_err();
        assert_eq!(err.error_code(), "FEED_DECODE");
    }

    #[tokio::test]
    async fn test_channel_feed_single_subscriber() {
        let (feed, tx) = ChannelFeed::new();
        let mut updates = feed.subscribe().await.unwrap();
        assert!(feed.subscribe().await.is_err());

        tx.unbounded_send(VideoUpdate::new("c.mp4")).unwrap();
        let update = updates.next().await.unwrap().unwrap();
        assert_eq!(update.video_url, "c.mp4");

        drop(updates);
        assert!(tx.is_closed());
    }
}
