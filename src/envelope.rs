/*
MIT License
Copyright (c) 2025 Felipe Neves

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in
all copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
THE SOFTWARE.
*/

//! Message envelope (C1): the immutable value that flows through the broker.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Priority carried by an envelope for subscribers to inspect.
///
/// Dispatch is strictly FIFO regardless of priority (see the dispatch
/// queue module) — this field is metadata only, never a reordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low = 1,
    Normal = 5,
    High = 10,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

/// Content-type tag stamped on an envelope by the codec that produced it.
///
/// Two values are meaningful at the core layer, `application/msgpack`
/// and `application/json`; the broker itself treats the tag as an opaque
/// string and stores it verbatim.
pub type ContentType = &'static str;

pub const CONTENT_TYPE_MSGPACK: ContentType = "application/msgpack";
pub const CONTENT_TYPE_JSON: ContentType = "application/json";
pub const CONTENT_TYPE_OCTET_STREAM: ContentType = "application/octet-stream";

/// Immutable message envelope exchanged between providers and subscribers.
///
/// Construction is the only way to populate an envelope; there is no
/// interior mutation and no equality relation is defined (two envelopes
/// with identical fields are not considered "the same message" by the
/// broker — identity is left to `message_id` if the caller sets one).
#[derive(Clone)]
pub struct Envelope {
    topic: Arc<str>,
    sender_id: u64,
    format: ContentType,
    payload: Arc<[u8]>,
    message_id: u64,
    priority: Priority,
    timestamp: u64,
}

impl Envelope {
    /// Builds an envelope. `topic` is cloned into a shared, reference
    /// counted string so that cheap clones (e.g. for the dispatch
    /// queue and per-subscriber fan-out) don't re-copy the text.
    pub fn new(topic: impl Into<Arc<str>>, sender_id: u64, format: ContentType, payload: Arc<[u8]>) -> Self {
        Self {
            topic: topic.into(),
            sender_id,
            format,
            payload,
            message_id: 0,
            priority: Priority::default(),
            timestamp: monotonic_timestamp(),
        }
    }

    /// Sets the optional message id (0 means unset, the default).
    #[must_use]
    pub fn with_message_id(mut self, message_id: u64) -> Self {
        self.message_id = message_id;
        self
    }

    /// Sets the optional priority (defaults to [`Priority::Normal`]).
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Overrides the creation timestamp. Informational only; the broker
    /// never acts on it.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn sender_id(&self) -> u64 {
        self.sender_id
    }

    pub fn format(&self) -> ContentType {
        self.format
    }

    pub fn payload(&self) -> &Arc<[u8]> {
        &self.payload
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn message_id(&self) -> u64 {
        self.message_id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("topic", &self.topic)
            .field("sender_id", &self.sender_id)
            .field("format", &self.format)
            .field("size", &self.payload.len())
            .field("message_id", &self.message_id)
            .field("priority", &self.priority)
            .finish()
    }
}

fn monotonic_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
