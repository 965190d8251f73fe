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

//! Codec interface (C2) and the two core implementations.
//!
//! The broker never hard-codes a serialization library: it only ever
//! deals in `Envelope`s, whose payload is opaque bytes plus a
//! content-type tag. `Codec` is how a provider turns a typed value into
//! that payload, and how a subscriber turns it back.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::envelope::{ContentType, Envelope, CONTENT_TYPE_JSON, CONTENT_TYPE_MSGPACK};
use crate::error::SerializationError;

/// Encodes typed values to bytes under a content-type tag, and decodes
/// the reverse. Implementations are expected to be cheap to construct
/// (typically zero-sized) and are not required to be `Send`/`Sync`
/// themselves — only the bytes they produce travel between threads.
pub trait Codec {
    /// The content-type tag this codec stamps into envelopes it builds.
    fn format_tag(&self) -> ContentType;

    /// Encodes `value` to a shared, immutable byte buffer.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Arc<[u8]>, SerializationError>;

    /// Decodes `bytes` back into a `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializationError>;

    /// Convenience: encode `value` and wrap it in a fresh envelope.
    fn create_message<T: Serialize>(
        &self,
        topic: impl Into<Arc<str>>,
        sender_id: u64,
        value: &T,
    ) -> Result<Envelope, SerializationError> {
        let bytes = self.encode(value)?;
        Ok(Envelope::new(topic, sender_id, self.format_tag(), bytes))
    }

    /// Convenience: check `envelope.format()` matches this codec's tag,
    /// then decode its payload.
    fn extract<T: DeserializeOwned>(&self, envelope: &Envelope) -> Result<T, SerializationError> {
        if envelope.size() == 0 {
            return Err(SerializationError::decode("empty payload"));
        }
        if envelope.format() != self.format_tag() {
            return Err(SerializationError::unsupported_format(format!(
                "codec tag {} does not match envelope format {}",
                self.format_tag(),
                envelope.format()
            )));
        }
        self.decode(envelope.payload())
    }
}

/// Primary binary codec. Backed by `rmp-serde` (MessagePack), which
/// supports integers, doubles, strings, byte blobs, homogeneous
/// sequences of these, and string-keyed maps — exactly the payload
/// shapes a broker payload needs to carry.
#[derive(Debug, Default, Clone, Copy)]
pub struct MsgpackCodec;

impl Codec for MsgpackCodec {
    fn format_tag(&self) -> ContentType {
        CONTENT_TYPE_MSGPACK
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Arc<[u8]>, SerializationError> {
        rmp_serde::to_vec_named(value)
            .map(Arc::from)
            .map_err(|e| SerializationError::encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializationError> {
        if bytes.is_empty() {
            return Err(SerializationError::decode("empty payload"));
        }
        rmp_serde::from_slice(bytes).map_err(|e| SerializationError::decode(e.to_string()))
    }
}

/// Secondary text codec, tagged `application/json`. A broker built
/// without it still works: `extract` on a JSON-tagged envelope simply
/// fails with `UnsupportedFormat`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format_tag(&self) -> ContentType {
        CONTENT_TYPE_JSON
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Arc<[u8]>, SerializationError> {
        serde_json::to_vec(value)
            .map(Arc::from)
            .map_err(|e| SerializationError::encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SerializationError> {
        if bytes.is_empty() {
            return Err(SerializationError::decode("empty payload"));
        }
        serde_json::from_slice(bytes).map_err(|e| SerializationError::decode(e.to_string()))
    }
}
