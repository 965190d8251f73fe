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

//! Error taxonomy for the codec boundary.
//!
//! Every other public operation in this crate is total: it returns a
//! `bool` or a plain value and never unwinds across the public API (see
//! the broker facade module for the registration/subscription/publish
//! surface). The only place a `Result` appears is at the codec boundary,
//! where encoding and decoding a payload can genuinely fail.

use std::fmt;

/// The kind of failure that occurred while encoding or decoding a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationErrorKind {
    /// Encoding a typed value to bytes failed.
    Encode,
    /// Decoding bytes back into a typed value failed.
    Decode,
    /// The envelope's content-type tag has no matching codec.
    UnsupportedFormat,
}

impl fmt::Display for SerializationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SerializationErrorKind::Encode => "encode",
            SerializationErrorKind::Decode => "decode",
            SerializationErrorKind::UnsupportedFormat => "unsupported format",
        };
        f.write_str(s)
    }
}

/// Error raised by a [`crate::codec::Codec`] implementation.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct SerializationError {
    pub kind: SerializationErrorKind,
    pub detail: String,
}

impl SerializationError {
    pub fn encode(detail: impl Into<String>) -> Self {
        Self {
            kind: SerializationErrorKind::Encode,
            detail: detail.into(),
        }
    }

    pub fn decode(detail: impl Into<String>) -> Self {
        Self {
            kind: SerializationErrorKind::Decode,
            detail: detail.into(),
        }
    }

    pub fn unsupported_format(detail: impl Into<String>) -> Self {
        Self {
            kind: SerializationErrorKind::UnsupportedFormat,
            detail: detail.into(),
        }
    }
}
