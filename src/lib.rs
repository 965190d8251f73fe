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

//! In-process, topic-based publish/subscribe broker for modular-synthesis
//! host processes.
//!
//! A [`Broker`] maintains a registry of providers and subscribers keyed
//! by topic, a bounded dispatch queue, and a dedicated worker thread
//! that drains the queue and fans envelopes out to subscribers. The
//! broker never blocks on the caller's behalf and never unwinds across
//! its public API: every operation returns a plain value, with
//! [`SerializationError`] confined to the codec boundary.
//!
//! Typical usage:
//!
//! ```no_run
//! use mcp_broker::prelude::*;
//! use std::sync::Arc;
//!
//! struct MotorState;
//! impl Subscriber for MotorState {
//!     fn on_message(&self, envelope: &Envelope) {
//!         let _: Result<String, _> = MsgpackCodec.extract(envelope);
//!     }
//! }
//!
//! let broker = get_broker();
//! let subscriber: Arc<dyn Subscriber> = Arc::new(MotorState);
//! broker.subscribe("mcp.system/motor.state", &subscriber);
//!
//! let envelope = MsgpackCodec
//!     .create_message("mcp.system/motor.state", 1, &"Hello, MCP!".to_string())
//!     .expect("encode");
//! broker.publish(envelope);
//! ```

pub mod broker;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod ring;

mod queue;

pub use broker::{get_broker, get_broker_with_config, shutdown_broker, Broker, BrokerConfig, BrokerStats};
pub use codec::{Codec, JsonCodec, MsgpackCodec};
pub use envelope::{
    ContentType, Envelope, Priority, CONTENT_TYPE_JSON, CONTENT_TYPE_MSGPACK, CONTENT_TYPE_OCTET_STREAM,
};
pub use error::{SerializationError, SerializationErrorKind};
pub use registry::{Provider, Subscriber};
pub use ring::SpscRing;

/// Re-exports the pieces most callers need with a single `use`.
pub mod prelude {
    pub use crate::broker::{get_broker, get_broker_with_config, shutdown_broker, Broker, BrokerConfig, BrokerStats};
    pub use crate::codec::{Codec, JsonCodec, MsgpackCodec};
    pub use crate::envelope::{Envelope, Priority};
    pub use crate::error::{SerializationError, SerializationErrorKind};
    pub use crate::registry::{Provider, Subscriber};
    pub use crate::ring::SpscRing;
}
