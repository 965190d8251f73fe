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

//! Broker facade (C6): the public surface and process-wide singleton.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::envelope::Envelope;
use crate::queue::{DispatchQueue, Worker};
use crate::registry::{Provider, Subscriber, WeakTable};

/// Tunable knobs for a [`Broker`] instance: the queue bound and other
/// construction-time choices.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Maximum number of envelopes the dispatch queue holds before
    /// `publish` starts failing with the reject-newest policy.
    pub queue_bound: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self { queue_bound: 1024 }
    }
}

/// Point-in-time snapshot of broker load, cheap enough to poll from a
/// host UI or a test assertion.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrokerStats {
    pub provider_topic_count: usize,
    pub subscriber_topic_count: usize,
    pub queue_depth: usize,
    pub dropped_count: u64,
}

/// The broker. `[Uninit]` is the absence of an instance; once
/// constructed a `Broker` is always `[Running]` until [`Broker::shutdown`]
/// moves it to `[Stopped]`, after which every mutating operation is a
/// no-op returning `false`.
pub struct Broker {
    providers: Arc<WeakTable<dyn Provider>>,
    subscribers: Arc<WeakTable<dyn Subscriber>>,
    queue: Arc<DispatchQueue>,
    worker: Mutex<Option<Worker>>,
    stopped: AtomicBool,
}

impl Broker {
    /// Constructs a standalone broker with its own worker thread. Most
    /// callers want [`get_broker`]/[`get_broker_with_config`]; this is
    /// exposed directly for tests and hosts that need an isolated
    /// instance rather than the process-wide singleton.
    pub fn new(config: BrokerConfig) -> Self {
        let providers = Arc::new(WeakTable::new());
        let subscribers = Arc::new(WeakTable::new());
        let queue = Arc::new(DispatchQueue::new(config.queue_bound.max(1)));
        let worker = Worker::spawn(Arc::clone(&queue), Arc::clone(&subscribers));

        log::debug!("broker constructed (queue_bound={})", config.queue_bound);

        Self {
            providers,
            subscribers,
            queue,
            worker: Mutex::new(Some(worker)),
            stopped: AtomicBool::new(false),
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Registers `provider` as offering `topic`.
    pub fn register_context(&self, topic: &str, provider: &Arc<dyn Provider>) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.providers.register(topic, provider)
    }

    /// Removes `provider` from `topic`'s provider list.
    pub fn unregister_context(&self, topic: &str, provider: &Arc<dyn Provider>) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.providers.unregister(topic, provider)
    }

    /// Subscribes `subscriber` to `topic`.
    pub fn subscribe(&self, topic: &str, subscriber: &Arc<dyn Subscriber>) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.subscribers.register(topic, subscriber)
    }

    /// Removes `subscriber` from `topic`'s subscriber list.
    pub fn unsubscribe(&self, topic: &str, subscriber: &Arc<dyn Subscriber>) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.subscribers.unregister(topic, subscriber)
    }

    /// Removes `subscriber` from every topic it is subscribed to. A
    /// snapshot already taken by the worker for an in-flight publish
    /// may still deliver one trailing callback.
    pub fn unsubscribe_all(&self, subscriber: &Arc<dyn Subscriber>) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.subscribers.unregister_all(subscriber)
    }

    /// Enqueues `envelope` for dispatch. Fails (returns `false`) on an
    /// empty topic, a stopped broker, or a full dispatch queue
    /// (reject-newest).
    pub fn publish(&self, envelope: Envelope) -> bool {
        if self.is_stopped() {
            return false;
        }
        if envelope.topic().is_empty() {
            return false;
        }
        self.queue.enqueue(envelope)
    }

    /// Topics with at least one live provider, in first-registration order.
    pub fn available_topics(&self) -> Vec<String> {
        self.providers.topics()
    }

    /// Topics with at least one live subscriber, in first-registration
    /// order. Useful for a host UI that wants to show who's listening.
    pub fn subscribed_topics(&self) -> Vec<String> {
        self.subscribers.topics()
    }

    /// Live providers registered for `topic`, in registration order.
    pub fn find_providers(&self, topic: &str) -> Vec<Arc<dyn Provider>> {
        self.providers.find(topic)
    }

    /// Protocol version of this broker implementation.
    pub fn version(&self) -> u32 {
        1
    }

    /// A cheap, lock-ordered snapshot of current load.
    pub fn stats(&self) -> BrokerStats {
        BrokerStats {
            provider_topic_count: self.providers.topics().len(),
            subscriber_topic_count: self.subscribers.topics().len(),
            queue_depth: self.queue.depth(),
            dropped_count: self.queue.dropped_count(),
        }
    }

    /// Moves the broker to `[Stopped]`: signals and joins the worker,
    /// discarding any envelopes still queued. Idempotent — a second
    /// call observes `stopped` already set and returns immediately.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        log::debug!("broker shutting down");
        self.queue.shutdown();
        if let Some(mut worker) = self.worker.lock().take() {
            worker.join();
        }
    }
}

impl Drop for Broker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

static BROKER_SLOT: OnceLock<ArcSwapOption<Broker>> = OnceLock::new();
static CONSTRUCT_LOCK: Mutex<()> = Mutex::new(());

fn slot() -> &'static ArcSwapOption<Broker> {
    BROKER_SLOT.get_or_init(|| ArcSwapOption::from(None))
}

/// Returns the process-wide broker, constructing it with
/// [`BrokerConfig::default`] on first access under a construction-
/// exclusion lock (double-checked after acquiring it, so concurrent
/// first-callers never race to build two brokers).
pub fn get_broker() -> Arc<Broker> {
    get_broker_with_config(BrokerConfig::default())
}

/// As [`get_broker`], but the config is only honored if this is the
/// call that actually constructs the singleton; later calls observe
/// whatever config the first caller used.
pub fn get_broker_with_config(config: BrokerConfig) -> Arc<Broker> {
    let slot = slot();
    if let Some(existing) = slot.load_full() {
        return existing;
    }
    let _guard = CONSTRUCT_LOCK.lock();
    if let Some(existing) = slot.load_full() {
        return existing;
    }
    let broker = Arc::new(Broker::new(config));
    slot.store(Some(Arc::clone(&broker)));
    broker
}

/// Explicit teardown of the process-wide singleton. After this
/// call the slot is empty again ([`Uninit`]); a subsequent
/// [`get_broker`] call constructs a fresh instance rather than handing
/// back the stopped one.
pub fn shutdown_broker() {
    if let Some(broker) = slot().swap(None) {
        broker.shutdown();
    }
}
