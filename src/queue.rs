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

//! Dispatch queue and worker (C5).
//!
//! A single dedicated worker thread drains a bounded FIFO of envelopes
//! and fans each one out to the subscribers registered for its topic.
//! Any number of threads may enqueue; only the worker ever dequeues.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use crate::envelope::Envelope;
use crate::registry::{Subscriber, WeakTable};

struct QueueState {
    items: VecDeque<Envelope>,
    shutdown: bool,
}

/// Bounded, strictly-FIFO queue of envelopes awaiting fan-out.
///
/// `enqueue` never blocks waiting for delivery: on overflow it applies
/// the reject-newest policy — the call fails and the
/// envelope is dropped by the caller. Implementations that want
/// back-pressure for non-real-time callers can poll `is_full`/`depth`
/// and retry; audio-thread callers must treat a `false` return as
/// final.
pub(crate) struct DispatchQueue {
    state: Mutex<QueueState>,
    not_empty: Condvar,
    bound: usize,
    dropped: AtomicU64,
}

impl DispatchQueue {
    pub fn new(bound: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(bound.min(1024)),
                shutdown: false,
            }),
            not_empty: Condvar::new(),
            bound,
            dropped: AtomicU64::new(0),
        }
    }

    /// Appends `envelope`. Returns `false` (without enqueuing) if the
    /// queue has already been shut down or is at capacity.
    pub fn enqueue(&self, envelope: Envelope) -> bool {
        let mut state = self.state.lock();
        if state.shutdown {
            return false;
        }
        if state.items.len() >= self.bound {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "dispatch queue full (bound={}), rejecting publish on topic {:?}",
                self.bound,
                envelope.topic()
            );
            return false;
        }
        state.items.push_back(envelope);
        self.not_empty.notify_one();
        true
    }

    /// Worker-only: blocks until an envelope is available or shutdown
    /// is signalled, returning `None` in the latter case once the
    /// queue has drained.
    fn wait_pop(&self) -> Option<Envelope> {
        let mut state = self.state.lock();
        loop {
            if let Some(envelope) = state.items.pop_front() {
                return Some(envelope);
            }
            if state.shutdown {
                return None;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Signals the worker to stop; remaining queued envelopes are
    /// discarded — they may reference subscribers that have
    /// already torn down).
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        state.items.clear();
        self.not_empty.notify_all();
    }

    pub fn depth(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// The broker's dedicated dispatch thread.
pub(crate) struct Worker {
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawns the worker. It pops under the
    /// queue lock, release the lock, snapshot+upgrade the subscriber
    /// list for the envelope's topic under the subscribers lock, then
    /// invoke each live subscriber's callback with no lock held.
    pub fn spawn(queue: Arc<DispatchQueue>, subscribers: Arc<WeakTable<dyn Subscriber>>) -> Self {
        let handle = thread::Builder::new()
            .name("mcp-broker-worker".into())
            .spawn(move || {
                log::debug!("mcp-broker dispatch worker started");
                while let Some(envelope) = queue.wait_pop() {
                    let snapshot = subscribers.find(envelope.topic());
                    for subscriber in snapshot {
                        let outcome = catch_unwind(AssertUnwindSafe(|| {
                            subscriber.on_message(&envelope);
                        }));
                        if outcome.is_err() {
                            log::warn!(
                                "subscriber callback panicked while handling topic {:?}; discarding and continuing",
                                envelope.topic()
                            );
                        }
                    }
                }
                log::debug!("mcp-broker dispatch worker stopped");
            })
            .expect("failed to spawn mcp-broker dispatch worker thread");

        Worker { handle: Some(handle) }
    }

    /// Joins the worker thread. Bounded in wall time because the
    /// worker only blocks on the queue's condition variable, which
    /// `DispatchQueue::shutdown` always signals.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::CONTENT_TYPE_MSGPACK;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn make_envelope(topic: &str) -> Envelope {
        Envelope::new(topic, 1, CONTENT_TYPE_MSGPACK, Arc::from(vec![1, 2, 3]))
    }

    #[test]
    fn enqueue_rejects_newest_when_full() {
        let queue = DispatchQueue::new(2);
        assert!(queue.enqueue(make_envelope("t")));
        assert!(queue.enqueue(make_envelope("t")));
        assert!(!queue.enqueue(make_envelope("t")), "queue-full must reject");
        assert_eq!(queue.depth(), 2);
        assert_eq!(queue.dropped_count(), 1);
    }

    #[test]
    fn shutdown_unblocks_worker_and_drops_remaining() {
        let queue = Arc::new(DispatchQueue::new(8));
        queue.enqueue(make_envelope("t"));
        queue.shutdown();
        assert_eq!(queue.depth(), 0);
        assert!(queue.wait_pop().is_none());
    }

    struct RecordingSubscriber {
        seen: Arc<StdMutex<Vec<String>>>,
    }

    impl Subscriber for RecordingSubscriber {
        fn on_message(&self, envelope: &Envelope) {
            self.seen.lock().unwrap().push(envelope.topic().to_string());
        }
    }

    struct PanickingSubscriber(AtomicUsize);
    impl Subscriber for PanickingSubscriber {
        fn on_message(&self, _envelope: &Envelope) {
            self.0.fetch_add(1, Ordering::SeqCst);
            panic!("boom");
        }
    }

    #[test]
    fn worker_isolates_subscriber_panics_and_keeps_running() {
        let queue = Arc::new(DispatchQueue::new(16));
        let subscribers: Arc<WeakTable<dyn Subscriber>> = Arc::new(WeakTable::new());

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let faulty: Arc<dyn Subscriber> = Arc::new(PanickingSubscriber(AtomicUsize::new(0)));
        let good: Arc<dyn Subscriber> = Arc::new(RecordingSubscriber {
            seen: Arc::clone(&seen),
        });
        subscribers.register("t", &faulty);
        subscribers.register("t", &good);

        let mut worker = Worker::spawn(Arc::clone(&queue), Arc::clone(&subscribers));

        queue.enqueue(make_envelope("t"));
        queue.enqueue(make_envelope("t"));

        // give the worker a moment to drain both envelopes.
        thread::sleep(Duration::from_millis(100));
        queue.shutdown();
        worker.join();

        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
