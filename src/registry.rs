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

//! Topic registry (C4): providers and subscribers keyed by topic.
//!
//! Both tables share the same shape (an ordered map from topic to a
//! list of weakly-held handles) and the same pruning rule, so they are
//! both instances of the generic [`WeakTable`]. Each table has its own
//! lock, independent of each other, and no registry lock is ever held
//! while a user callback runs.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Capability required of a provider: enumerate the topics it offers.
/// This is also the provider's identity handle for discovery purposes.
pub trait Provider: Send + Sync {
    fn provided_topics(&self) -> Vec<String>;
}

/// Capability required of a subscriber: receive envelopes synchronously
/// on the broker's dispatch worker thread.
pub trait Subscriber: Send + Sync {
    fn on_message(&self, envelope: &crate::envelope::Envelope);
}

/// An ordered `topic -> Vec<Weak<T>>` table with duplicate rejection and
/// opportunistic pruning of expired handles.
pub(crate) struct WeakTable<T: ?Sized> {
    inner: Mutex<IndexMap<Arc<str>, Vec<Weak<T>>>>,
}

impl<T: ?Sized> Default for WeakTable<T> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(IndexMap::new()),
        }
    }
}

impl<T: ?Sized> WeakTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` under `topic`. Returns `false` for an empty
    /// topic or a handle already present (live) in that topic's list.
    pub fn register(&self, topic: &str, handle: &Arc<T>) -> bool {
        if topic.is_empty() {
            return false;
        }
        let mut guard = self.inner.lock();
        let list = guard.entry(Arc::from(topic)).or_default();
        prune(list);
        if list.iter().any(|w| same_handle(w, handle)) {
            return false;
        }
        list.push(Arc::downgrade(handle));
        true
    }

    /// Removes `handle` from `topic`'s list. Returns `false` if the
    /// topic is absent or the handle isn't present. Removes the topic
    /// key entirely once its list becomes empty.
    pub fn unregister(&self, topic: &str, handle: &Arc<T>) -> bool {
        let mut guard = self.inner.lock();
        let Some(list) = guard.get_mut(topic) else {
            return false;
        };
        let removed = list.iter().any(|w| same_handle(w, handle));
        list.retain(|w| w.upgrade().is_some() && !same_handle(w, handle));
        if list.is_empty() {
            guard.shift_remove(topic);
        }
        removed
    }

    /// Removes `handle` from every topic it's registered under. Returns
    /// `true` iff at least one removal occurred. Safe to call
    /// concurrently with other registrations/unregistrations.
    pub fn unregister_all(&self, handle: &Arc<T>) -> bool {
        let mut guard = self.inner.lock();
        let mut any = false;
        guard.retain(|_, list| {
            if list.iter().any(|w| same_handle(w, handle)) {
                any = true;
            }
            list.retain(|w| w.upgrade().is_some() && !same_handle(w, handle));
            !list.is_empty()
        });
        any
    }

    /// Topics with at least one live handle, in first-registration order.
    /// Expired handles are pruned as a side effect.
    pub fn topics(&self) -> Vec<String> {
        let mut guard = self.inner.lock();
        guard.retain(|_, list| {
            prune(list);
            !list.is_empty()
        });
        guard.keys().map(|k| k.to_string()).collect()
    }

    /// Live handles registered under `topic`, in registration order.
    pub fn find(&self, topic: &str) -> Vec<Arc<T>> {
        let mut guard = self.inner.lock();
        let Some(list) = guard.get_mut(topic) else {
            return Vec::new();
        };
        prune(list);
        let strong: Vec<Arc<T>> = list.iter().filter_map(Weak::upgrade).collect();
        if list.is_empty() {
            guard.shift_remove(topic);
        }
        strong
    }
}

fn prune<T: ?Sized>(list: &mut Vec<Weak<T>>) {
    list.retain(|w| w.upgrade().is_some());
}

fn same_handle<T: ?Sized>(weak: &Weak<T>, handle: &Arc<T>) -> bool {
    match weak.upgrade() {
        Some(strong) => Arc::ptr_eq(&strong, handle),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;

    struct TestProvider(Vec<String>);
    impl Provider for TestProvider {
        fn provided_topics(&self) -> Vec<String> {
            self.0.clone()
        }
    }

    struct TestSubscriber;
    impl Subscriber for TestSubscriber {
        fn on_message(&self, _envelope: &Envelope) {}
    }

    #[test]
    fn register_find_and_topics() {
        let table: WeakTable<dyn Provider> = WeakTable::new();
        let p1: Arc<dyn Provider> = Arc::new(TestProvider(vec!["test/topic1".into()]));

        assert!(table.register("test/topic1", &p1));
        assert!(table.register("test/topic2", &p1));
        assert!(!table.register("test/topic1", &p1), "duplicate must be rejected");
        assert!(!table.register("", &p1), "empty topic must be rejected");

        let mut topics = table.topics();
        topics.sort();
        assert_eq!(topics, vec!["test/topic1", "test/topic2"]);
        assert_eq!(table.find("test/topic1").len(), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let table: WeakTable<dyn Subscriber> = WeakTable::new();
        let s1: Arc<dyn Subscriber> = Arc::new(TestSubscriber);

        assert!(table.register("t", &s1));
        assert!(table.unregister("t", &s1));
        assert!(!table.unregister("t", &s1));
        assert!(table.topics().is_empty());
    }

    #[test]
    fn expired_handles_are_pruned_from_discovery() {
        let table: WeakTable<dyn Provider> = WeakTable::new();
        {
            let p1: Arc<dyn Provider> = Arc::new(TestProvider(vec!["t".into()]));
            assert!(table.register("t", &p1));
            assert_eq!(table.find("t").len(), 1);
        }
        // p1 has been dropped; no strong references remain.
        assert!(table.topics().is_empty());
        assert!(table.find("t").is_empty());
    }

    #[test]
    fn unregister_all_removes_every_topic_for_handle() {
        let table: WeakTable<dyn Subscriber> = WeakTable::new();
        let s1: Arc<dyn Subscriber> = Arc::new(TestSubscriber);
        let s2: Arc<dyn Subscriber> = Arc::new(TestSubscriber);

        table.register("a", &s1);
        table.register("b", &s1);
        table.register("b", &s2);

        assert!(table.unregister_all(&s1));
        assert!(!table.unregister_all(&s1), "idempotent");

        assert_eq!(table.topics(), vec!["b"]);
        assert_eq!(table.find("b").len(), 1);
    }

    #[test]
    fn null_equivalent_empty_topic_rejected_everywhere() {
        let table: WeakTable<dyn Provider> = WeakTable::new();
        let p1: Arc<dyn Provider> = Arc::new(TestProvider(vec![]));
        assert!(!table.register("", &p1));
        assert!(!table.unregister("", &p1));
    }

    #[test]
    fn unregister_does_not_report_removed_when_only_unrelated_handle_expired() {
        let table: WeakTable<dyn Provider> = WeakTable::new();
        let p1: Arc<dyn Provider> = Arc::new(TestProvider(vec!["t".into()]));
        let p3: Arc<dyn Provider> = Arc::new(TestProvider(vec!["t".into()]));
        table.register("t", &p1);
        {
            let p2: Arc<dyn Provider> = Arc::new(TestProvider(vec!["t".into()]));
            table.register("t", &p2);
            // p2's strong ref drops here, leaving a dead weak handle in
            // the list that has not yet been observed/pruned.
        }

        // p3 was never registered under "t"; its absence must be
        // reported even though the expired p2 entry is still in the
        // list and gets pruned as a side effect of this very call.
        assert!(!table.unregister("t", &p3));
        // p1 is genuinely still there.
        assert_eq!(table.find("t").len(), 1);
    }

    #[test]
    fn unregister_all_does_not_report_removed_when_only_unrelated_handle_expired() {
        let table: WeakTable<dyn Subscriber> = WeakTable::new();
        let s1: Arc<dyn Subscriber> = Arc::new(TestSubscriber);
        let s3: Arc<dyn Subscriber> = Arc::new(TestSubscriber);
        table.register("a", &s1);
        {
            let s2: Arc<dyn Subscriber> = Arc::new(TestSubscriber);
            table.register("a", &s2);
            table.register("b", &s2);
        }

        // s3 was never subscribed anywhere; the stale s2 entries must
        // not make this return true.
        assert!(!table.unregister_all(&s3));
        assert_eq!(table.find("a").len(), 1);
    }
}
