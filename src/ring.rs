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

//! Single-producer / single-consumer bounded ring buffer (C3).
//!
//! This is the lock-free hand-off used by a subscriber to move decoded
//! values from the broker's dispatch worker thread to a real-time audio
//! thread without allocation or blocking. Capacity `N` is requested by
//! the caller and the buffer holds exactly `N` live elements; internally
//! it allocates `N + 1` slots and leaves one permanently empty so that
//! `head == tail` is an unambiguous "empty" signal.
//!
//! # Memory ordering
//!
//! The producer publishes a written slot by storing the new `head` with
//! `Release`; the consumer synchronizes with that store by loading
//! `head` with `Acquire`. Symmetrically the consumer publishes a freed
//! slot via a `Release` store to `tail`, observed by the producer's
//! `Acquire` load. `head` and `tail` are wrapped in [`crossbeam_utils::CachePadded`]
//! so the producer's hot cache line and the consumer's hot cache line
//! never collide with each other's writes (false sharing).

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;

#[cfg(not(feature = "loom"))]
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "loom")]
use loom::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

/// Bounded SPSC ring buffer holding up to `N` live elements of type `T`.
///
/// Exactly one thread may call [`SpscRing::push`]; exactly one thread
/// (which must differ from the pusher) may call [`SpscRing::pop`]. The
/// type enforces none of this at the type level — a single shared
/// handle is meant to be reachable from both threads — so callers are
/// responsible for honoring the SPSC discipline, same as any lock-free
/// ring buffer in this family.
pub struct SpscRing<T> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    capacity: usize,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<AtomicUsize>,
}

unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T> SpscRing<T> {
    /// Creates a ring able to hold exactly `capacity` live elements.
    /// `capacity` must be at least 1.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "SpscRing capacity must be >= 1");
        let slots = capacity + 1;
        let mut buffer = Vec::with_capacity(slots);
        buffer.resize_with(slots, || UnsafeCell::new(MaybeUninit::uninit()));

        Self {
            buffer: buffer.into_boxed_slice(),
            capacity,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// The number of live elements the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn slots(&self) -> usize {
        self.buffer.len()
    }

    fn next(&self, index: usize) -> usize {
        let slots = self.slots();
        let next = index + 1;
        if next == slots {
            0
        } else {
            next
        }
    }

    /// Producer-only: attempts to push `value`. Returns `Err(value)` if
    /// the buffer is full, leaving the buffer unchanged.
    pub fn push(&self, value: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let next_head = self.next(head);
        // Acquire: synchronizes with the consumer's Release store to
        // `tail` in `pop`, so we observe every slot it has freed.
        let tail = self.tail.load(Ordering::Acquire);

        if next_head == tail {
            return Err(value);
        }

        // SAFETY: `head` is owned by the producer; no other thread
        // writes to this slot until the consumer has advanced `tail`
        // past it, which (by the `next_head != tail` check above)
        // hasn't happened yet.
        unsafe {
            let slot = self.buffer[head].get();
            (*slot).write(value);
        }

        // Release: publishes the write above so that a consumer doing
        // an Acquire load of `head` observes the slot's contents.
        self.head.store(next_head, Ordering::Release);
        Ok(())
    }

    /// Consumer-only: attempts to pop the oldest element. Returns `None`
    /// if the buffer is empty.
    pub fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);
        // Acquire: synchronizes with the producer's Release store to
        // `head` in `push`, so we observe the slot it just wrote.
        let head = self.head.load(Ordering::Acquire);

        if tail == head {
            return None;
        }

        // SAFETY: `tail` is owned by the consumer; the slot at `tail`
        // was written and published by the producer (head != tail
        // above proves at least one unread element exists), and no
        // other thread reads this slot.
        let value = unsafe {
            let slot = self.buffer[tail].get();
            (*slot).assume_init_read()
        };

        let next_tail = self.next(tail);
        // Release: publishes that this slot is free for the producer
        // to observe via its Acquire load of `tail` in `push`.
        self.tail.store(next_tail, Ordering::Release);
        Some(value)
    }

    /// Best-effort: number of live elements currently held. May be
    /// stale the instant it returns in the presence of a concurrent
    /// push/pop, but never reports an incoherent state (e.g.
    /// simultaneously empty and full).
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        if head >= tail {
            head - tail
        } else {
            self.slots() - tail + head
        }
    }

    /// Best-effort: true iff no element is currently buffered.
    pub fn empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Best-effort: true iff the next `push` would fail.
    pub fn full(&self) -> bool {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        self.next(head) == tail
    }

    /// Resets the buffer to empty. Not concurrency-safe: the caller
    /// must guarantee no other thread is concurrently pushing or
    /// popping.
    pub fn clear(&self) {
        while self.pop().is_some() {}
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        // Drain any elements still buffered so their destructors run.
        while self.pop().is_some() {}
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn empty_buffer_pop_fails() {
        let ring: SpscRing<i32> = SpscRing::new(4);
        assert!(ring.empty());
        assert!(!ring.full());
        assert!(ring.pop().is_none());
    }

    #[test]
    fn capacity_n_holds_exactly_n_elements() {
        let ring: SpscRing<i32> = SpscRing::new(3);
        assert!(ring.push(1).is_ok());
        assert!(ring.push(2).is_ok());
        assert!(ring.push(3).is_ok());
        assert!(ring.full());
        assert!(ring.push(4).is_err());

        assert_eq!(ring.pop(), Some(1));
        assert!(!ring.full());
        assert!(ring.push(4).is_ok());
        assert_eq!(ring.pop(), Some(2));
        assert_eq!(ring.pop(), Some(3));
        assert_eq!(ring.pop(), Some(4));
        assert!(ring.empty());
    }

    #[test]
    fn never_simultaneously_empty_and_full() {
        let ring: SpscRing<i32> = SpscRing::new(1);
        assert!(ring.empty());
        ring.push(10).unwrap();
        assert!(!(ring.empty() && ring.full()));
        assert!(ring.full());
    }

    #[test]
    fn fifo_order_is_preserved_across_threads() {
        const K: i32 = 100_000;
        let ring = Arc::new(SpscRing::<i32>::new(32));

        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 0..K {
                    loop {
                        if ring.push(i).is_ok() {
                            break;
                        }
                        thread::yield_now();
                    }
                }
            })
        };

        let consumer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut received = Vec::with_capacity(K as usize);
                while received.len() < K as usize {
                    if let Some(v) = ring.pop() {
                        received.push(v);
                    } else {
                        thread::yield_now();
                    }
                }
                received
            })
        };

        producer.join().unwrap();
        let received = consumer.join().unwrap();
        let expected: Vec<i32> = (0..K).collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn clear_drops_remaining_elements() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static DROPS: AtomicUsize = AtomicUsize::new(0);
        struct Counted;
        impl Drop for Counted {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        let ring: SpscRing<Counted> = SpscRing::new(4);
        ring.push(Counted).unwrap();
        ring.push(Counted).unwrap();
        ring.clear();
        assert_eq!(DROPS.load(Ordering::SeqCst), 2);
        assert!(ring.empty());
    }
}
