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

//! Generic router/observer: periodically re-scans `available_topics()`
//! and subscribes to every topic it hasn't seen yet, printing the raw
//! bytes of whatever crosses it. Mirrors a host-side tap that mirrors
//! all broker traffic out to some physical transport, without knowing
//! the payload schema of any one topic ahead of time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::{thread, time::Duration};

use mcp_broker::prelude::*;

struct RawTap;

impl Subscriber for RawTap {
    fn on_message(&self, envelope: &Envelope) {
        let bytes = envelope.payload();
        print!(
            "[router_tx] topic={} sender={} format={} len={} raw=",
            envelope.topic(),
            envelope.sender_id(),
            envelope.format(),
            envelope.size()
        );
        for b in bytes.iter() {
            print!("{b:02X} ");
        }
        println!();
    }
}

fn main() {
    env_logger::init();

    let broker = get_broker();
    let tap: Arc<dyn Subscriber> = Arc::new(RawTap);
    let seen: Mutex<HashSet<String>> = Mutex::new(HashSet::new());

    println!("router_tx started. Watching available_topics() for new publishers...");

    loop {
        for topic in broker.available_topics() {
            let mut seen = seen.lock().unwrap();
            if seen.insert(topic.clone()) {
                broker.subscribe(&topic, &tap);
                println!("[router_tx] now tapping topic {topic}");
            }
        }
        thread::sleep(Duration::from_secs(1));
    }
}
