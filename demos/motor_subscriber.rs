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

//! Subscribes to the motor-state topic and prints every reading it
//! receives, mirroring a module that owns a subscriber context.

use std::sync::Arc;

use mcp_broker::prelude::*;
use serde::{Deserialize, Serialize};

const MOTOR_STATE_TOPIC: &str = "mcp.system/motor.state";

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct MotorState {
    position: f32,
    velocity: f32,
    torque: f32,
}

struct MotorListener;

impl Subscriber for MotorListener {
    fn on_message(&self, envelope: &Envelope) {
        match MsgpackCodec.extract::<MotorState>(envelope) {
            Ok(state) => println!(
                "[motor_subscriber] received: position={:.3}, velocity={:.3}, torque={:.3}",
                state.position, state.velocity, state.torque
            ),
            Err(err) => eprintln!("[motor_subscriber] decode failed: {err}"),
        }
    }
}

fn main() {
    env_logger::init();

    let broker = get_broker();
    let subscriber: Arc<dyn Subscriber> = Arc::new(MotorListener);
    broker.subscribe(MOTOR_STATE_TOPIC, &subscriber);

    println!("motor_subscriber: listening on topic {MOTOR_STATE_TOPIC}");

    loop {
        std::thread::sleep(std::time::Duration::from_secs(1));
    }
}
