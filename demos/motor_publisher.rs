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

//! Publishes a synthetic motor-state reading to the broker every 10ms,
//! mirroring a module that owns a provider context.

use std::sync::Arc;
use std::{thread, time::Duration};

use mcp_broker::prelude::*;
use serde::{Deserialize, Serialize};

const MOTOR_STATE_TOPIC: &str = "mcp.system/motor.state";
const SENDER_ID: u64 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct MotorState {
    position: f32,
    velocity: f32,
    torque: f32,
}

struct MotorProvider;

impl Provider for MotorProvider {
    fn provided_topics(&self) -> Vec<String> {
        vec![MOTOR_STATE_TOPIC.to_string()]
    }
}

fn main() {
    env_logger::init();

    let broker = get_broker();
    let provider: Arc<dyn Provider> = Arc::new(MotorProvider);
    broker.register_context(MOTOR_STATE_TOPIC, &provider);

    println!("motor_publisher started, publishing on {MOTOR_STATE_TOPIC}");

    let mut angle: f32 = 0.0;
    let mut vel: f32 = 1.0;

    loop {
        angle += 0.1;
        vel += 0.05;

        let state = MotorState {
            position: angle,
            velocity: vel,
            torque: 0.42,
        };

        match MsgpackCodec.create_message(MOTOR_STATE_TOPIC, SENDER_ID, &state) {
            Ok(envelope) => {
                if !broker.publish(envelope) {
                    eprintln!("motor_publisher: publish rejected (queue full?)");
                }
                println!(
                    "Published MotorState: pos={:.3}, vel={:.3}, tq={:.3}",
                    state.position, state.velocity, state.torque
                );
            }
            Err(err) => eprintln!("motor_publisher: encode failed: {err}"),
        }

        thread::sleep(Duration::from_millis(10));
    }
}
