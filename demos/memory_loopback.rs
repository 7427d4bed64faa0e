//! Example: leader and follower in one process
//!
//! Publishes a few readings through the in-process broker and prints what
//! the follower would display after each one.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example memory_loopback
//! ```

use std::sync::Arc;
use std::time::Duration;

use platoon::channel::MemoryBroker;
use platoon::{confirmation, Estimator, Follower, Leader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let broker = MemoryBroker::new();
    let follower = Follower::start(Arc::new(broker.connect("follower")), "platoon/speed").await?;
    let leader = Leader::new(
        Estimator::calibrated()?,
        Arc::new(broker.connect("leader")),
        "platoon/speed",
    );

    let view = follower.current_view();
    println!("follower: {} | {}", view.traffic_level, view.lane_suggestion);

    for (speed, distance) in [(30.0, 35.0), (45.0, 28.0), (70.0, 15.0), (-5.0, 10.0)] {
        match leader.send(speed, distance).await {
            Ok(record) => println!("leader:   {}", confirmation(&record)),
            Err(e) => println!("leader:   {}", e),
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        let view = follower.current_view();
        println!("follower: {} | {}", view.traffic_level, view.lane_suggestion);
    }

    Ok(())
}
