//! Leader → in-process broker → follower scenarios.

use std::sync::Arc;
use std::time::Duration;

use platoon::channel::{Channel, MemoryBroker};
use platoon::{Error, Estimator, Follower, Leader, View, WAITING_FOR_DATA};

const TOPIC: &str = "platoon/speed";

async fn pair(broker: &MemoryBroker) -> (Leader, Follower) {
    let follower = Follower::start(Arc::new(broker.connect("follower")), TOPIC)
        .await
        .unwrap();
    let leader = Leader::new(
        Estimator::calibrated().unwrap(),
        Arc::new(broker.connect("leader")),
        TOPIC,
    );
    (leader, follower)
}

/// Wait until the follower has applied `generation` records.
async fn wait_for_generation(follower: &Follower, generation: u64) {
    for _ in 0..100 {
        if follower.state().generation() >= generation {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "follower stuck at generation {}",
        follower.state().generation()
    );
}

#[tokio::test]
async fn test_waiting_before_first_message() {
    let broker = MemoryBroker::new();
    let (_leader, follower) = pair(&broker).await;

    let view = follower.current_view();
    assert_eq!(view.traffic_level, WAITING_FOR_DATA);
    assert_eq!(view.lane_suggestion, WAITING_FOR_DATA);
}

#[tokio::test]
async fn test_light_traffic_stays_in_lane() {
    let broker = MemoryBroker::new();
    let (leader, follower) = pair(&broker).await;

    let record = leader.send(30.0, 35.0).await.unwrap();
    assert_eq!(record.congestion_level().get(), 35);
    wait_for_generation(&follower, 1).await;

    assert_eq!(
        follower.current_view(),
        View {
            traffic_level: "🚦 Traffic Level: 35%".to_string(),
            lane_suggestion: "🚗 Lane Suggestion: Stay".to_string(),
        }
    );
    assert_eq!(follower.state().latest(), Some(record));
}

#[tokio::test]
async fn test_heavy_traffic_goes_right() {
    let broker = MemoryBroker::new();
    let (leader, follower) = pair(&broker).await;

    leader.send(70.0, 15.0).await.unwrap();
    wait_for_generation(&follower, 1).await;

    let view = follower.current_view();
    assert_eq!(view.traffic_level, "🚦 Traffic Level: 90%");
    assert_eq!(view.lane_suggestion, "🚗 Lane Suggestion: Go Right");
}

#[tokio::test]
async fn test_latest_value_wins() {
    let broker = MemoryBroker::new();
    let (leader, follower) = pair(&broker).await;

    leader.send(30.0, 35.0).await.unwrap();
    leader.send(50.0, 25.0).await.unwrap();
    leader.send(80.0, 10.0).await.unwrap();
    wait_for_generation(&follower, 3).await;

    assert_eq!(
        follower.current_view().traffic_level,
        "🚦 Traffic Level: 100%"
    );
}

#[tokio::test]
async fn test_negative_input_not_published() {
    let broker = MemoryBroker::new();
    let (leader, follower) = pair(&broker).await;

    let result = leader.send(-5.0, 10.0).await;
    assert!(matches!(result, Err(Error::InvalidInput { .. })));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(follower.current_view().is_waiting());
    assert_eq!(follower.state().generation(), 0);
}

#[tokio::test]
async fn test_malformed_message_keeps_last_good_value() {
    let broker = MemoryBroker::new();
    let (leader, follower) = pair(&broker).await;
    let rogue = broker.connect("rogue");

    leader.send(30.0, 35.0).await.unwrap();
    wait_for_generation(&follower, 1).await;
    let before = follower.current_view();

    rogue.publish(TOPIC, b"{\"speed\": \"fast\"}".to_vec()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(follower.current_view(), before);
    assert!(follower.state().last_error().is_some());

    // Receiver keeps running after the bad payload
    leader.send(70.0, 15.0).await.unwrap();
    wait_for_generation(&follower, 2).await;
    assert_eq!(
        follower.current_view().lane_suggestion,
        "🚗 Lane Suggestion: Go Right"
    );
}

#[tokio::test]
async fn test_follower_shutdown_freezes_view() {
    let broker = MemoryBroker::new();
    let (leader, follower) = pair(&broker).await;

    leader.send(30.0, 35.0).await.unwrap();
    wait_for_generation(&follower, 1).await;
    follower.shutdown().await;

    leader.send(70.0, 15.0).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!follower.channel().is_connected());
    assert_eq!(
        follower.current_view().traffic_level,
        "🚦 Traffic Level: 35%"
    );
}
