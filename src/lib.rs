//! # platoon
//!
//! Leader/follower coordination for a two-vehicle platoon over a pub/sub
//! topic.
//!
//! The leader estimates road congestion from its speed and following
//! distance, picks a lane recommendation and publishes both. The follower
//! subscribes and displays the latest values.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────── leader ────────────┐            ┌────────── follower ──────────┐
//! │ Estimator ──▶ Leader::send ────┼──channel──▶│ Receiver ──▶ DisplayState    │
//! │ (predict, decide_lane)         │  (topic)   │            ▲                 │
//! └────────────────────────────────┘            │   App/ui ──┘ current_view()  │
//!                                               └──────────────────────────────┘
//! ```
//!
//! - **[`estimator`]**: regression model fitted on a calibration table,
//!   lane decision rule, record construction
//! - **[`channel`]**: transport abstraction ([`Channel`], [`MessageHandler`])
//!   with in-process and MQTT implementations
//! - **[`wire`]**: JSON payload encoding
//! - **[`display`]**: the follower's latest-value state and delivery callback
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the follower terminal display
//! - **[`config`]**: layered configuration
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Publish one reading
//! platoon leader --speed 30 --distance 35
//!
//! # Read "speed distance" pairs from stdin
//! platoon leader
//!
//! # Show what the leader publishes
//! platoon follower
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use platoon::channel::MemoryBroker;
//! use platoon::{Estimator, Follower, Leader};
//!
//! # tokio_test::block_on(async {
//! let broker = MemoryBroker::new();
//! let follower = Follower::start(Arc::new(broker.connect("follower")), "platoon/speed")
//!     .await
//!     .unwrap();
//! assert!(follower.current_view().is_waiting());
//!
//! let leader = Leader::new(
//!     Estimator::calibrated().unwrap(),
//!     Arc::new(broker.connect("leader")),
//!     "platoon/speed",
//! );
//! leader.send(70.0, 15.0).await.unwrap();
//! # });
//! ```

pub mod app;
pub mod channel;
pub mod config;
pub mod display;
pub mod error;
pub mod estimator;
pub mod events;
pub mod follower;
pub mod leader;
pub mod ui;
pub mod wire;

pub use channel::{Channel, MemoryBroker, MessageHandler};
#[cfg(feature = "mqtt")]
pub use channel::MqttChannel;
pub use config::PlatoonConfig;
pub use display::{DisplayState, Receiver, View, WAITING_FOR_DATA};
pub use error::{Error, Result};
pub use estimator::{decide_lane, Estimator, LANE_CHANGE_THRESHOLD};
pub use follower::Follower;
pub use leader::{confirmation, Leader};
pub use platoon_types::{CongestionLevel, LaneSuggestion, TelemetryRecord};
