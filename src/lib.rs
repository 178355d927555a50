#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`SorterConfig`**: Static cell layout (grab/sensor positions, buffer and column geometry, target sequences)
//! - **`Geometry`**: Resolves buffer slots and column layers to workspace coordinates
//! - **`InventoryLedger`**: Per-color buffer occupancy and per-column layer counts
//! - **`PlacementScheduler`**: Places a block directly or stashes it, then flushes buffers into columns
//! - **`CompletionTracker`**: Detects finished units and resets for the next one
//! - **`SortController`**: Runs the wait, pick, classify, place, flush loop for one arm
//! - **`ArmAdapter`**: Trait to implement for your arm, gripper and sensors
//! - **`TimeSource`**: Trait to implement for your timing system
//!
//! Coordinates are `f32` millimeters. Raw color readings are `Srgb<u16>` and
//! are classified by their strongest channel.

#[macro_use]
mod fmt;

pub mod colors;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod ledger;
pub mod motion;
pub mod scheduler;
pub mod time;
pub mod tracker;
pub mod types;

pub use colors::classify;
pub use config::{ConfigBuilder, ConfigError, ResetPolicy, ResetTrigger, SorterConfig, TargetSequence, WaitPolicy};
pub use controller::{CycleReport, SortController};
pub use error::CycleError;
pub use geometry::{BUFFER_TRAY_DEPTH, Geometry};
pub use ledger::{InventoryLedger, LedgerError};
pub use motion::{ArmAdapter, MotionStager, transit_waypoints};
pub use scheduler::PlacementScheduler;
pub use time::{TimeDuration, TimeInstant, TimeSource};
pub use tracker::{CompletionTracker, TrackerState};
pub use types::{BlockColor, Decision, Placement, Point3, Transfer};
