//! Async runtime for the door-lock controller.
//!
//! The controller itself is synchronous and single-owner. This crate puts it
//! behind a tokio task that serializes keypad input, admin commands and the
//! 1 Hz clock, and publishes a fresh [`Snapshot`](doorlock_controller::Snapshot)
//! on a watch channel after every change.

pub mod error;
pub mod service;

pub use error::{Result, ServiceError};
pub use service::{Command, LockService, ServiceConfig, ServiceHandle};
