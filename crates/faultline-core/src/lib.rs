//! Faultline Core - Domain types shared by the capture and delivery crates
//!
//! This crate contains:
//! - **Domain types** - `Thread`, `Stacktrace`, `DeliveryOutcome`, `DeliveryParams`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//! - **Observer bus** - synchronous fan-out of `StateEvent`s to registered listeners
//!
//! Nothing in this crate performs I/O on its own except configuration loading.

pub mod config;
pub mod domain;
pub mod observer;

pub use observer::{ObserverBus, ObserverId, StateEvent};
