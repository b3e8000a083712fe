//! Telemetry capture and delivery engine for Beacon.
//!
//! Buffers events from host producers and delivers them to a collector with:
//! - Durable visitor identity and sliding-expiration sessions
//! - An in-memory buffer plus a capacity-bounded persisted offline queue
//! - Batched delivery, durable backlog first, requeue-to-front on failure
//! - A timer/lifecycle runner that funnels every trigger into one dispatch
//!
//! Telemetry failures never reach the host: `track` and the lifecycle entry
//! points log and absorb storage, delivery and enrichment errors.

pub mod activity;
pub mod buffer;
pub mod config;
pub mod durable_queue;
pub mod engine;
pub mod error;
pub mod event_factory;
pub mod identity;
pub mod producer;
pub mod runtime;
pub mod session;
pub mod transport;
pub mod types;

pub use activity::ActivitySignal;
pub use config::{BeaconConfig, StorageKeys};
pub use engine::TelemetryEngine;
pub use error::{BeaconError, BeaconResult};
pub use event_factory::{MetadataError, MetadataProvider};
pub use producer::{EventSink, Producer};
pub use runtime::{EngineHandle, EngineRunner, create_engine_runtime};
pub use transport::{CollectorTransport, HttpCollector};
pub use types::*;
