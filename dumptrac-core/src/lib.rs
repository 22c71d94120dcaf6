//! Core types and reconciliation engine for the dumptrac full-bin tracker.

/// Bundle of ports making up a backend connection.
pub mod backend;
/// Typed commands produced by the presentation layer.
pub mod command;
/// Report creation and clearing.
pub mod lifecycle;
/// Map marker projection and the owned map handle.
pub mod map;
/// In-memory backend for offline use and tests.
pub mod memory;
/// Domain models and identifiers.
pub mod model;
/// Traits describing the backend interfaces.
pub mod ports;
/// Joining reports with bins into the dashboard view.
pub mod reconcile;
/// Bin identity by location.
pub mod registry;
/// High-level service facade used by clients.
pub mod service;
/// Table row projection.
pub mod table;

pub use backend::*;
pub use command::*;
pub use model::*;
pub use ports::*;
pub use service::*;
