//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Refresh: re-runs the list chain so the cache and store stay warm

mod refresh;

pub use refresh::spawn_refresh_task;
