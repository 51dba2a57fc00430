//! pNode Monitor - analytics backend for a storage-node network
//!
//! Fetches node status from the network's pRPC API, caches it with a TTL,
//! persists it and serves it over REST, falling back to persisted and then
//! synthetic data when the API is unreachable.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod mock;
pub mod models;
pub mod service;
pub mod store;
pub mod tasks;
pub mod upstream;

pub use api::AppState;
pub use config::Config;
pub use service::NodeService;
pub use tasks::spawn_refresh_task;
