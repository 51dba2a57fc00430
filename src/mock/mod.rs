//! Mock Data Module
//!
//! Seeded synthetic network state, served only when no real data is
//! available (or when configured to always be served). Every record it
//! produces carries `metadata.source = "mock"`.

mod generator;

pub use generator::MockGenerator;
