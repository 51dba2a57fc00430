//! API Module
//!
//! HTTP handlers and routing for the pNode REST API.
//!
//! # Endpoints
//! - `GET /pnodes` - List all nodes
//! - `GET /pnodes/stats` - Aggregate network statistics
//! - `GET /pnodes/:id` - Get one node
//! - `GET /health` - Health check endpoint
//! - `GET /cache/stats`, `DELETE /cache`, `DELETE /cache/:key` - Cache admin
//!
//! Every route is also served under `/api`.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
