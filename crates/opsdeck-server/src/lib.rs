//! HTTP server for opsdeck.
//!
//! Exposes the sandboxed file-access and snapshot services to the
//! browser console as a small REST API.

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
