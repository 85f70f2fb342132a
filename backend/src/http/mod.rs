//! axum HTTP server.
//!
//! ```text
//! router.rs   ─ routes, CORS, gzip, tracing, body limit
//! handlers.rs ─ query parsing, DTO mapping
//!      │
//! services / db::services ─ heatmap, audit recorder, access log
//!      │
//! repository (local │ postgres)
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
