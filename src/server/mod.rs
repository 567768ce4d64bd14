//! Axum-based HTTP server for the imagefx-studio backend.
//!
//! Routes mirror what the browser client already calls: generation (sync and
//! fire-and-poll), prompt helpers, session settings and reference handling,
//! plus `/health` and `/metrics`.
//!
//! # Components
//!
//! - `handlers`: health, state, settings, reference and reset endpoints.
//! - `generation`: generation, prompt-helper and task-poll endpoints.
//! - `middleware`: request-id layers and request metrics.
//! - `routes`: the router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod generation;
mod handlers;
mod middleware;
mod routes;

pub use routes::{create_router, AppState};
