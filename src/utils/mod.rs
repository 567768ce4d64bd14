//! Utility functions and helpers for the imagefx-studio backend.
//!
//! This module provides cross-cutting concerns like structured logging,
//! bearer-token sanitization, and retry logic with backoff.
//!
//! # Submodules
//!
//! - `logging`: Tracing and logging initialization with security filters.
//! - `retry`: Retry mechanism that respects upstream API hints.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
pub mod retry;
