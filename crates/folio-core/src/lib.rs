//! Core types and trait definitions for the Folio blog backend.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The publishing rules (status guard, chapter ordering, visit counting) live
//! here so every backend applies them identically.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod category;
pub mod chapter;
pub mod error;
pub mod lifecycle;
pub mod media;
pub mod post;
pub mod store;
pub mod visit;

pub use error::{Error, ErrorKind, Result};
