//! Route handlers, grouped by resource.
//!
//! `public` and `token` are unauthenticated; everything else takes an
//! [`crate::auth::Admin`] argument.

pub mod categories;
pub mod media;
pub mod posts;
pub mod public;
pub mod token;
