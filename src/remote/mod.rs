//! Remote repository client: a thin typed wrapper over the hosted store.
//!
//! - `client` — the `RemoteRepository` trait and its PostgREST implementation
//! - `records` — snake_case row shapes and domain translation
//! - `error` — the structured failure taxonomy

pub mod client;
pub mod error;
pub mod records;

pub use client::{RemoteRepository, RestRemote};
pub use error::{ErrorClass, RemoteError};
