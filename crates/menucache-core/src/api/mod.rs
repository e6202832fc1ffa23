//! Remote menu source.
//!
//! `MenuSource` is the capability the sync coordinator consumes: fetch the
//! current menu and save an edited one. `ApiClient` implements it against
//! the restaurant's REST endpoint.

pub mod client;
pub mod error;
pub mod source;

pub use client::ApiClient;
pub use error::ApiError;
pub use source::MenuSource;
