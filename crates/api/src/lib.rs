#![deny(missing_docs)]
//! Pictor API contains the pictor module traits and the basic types required
//! to define the api of those traits.
//!
//! Pictor coordinates loading, caching, decoding and processing of
//! remotely-fetched images on behalf of many concurrent logical requests.
//! This crate only defines the contracts between the load orchestration
//! engine and its collaborators. If you want to use pictor itself, please
//! see the pictor_core crate.

/// Boxed future type.
pub type BoxFut<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub mod builder;
pub mod config;

mod error;
pub use error::*;

mod processor;
pub use processor::*;

mod decoder;
pub use decoder::*;

mod request;
pub use request::*;

pub mod transport;
pub use transport::*;

mod cache;
pub use cache::*;

mod loader;
pub use loader::*;
