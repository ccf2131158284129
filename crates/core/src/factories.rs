//! Factories for generating instances of pictor modules.

pub mod core_loader;
pub use core_loader::CoreLoaderFactory;

pub mod mem_transport;
pub use mem_transport::*;

pub mod mem_byte_cache;
pub use mem_byte_cache::*;

pub mod reqwest_transport;
pub use reqwest_transport::*;
