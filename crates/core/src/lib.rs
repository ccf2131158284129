#![deny(missing_docs)]
//! Pictor remote image load orchestration.

use pictor_api::{builder::Builder, config::Config};

pub mod common;
pub mod factories;

/// Construct a production-ready default builder.
///
/// - `policy` - The default policy is [common::StdRequestPolicy].
/// - `decoder` - The default decoder is [common::StdImageDecoder].
/// - `loader` - The default loader module is [factories::CoreLoaderFactory].
/// - `transport` - The default transport is
///   [factories::ReqwestTransportFactory].
/// - `cache` - The default byte cache is [factories::MemByteCacheFactory].
pub fn default_builder() -> Builder {
    Builder {
        config: Config::default(),
        policy: std::sync::Arc::new(common::StdRequestPolicy),
        decoder: std::sync::Arc::new(common::StdImageDecoder),
        loader: factories::CoreLoaderFactory::create(),
        transport: factories::ReqwestTransportFactory::create(),
        cache: Some(factories::MemByteCacheFactory::create()),
    }
}

/// Construct a builder suitable for hermetic tests: like
/// [default_builder], but with the in-memory
/// [factories::MemTransportFactory] standing in for the network.
pub fn default_test_builder() -> Builder {
    Builder {
        config: Config::default(),
        policy: std::sync::Arc::new(common::StdRequestPolicy),
        decoder: std::sync::Arc::new(common::StdImageDecoder),
        loader: factories::CoreLoaderFactory::create(),
        transport: factories::MemTransportFactory::create(),
        cache: Some(factories::MemByteCacheFactory::create()),
    }
}
