//! Builder-related types.

use crate::*;
use std::sync::Arc;

/// The general pictor builder.
/// This contains both configuration and factory instances,
/// allowing construction of runtime module instances.
#[derive(Debug)]
pub struct Builder {
    /// The module configuration to be used when building modules.
    /// This can be loaded from disk or modified before freezing the builder.
    pub config: crate::config::Config,

    /// The [RequestPolicy] deciding request equivalence and the processing
    /// step derived for each request.
    pub policy: DynRequestPolicy,

    /// The [ImageDecoder] used by the decode stage.
    pub decoder: DynImageDecoder,

    /// The [LoaderFactory] to be used for creating [Loader] instances.
    pub loader: DynLoaderFactory,

    /// The [TransportFactory] to be used for creating
    /// [transport::Transport] instances.
    pub transport: DynTransportFactory,

    /// The [ByteCacheFactory] to be used for creating [ByteCache]
    /// instances, if byte caching is enabled. `None` makes loaders skip
    /// the cache lookup stage.
    pub cache: Option<DynByteCacheFactory>,
}

impl Builder {
    /// Construct a default config given the configured module factories.
    /// Note, this should be called before freezing the Builder instance
    /// in an Arc<>.
    pub fn set_default_config(&mut self) -> PicResult<()> {
        let Self {
            config,
            policy: _,
            decoder: _,
            loader,
            transport,
            cache,
        } = self;

        loader.default_config(config)?;
        transport.default_config(config)?;
        if let Some(cache) = cache {
            cache.default_config(config)?;
        }

        Ok(())
    }

    /// Chaining version of [Builder::set_default_config].
    pub fn with_default_config(mut self) -> PicResult<Self> {
        self.set_default_config()?;
        Ok(self)
    }

    /// Freeze the builder so module factories can construct instances
    /// from it.
    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }
}
