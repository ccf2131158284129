//! Byte cache types.
//!
//! The byte cache maps a request to previously fetched bytes; a hit
//! short-circuits the fetch stage of the load pipeline. Pictor defines no
//! storage format of its own.

use crate::*;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::sync::Arc;

/// The byte cache collaborator.
///
/// All methods are invoked off the orchestrator control path, so an
/// implementation may block on disk or database access.
pub trait ByteCache: 'static + Send + Sync + std::fmt::Debug {
    /// Look up stored bytes for a request.
    fn lookup(
        &self,
        request: Arc<ImageRequest>,
    ) -> BoxFuture<'_, PicResult<Option<Bytes>>>;

    /// Store fetched bytes under the request's cache key.
    fn store(
        &self,
        bytes: Bytes,
        request: Arc<ImageRequest>,
    ) -> BoxFuture<'_, PicResult<()>>;

    /// Remove all stored entries.
    fn clear_all(&self) -> BoxFuture<'_, PicResult<()>>;
}

/// Trait object [ByteCache].
pub type DynByteCache = Arc<dyn ByteCache>;

/// A factory for creating ByteCache instances.
pub trait ByteCacheFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut config::Config) -> PicResult<()>;

    /// Construct a ByteCache instance.
    fn create(
        &self,
        builder: Arc<builder::Builder>,
    ) -> BoxFut<'static, PicResult<DynByteCache>>;
}

/// Trait object [ByteCacheFactory].
pub type DynByteCacheFactory = Arc<dyn ByteCacheFactory>;
