//! A production-ready memory-based byte cache.
//!
//! Stores fetched bytes in an in-memory hash map keyed by the
//! cache-equivalence [RequestKey] of the storing request. Entries are
//! evicted in insertion order once the configured capacity is exceeded.

use bytes::Bytes;
use futures::future::BoxFuture;
use pictor_api::{builder::Builder, config::Config, *};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// MemByteCache configuration types.
mod config {
    use pictor_api::config::ModConfig;

    /// Configuration parameters for [MemByteCacheFactory](super::MemByteCacheFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MemByteCacheConfig {
        /// Maximum number of stored entries before the oldest are
        /// evicted. Default: 256.
        pub max_entries: usize,
    }

    impl Default for MemByteCacheConfig {
        fn default() -> Self {
            Self { max_entries: 256 }
        }
    }

    /// Module-level configuration for MemByteCache.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MemByteCacheModConfig {
        /// MemByteCache configuration.
        pub mem_byte_cache: MemByteCacheConfig,
    }

    impl ModConfig for MemByteCacheModConfig {
        const MODULE_NAME: &'static str = "memByteCache";
    }
}

pub use config::*;

/// A production-ready memory-based byte cache factory.
#[derive(Debug)]
pub struct MemByteCacheFactory {}

impl MemByteCacheFactory {
    /// Construct a new MemByteCacheFactory.
    pub fn create() -> DynByteCacheFactory {
        let out: DynByteCacheFactory = Arc::new(Self {});
        out
    }
}

impl ByteCacheFactory for MemByteCacheFactory {
    fn default_config(&self, config: &mut Config) -> PicResult<()> {
        config.set_module_config(&MemByteCacheModConfig::default())
    }

    fn create(
        &self,
        builder: Arc<Builder>,
    ) -> BoxFut<'static, PicResult<DynByteCache>> {
        Box::pin(async move {
            let config: MemByteCacheModConfig =
                builder.config.get_module_config()?;
            let out: DynByteCache = Arc::new(MemByteCache::new(
                config.mem_byte_cache,
                builder.policy.clone(),
            ));
            Ok(out)
        })
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<RequestKey, Bytes>,
    order: VecDeque<RequestKey>,
}

/// An in-memory byte cache keyed by cache-equivalence.
#[derive(Debug)]
pub struct MemByteCache {
    config: MemByteCacheConfig,
    policy: DynRequestPolicy,
    inner: Mutex<Inner>,
}

impl MemByteCache {
    /// Construct a new MemByteCache deciding entry identity with `policy`.
    pub fn new(config: MemByteCacheConfig, policy: DynRequestPolicy) -> Self {
        Self {
            config,
            policy,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// The number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteCache for MemByteCache {
    fn lookup(
        &self,
        request: Arc<ImageRequest>,
    ) -> BoxFuture<'_, PicResult<Option<Bytes>>> {
        let key = RequestKey::cache(request, self.policy.clone());
        let found = self.inner.lock().unwrap().entries.get(&key).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn store(
        &self,
        bytes: Bytes,
        request: Arc<ImageRequest>,
    ) -> BoxFuture<'_, PicResult<()>> {
        let key = RequestKey::cache(request, self.policy.clone());
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.entries.insert(key.clone(), bytes).is_none() {
                inner.order.push_back(key);
            }
            while inner.order.len() > self.config.max_entries.max(1) {
                if let Some(evicted) = inner.order.pop_front() {
                    inner.entries.remove(&evicted);
                }
            }
        }
        Box::pin(async move { Ok(()) })
    }

    fn clear_all(&self) -> BoxFuture<'_, PicResult<()>> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.entries.clear();
            inner.order.clear();
        }
        Box::pin(async move { Ok(()) })
    }
}
