//! A production-ready memory-based transport.
//!
//! Serves fetches from an in-memory table of seeded payloads, reporting
//! progress in a configurable number of chunks. It stands in for the
//! network in hermetic pipelines and is the transport used by
//! [default_test_builder](crate::default_test_builder).

use bytes::Bytes;
use pictor_api::{builder::Builder, config::Config, *};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// MemTransport configuration types.
mod config {
    use pictor_api::config::ModConfig;

    /// Configuration parameters for [MemTransportFactory](super::MemTransportFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MemTransportConfig {
        /// Number of progress events emitted per successful fetch.
        /// Default: 2.
        pub progress_chunks: u32,

        /// Artificial delay between progress events in ms, to keep a
        /// fetch observably in flight. Default: 0.
        pub chunk_delay_ms: u64,
    }

    impl Default for MemTransportConfig {
        fn default() -> Self {
            Self {
                progress_chunks: 2,
                chunk_delay_ms: 0,
            }
        }
    }

    /// Module-level configuration for MemTransport.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MemTransportModConfig {
        /// MemTransport configuration.
        pub mem_transport: MemTransportConfig,
    }

    impl ModConfig for MemTransportModConfig {
        const MODULE_NAME: &'static str = "memTransport";
    }
}

pub use config::*;

/// A production-ready memory-based transport factory.
#[derive(Debug)]
pub struct MemTransportFactory {}

impl MemTransportFactory {
    /// Construct a new MemTransportFactory.
    pub fn create() -> DynTransportFactory {
        let out: DynTransportFactory = Arc::new(Self {});
        out
    }
}

impl TransportFactory for MemTransportFactory {
    fn default_config(&self, config: &mut Config) -> PicResult<()> {
        config.set_module_config(&MemTransportModConfig::default())
    }

    fn create(
        &self,
        builder: Arc<Builder>,
    ) -> BoxFut<'static, PicResult<DynTransport>> {
        Box::pin(async move {
            let config: MemTransportModConfig =
                builder.config.get_module_config()?;
            let out: DynTransport = MemTransport::new(config.mem_transport);
            Ok(out)
        })
    }
}

#[derive(Debug)]
struct Inner {
    seeded: HashMap<Url, PicResult<Bytes>>,
    fetch_count: u64,
    invalidate_count: u64,
    clear_cache_count: u64,
}

/// An in-memory transport serving seeded payloads.
#[derive(Debug)]
pub struct MemTransport {
    config: MemTransportConfig,
    inner: Mutex<Inner>,
}

impl MemTransport {
    /// Construct a new MemTransport.
    pub fn new(config: MemTransportConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            inner: Mutex::new(Inner {
                seeded: HashMap::new(),
                fetch_count: 0,
                invalidate_count: 0,
                clear_cache_count: 0,
            }),
        })
    }

    /// Seed the payload served for fetches of `address`.
    pub fn seed(&self, address: Url, bytes: Bytes) {
        self.inner.lock().unwrap().seeded.insert(address, Ok(bytes));
    }

    /// Seed a terminal error for fetches of `address`.
    pub fn seed_error(&self, address: Url, err: PicError) {
        self.inner.lock().unwrap().seeded.insert(address, Err(err));
    }

    /// How many fetches have been started through this transport.
    pub fn fetch_count(&self) -> u64 {
        self.inner.lock().unwrap().fetch_count
    }

    /// How many times [Transport::invalidate] has been called.
    pub fn invalidate_count(&self) -> u64 {
        self.inner.lock().unwrap().invalidate_count
    }

    /// How many times [Transport::clear_cache] has been called.
    pub fn clear_cache_count(&self) -> u64 {
        self.inner.lock().unwrap().clear_cache_count
    }
}

#[derive(Debug)]
struct MemFetchHandle {
    cancelled: Arc<AtomicBool>,
}

impl FetchHandle for MemFetchHandle {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Transport for MemTransport {
    fn fetch(
        &self,
        request: Arc<ImageRequest>,
        events: DynFetchEvents,
    ) -> BoxFut<'_, PicResult<DynFetchHandle>> {
        Box::pin(async move {
            let outcome = {
                let mut inner = self.inner.lock().unwrap();
                inner.fetch_count += 1;
                inner.seeded.get(&request.address).cloned()
            };

            let cancelled = Arc::new(AtomicBool::new(false));
            let flag = cancelled.clone();
            let chunks = self.config.progress_chunks.max(1) as u64;
            let delay = Duration::from_millis(self.config.chunk_delay_ms);

            tokio::task::spawn(async move {
                let bytes = match outcome {
                    None => {
                        events.on_complete(Err(PicError::transport(format!(
                            "no seeded payload for {}",
                            request.address
                        ))));
                        return;
                    }
                    Some(Err(err)) => {
                        events.on_complete(Err(err));
                        return;
                    }
                    Some(Ok(bytes)) => bytes,
                };
                let total = bytes.len() as u64;
                for chunk in 1..=chunks {
                    // a cancelled fetch emits no further events
                    if flag.load(Ordering::SeqCst) {
                        return;
                    }
                    events.on_progress(total * chunk / chunks, Some(total));
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                if flag.load(Ordering::SeqCst) {
                    return;
                }
                events.on_complete(Ok(FetchOutput { bytes }));
            });

            let out: DynFetchHandle = Arc::new(MemFetchHandle { cancelled });
            Ok(out)
        })
    }

    fn invalidate(&self) {
        self.inner.lock().unwrap().invalidate_count += 1;
    }

    fn clear_cache(&self) {
        self.inner.lock().unwrap().clear_cache_count += 1;
    }
}
