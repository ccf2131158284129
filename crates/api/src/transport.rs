//! Pictor transport related types.
//!
//! The transport is the byte-fetching collaborator of the load
//! orchestration engine. Pictor defines no wire protocol of its own; any
//! implementation that honors the event discipline below can be plugged in.

use crate::*;
#[cfg(any(test, feature = "mockall"))]
use mockall::automock;
use std::sync::Arc;

/// The successful output of one underlying fetch.
#[derive(Debug, Clone)]
pub struct FetchOutput {
    /// The fetched payload.
    pub bytes: bytes::Bytes,
}

/// Event sink for one underlying fetch.
///
/// These explicit event payloads replace ad-hoc progress/completion
/// closures: implementations carry enough identity back to the orchestrator
/// control path to be validated against the current registries before any
/// effect is applied.
pub trait FetchEvents: 'static + Send + Sync + std::fmt::Debug {
    /// Byte-level progress. `total` is `None` while the payload length is
    /// unknown. Events for one fetch must be delivered sequentially.
    fn on_progress(&self, complete: u64, total: Option<u64>);

    /// Terminal event. A transport must emit at most one terminal event
    /// per handle; a fetch cancelled through its handle may emit none.
    fn on_complete(&self, result: PicResult<FetchOutput>);
}

/// Trait object [FetchEvents].
pub type DynFetchEvents = Arc<dyn FetchEvents>;

/// Cancellable handle to one underlying fetch.
pub trait FetchHandle: 'static + Send + Sync + std::fmt::Debug {
    /// Request cancellation of the underlying fetch. Idempotent, and a
    /// tolerated no-op after the terminal event has been emitted.
    fn cancel(&self);
}

/// Trait object [FetchHandle].
pub type DynFetchHandle = Arc<dyn FetchHandle>;

/// The byte-fetching transport collaborator.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait Transport: 'static + Send + Sync + std::fmt::Debug {
    /// Begin one underlying fetch for `request`, delivering progress and
    /// exactly one terminal event to `events`. Timeout and retry policy
    /// are transport concerns; the orchestrator applies neither.
    fn fetch(
        &self,
        request: Arc<ImageRequest>,
        events: DynFetchEvents,
    ) -> BoxFut<'_, PicResult<DynFetchHandle>>;

    /// Drop any transport-internal derived state. In-flight fetches are
    /// unaffected.
    fn invalidate(&self);

    /// Clear any transport-level response caches.
    fn clear_cache(&self);
}

/// Trait object [Transport].
pub type DynTransport = Arc<dyn Transport>;

/// A factory for creating Transport instances.
pub trait TransportFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut config::Config) -> PicResult<()>;

    /// Construct a Transport instance.
    fn create(
        &self,
        builder: Arc<builder::Builder>,
    ) -> BoxFut<'static, PicResult<DynTransport>>;
}

/// Trait object [TransportFactory].
pub type DynTransportFactory = Arc<dyn TransportFactory>;
