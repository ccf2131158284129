mod congestion;
mod dedup;
mod pipeline;

use super::{CoreLoader, CoreLoaderConfig};
use crate::common::{StdImageDecoder, StdRequestPolicy};
use pictor_api::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Build a loader over explicit collaborators, bypassing the factory.
pub(super) fn make_loader(
    config: CoreLoaderConfig,
    transport: DynTransport,
    cache: Option<DynByteCache>,
) -> CoreLoader {
    CoreLoader::new(
        config,
        Arc::new(StdRequestPolicy),
        Arc::new(StdImageDecoder),
        transport,
        cache,
    )
}

/// A fetch handle counting cancellations.
#[derive(Debug, Default)]
pub(super) struct TestHandle {
    cancels: AtomicU64,
}

impl TestHandle {
    pub(super) fn cancel_count(&self) -> u64 {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl FetchHandle for TestHandle {
    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// A mock transport capturing the events handler of every fetch it is
/// asked to start, so tests can fire transport events at will.
pub(super) fn capturing_transport(
    captured: Arc<Mutex<Vec<DynFetchEvents>>>,
    handle: Arc<TestHandle>,
) -> Arc<transport::MockTransport> {
    let mut mock = transport::MockTransport::new();
    mock.expect_fetch().returning(move |_request, events| {
        captured.lock().unwrap().push(events);
        let handle = handle.clone();
        Box::pin(async move {
            let out: DynFetchHandle = handle;
            Ok(out)
        })
    });
    Arc::new(mock)
}
