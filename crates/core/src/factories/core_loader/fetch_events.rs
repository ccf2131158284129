use super::{FetchId, LoaderInner};
use pictor_api::*;
use std::sync::Arc;

/// Routes transport events for one underlying fetch back to the loader
/// control path.
///
/// Carries the registry key and fetch id of the fetch it was created for,
/// so every event can be validated against the current registries before
/// any effect is applied. Events for an evicted or overwritten fetch are
/// dropped.
pub(super) struct LoaderFetchEvents {
    pub(super) inner: Arc<LoaderInner>,
    pub(super) key: RequestKey,
    pub(super) fetch_id: FetchId,
}

impl std::fmt::Debug for LoaderFetchEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderFetchEvents")
            .field("key", &self.key)
            .field("fetch_id", &self.fetch_id)
            .finish()
    }
}

impl FetchEvents for LoaderFetchEvents {
    fn on_progress(&self, complete: u64, total: Option<u64>) {
        self.inner
            .fetch_progress(&self.key, self.fetch_id, complete, total);
    }

    fn on_complete(&self, result: PicResult<FetchOutput>) {
        self.inner.fetch_complete(&self.key, self.fetch_id, result);
    }
}
