//! CoreLoader is the pictor load orchestration module.
//!
//! It owns the two shared registries of the system and drives every logical
//! task through the cache lookup → fetch → decode → process pipeline,
//! deduplicating load-equivalent in-flight requests onto a single
//! underlying fetch.
//!
//! It consists of multiple parts:
//! - A state object guarding both registries behind one mutex: the table of
//!   live fetches keyed by load-equivalence [RequestKey], and the table of
//!   per-task load states keyed by [TaskId]. All registry mutation and all
//!   state transitions happen under this mutex with negligible hold time;
//!   stage work and sink callbacks always run outside it.
//! - Bounded stage executors for cache lookup, decode and process: FIFO
//!   channels drained by a fixed number of workers each.
//! - A fetch admission queue applying congestion control: its workers each
//!   hold their admission slot until the fetch they started reaches a
//!   terminal event, so new fetches are deferred while the executing count
//!   is at its cap and are released in submission order as slots free.
//! - A fetch event handler per underlying fetch that routes transport
//!   progress/completion back to the state object, validated by registry
//!   key and fetch id so late events for cancelled or evicted fetches are
//!   discarded.
//!
//! ### Cancellation
//!
//! `cancel` removes the task's state entry immediately; that removal is
//! what makes any later callback for the task a no-op. Queued stage jobs
//! die for free at the workers' dequeue-time registry check; a running
//! decode or process job keeps running and its result is discarded. A task
//! in the loading state is detached from its fetch entry; when the last
//! attached task detaches, the underlying fetch handle is cancelled and
//! the entry evicted.

use bytes::Bytes;
use image::DynamicImage;
use pictor_api::{builder, config::Config, *};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

mod fetch_events;
mod stages;

use fetch_events::LoaderFetchEvents;
use stages::{SharedReceiver, StageQueue};

/// CoreLoader configuration types.
pub mod config {
    use pictor_api::config::ModConfig;

    /// Configuration parameters for [CoreLoaderFactory](super::CoreLoaderFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CoreLoaderConfig {
        /// How many cache lookups may run at once. Default: 2.
        pub lookup_workers: usize,

        /// How many decodes may run at once. Default: 1, so that decoding
        /// stays serialized for non-reentrant decoders.
        pub decode_workers: usize,

        /// How many processing steps may run at once. Default: 2.
        pub process_workers: usize,

        /// How many underlying fetches may execute at once. Default: 4.
        pub max_concurrent_fetches: usize,

        /// Whether starting a new fetch is deferred while the executing
        /// count is at [CoreLoaderConfig::max_concurrent_fetches], with
        /// deferred fetches released in submission order as slots free.
        /// When disabled, fetches start immediately on submission.
        /// Default: true.
        pub congestion_control: bool,

        /// Depth of each stage's admission channel. Default: 1024.
        pub stage_channel_depth: usize,
    }

    impl Default for CoreLoaderConfig {
        fn default() -> Self {
            Self {
                lookup_workers: 2,
                decode_workers: 1,
                process_workers: 2,
                max_concurrent_fetches: 4,
                congestion_control: true,
                stage_channel_depth: 1024,
            }
        }
    }

    /// Module-level configuration for CoreLoader.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CoreLoaderModConfig {
        /// CoreLoader configuration.
        pub core_loader: CoreLoaderConfig,
    }

    impl ModConfig for CoreLoaderModConfig {
        const MODULE_NAME: &'static str = "coreLoader";
    }
}

pub use config::*;

/// A production-ready load orchestration module.
#[derive(Debug)]
pub struct CoreLoaderFactory {}

impl CoreLoaderFactory {
    /// Construct a new CoreLoaderFactory.
    pub fn create() -> DynLoaderFactory {
        Arc::new(Self {})
    }
}

impl LoaderFactory for CoreLoaderFactory {
    fn default_config(&self, config: &mut Config) -> PicResult<()> {
        config.set_module_config(&CoreLoaderModConfig::default())
    }

    fn create(
        &self,
        builder: Arc<builder::Builder>,
        transport: DynTransport,
        cache: Option<DynByteCache>,
    ) -> BoxFut<'static, PicResult<DynLoader>> {
        Box::pin(async move {
            let config: CoreLoaderModConfig =
                builder.config.get_module_config()?;
            let out: DynLoader = Arc::new(CoreLoader::new(
                config.core_loader,
                builder.policy.clone(),
                builder.decoder.clone(),
                transport,
                cache,
            ));
            Ok(out)
        })
    }
}

/// Process-unique identity of one underlying fetch. Registry slots can be
/// overwritten by a fresh fetch for the same key; the id lets late events
/// and queued admissions detect that the fetch they belong to is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FetchId(u64);

impl FetchId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// One live underlying fetch, shared by the logical tasks attached to it.
#[derive(Debug)]
struct FetchEntry {
    id: FetchId,
    /// The request the fetch was created for.
    request: Arc<ImageRequest>,
    /// Attached task ids, in attach order.
    attached: Vec<TaskId>,
    /// Last known progress, replayed to late attachers.
    progress: Option<(u64, Option<u64>)>,
    /// The transport's cancellable handle, present once admitted.
    handle: Option<DynFetchHandle>,
    /// Releases the admission slot held for this fetch.
    slot_release: Option<oneshot::Sender<()>>,
}

impl FetchEntry {
    fn new(id: FetchId, request: Arc<ImageRequest>, first: TaskId) -> Self {
        Self {
            id,
            request,
            attached: vec![first],
            progress: None,
            handle: None,
            slot_release: None,
        }
    }
}

/// Pipeline position of one logical task, used to route cancellation.
#[derive(Debug)]
enum LoadState {
    /// Queued or running cache lookup.
    CacheLookup,
    /// Attached to the fetch registered under the key.
    Loading(RequestKey),
    /// Decode of fetched bytes. Decode is never interrupted; a cancelled
    /// task's decode result is discarded instead.
    Decoding,
    /// Post-decode processing.
    Processing,
}

#[derive(Debug)]
struct TaskEntry {
    request: Arc<ImageRequest>,
    sink: DynLoadSink,
    state: LoadState,
}

#[derive(Debug, Default)]
struct State {
    fetches: HashMap<RequestKey, FetchEntry>,
    tasks: HashMap<TaskId, TaskEntry>,
}

type LookupJob = TaskId;
type FetchJob = (RequestKey, FetchId);
type DecodeJob = (TaskId, Bytes);
type ProcessJob = (TaskId, DynamicImage, DynImageProcessor);

/// What a task entering the loading state resulted in.
enum Admission {
    /// A new fetch entry was registered and must be admitted.
    Admit(RequestKey, FetchId),
    /// Attached to an existing fetch; replay its last known progress.
    Attached(Option<(DynLoadSink, u64, Option<u64>)>),
    /// The task was cancelled in the meantime.
    Gone,
}

#[derive(Debug)]
struct LoaderInner {
    config: CoreLoaderConfig,
    policy: DynRequestPolicy,
    decoder: DynImageDecoder,
    transport: DynTransport,
    cache: Option<DynByteCache>,
    state: Mutex<State>,
    lookup_queue: StageQueue<LookupJob>,
    fetch_queue: StageQueue<FetchJob>,
    decode_queue: StageQueue<DecodeJob>,
    process_queue: StageQueue<ProcessJob>,
}

#[derive(Debug)]
struct CoreLoader {
    inner: Arc<LoaderInner>,
    stage_tasks: Vec<JoinHandle<()>>,
}

impl CoreLoader {
    fn new(
        config: CoreLoaderConfig,
        policy: DynRequestPolicy,
        decoder: DynImageDecoder,
        transport: DynTransport,
        cache: Option<DynByteCache>,
    ) -> Self {
        let depth = config.stage_channel_depth;
        let inner = Arc::new(LoaderInner {
            lookup_queue: StageQueue::new(depth),
            fetch_queue: StageQueue::new(depth),
            decode_queue: StageQueue::new(depth),
            process_queue: StageQueue::new(depth),
            config,
            policy,
            decoder,
            transport,
            cache,
            state: Mutex::new(State::default()),
        });

        let mut stage_tasks = Vec::new();
        for _ in 0..inner.config.lookup_workers.max(1) {
            stage_tasks.push(tokio::task::spawn(Self::lookup_task(
                inner.clone(),
                inner.lookup_queue.receiver(),
            )));
        }
        for _ in 0..inner.config.max_concurrent_fetches.max(1) {
            stage_tasks.push(tokio::task::spawn(Self::admission_task(
                inner.clone(),
                inner.fetch_queue.receiver(),
            )));
        }
        for _ in 0..inner.config.decode_workers.max(1) {
            stage_tasks.push(tokio::task::spawn(Self::decode_task(
                inner.clone(),
                inner.decode_queue.receiver(),
            )));
        }
        for _ in 0..inner.config.process_workers.max(1) {
            stage_tasks.push(tokio::task::spawn(Self::process_task(
                inner.clone(),
                inner.process_queue.receiver(),
            )));
        }

        Self { inner, stage_tasks }
    }

    async fn lookup_task(
        inner: Arc<LoaderInner>,
        rx: SharedReceiver<LookupJob>,
    ) {
        while let Some(id) = StageQueue::recv(&rx).await {
            LoaderInner::run_lookup(&inner, id).await;
        }
    }

    async fn admission_task(
        inner: Arc<LoaderInner>,
        rx: SharedReceiver<FetchJob>,
    ) {
        while let Some((key, fetch_id)) = StageQueue::recv(&rx).await {
            if let Some(done) =
                LoaderInner::start_fetch(&inner, key, fetch_id).await
            {
                // Hold this admission slot until the fetch reaches a
                // terminal event.
                let _ = done.await;
            }
        }
    }

    async fn decode_task(
        inner: Arc<LoaderInner>,
        rx: SharedReceiver<DecodeJob>,
    ) {
        while let Some((id, bytes)) = StageQueue::recv(&rx).await {
            inner.run_decode(id, bytes).await;
        }
    }

    async fn process_task(
        inner: Arc<LoaderInner>,
        rx: SharedReceiver<ProcessJob>,
    ) {
        while let Some((id, image, processor)) = StageQueue::recv(&rx).await {
            inner.run_process(id, image, processor).await;
        }
    }
}

impl Loader for CoreLoader {
    fn submit(&self, task: LoadTask) -> BoxFut<'_, PicResult<()>> {
        Box::pin(async move { LoaderInner::submit(&self.inner, task).await })
    }

    fn cancel(&self, task: TaskId) {
        self.inner.cancel(task);
    }

    fn invalidate(&self) {
        self.inner.transport.invalidate();
    }

    fn clear_cache(&self) -> BoxFut<'_, PicResult<()>> {
        Box::pin(async move { self.inner.clear_cache().await })
    }
}

impl Drop for CoreLoader {
    fn drop(&mut self) {
        for t in self.stage_tasks.iter() {
            t.abort();
        }
    }
}

impl LoaderInner {
    async fn submit(inner: &Arc<Self>, task: LoadTask) -> PicResult<()> {
        let LoadTask { id, request, sink } = task;
        {
            let mut guard = inner.state.lock().unwrap();
            // Idempotent per task id while the task is live.
            if guard.tasks.contains_key(&id) {
                return Ok(());
            }
            guard.tasks.insert(
                id,
                TaskEntry {
                    request,
                    sink,
                    state: LoadState::CacheLookup,
                },
            );
        }

        if inner.cache.is_some() {
            if inner.lookup_queue.push(id).await.is_err() {
                tracing::warn!(
                    "could not pass {id} to the cache lookup queue"
                );
                inner.fail_task(id, PicError::other("lookup queue closed"));
            }
        } else {
            Self::enter_loading(inner, id).await;
        }

        Ok(())
    }

    /// Transition a task into the loading state, either attaching it to
    /// the live fetch for its load-equivalence class or registering a new
    /// fetch entry for admission.
    async fn enter_loading(inner: &Arc<Self>, id: TaskId) {
        match inner.begin_loading(id) {
            Admission::Gone => {}
            Admission::Attached(replay) => {
                if let Some((sink, complete, total)) = replay {
                    sink.on_progress(id, complete, total);
                }
            }
            Admission::Admit(key, fetch_id) => {
                if inner.config.congestion_control {
                    if inner
                        .fetch_queue
                        .push((key.clone(), fetch_id))
                        .await
                        .is_err()
                    {
                        tracing::warn!(
                            "could not pass fetch for {key:?} to the admission queue"
                        );
                        inner.fetch_complete(
                            &key,
                            fetch_id,
                            Err(PicError::other("admission queue closed")),
                        );
                    }
                } else {
                    // Congestion control disabled: the fetch starts
                    // immediately and holds no admission slot.
                    let _ = Self::start_fetch(inner, key, fetch_id).await;
                }
            }
        }
    }

    fn begin_loading(&self, id: TaskId) -> Admission {
        let mut guard = self.state.lock().unwrap();
        let State { fetches, tasks } = &mut *guard;
        let Some(task) = tasks.get_mut(&id) else {
            return Admission::Gone;
        };
        let key = RequestKey::load(task.request.clone(), self.policy.clone());
        match fetches.get_mut(&key) {
            Some(entry) => {
                entry.attached.push(id);
                let replay = entry
                    .progress
                    .map(|(complete, total)| {
                        (task.sink.clone(), complete, total)
                    });
                task.state = LoadState::Loading(key);
                Admission::Attached(replay)
            }
            None => {
                let fetch_id = FetchId::next();
                fetches.insert(
                    key.clone(),
                    FetchEntry::new(fetch_id, task.request.clone(), id),
                );
                task.state = LoadState::Loading(key.clone());
                Admission::Admit(key, fetch_id)
            }
        }
    }

    /// Call the transport for a registered fetch entry. Returns the
    /// admission slot receiver, resolved when the fetch reaches a
    /// terminal event, or `None` when the entry is already gone or the
    /// transport refused the fetch.
    async fn start_fetch(
        inner: &Arc<Self>,
        key: RequestKey,
        fetch_id: FetchId,
    ) -> Option<oneshot::Receiver<()>> {
        let request = {
            let guard = inner.state.lock().unwrap();
            match guard.fetches.get(&key) {
                Some(entry) if entry.id == fetch_id => entry.request.clone(),
                // cancelled while awaiting admission
                _ => return None,
            }
        };

        let events: DynFetchEvents = Arc::new(LoaderFetchEvents {
            inner: inner.clone(),
            key: key.clone(),
            fetch_id,
        });
        let handle = match inner.transport.fetch(request, events).await {
            Ok(handle) => handle,
            Err(err) => {
                inner.fetch_complete(&key, fetch_id, Err(err));
                return None;
            }
        };

        let (slot_tx, slot_rx) = oneshot::channel();
        let stale = {
            let mut guard = inner.state.lock().unwrap();
            match guard.fetches.get_mut(&key) {
                Some(entry) if entry.id == fetch_id => {
                    entry.handle = Some(handle.clone());
                    entry.slot_release = Some(slot_tx);
                    false
                }
                // completed or cancelled while the transport was admitting
                _ => true,
            }
        };
        if stale {
            handle.cancel();
            return None;
        }
        Some(slot_rx)
    }

    async fn run_lookup(inner: &Arc<Self>, id: TaskId) {
        let Some(cache) = inner.cache.clone() else {
            return;
        };
        let request = {
            let guard = inner.state.lock().unwrap();
            match guard.tasks.get(&id) {
                Some(task) => task.request.clone(),
                // cancelled while queued
                None => return,
            }
        };

        let found = match cache.lookup(request).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(
                    "cache lookup for {id} failed, treating as miss: {err}"
                );
                None
            }
        };

        match found {
            Some(bytes) => {
                // Cache hit: skip the fetch stage entirely.
                let proceed = {
                    let mut guard = inner.state.lock().unwrap();
                    match guard.tasks.get_mut(&id) {
                        Some(task) => {
                            task.state = LoadState::Decoding;
                            true
                        }
                        None => false,
                    }
                };
                if proceed {
                    inner.enqueue_decode(id, bytes).await;
                }
            }
            None => Self::enter_loading(inner, id).await,
        }
    }

    async fn enqueue_decode(&self, id: TaskId, bytes: Bytes) {
        if self.decode_queue.push((id, bytes)).await.is_err() {
            tracing::warn!("could not pass {id} to the decode queue");
            self.fail_task(id, PicError::other("decode queue closed"));
        }
    }

    /// Progress from the transport, fanned out to every attached task
    /// still registered, in attach order.
    fn fetch_progress(
        &self,
        key: &RequestKey,
        fetch_id: FetchId,
        complete: u64,
        total: Option<u64>,
    ) {
        let sinks = {
            let mut guard = self.state.lock().unwrap();
            let State { fetches, tasks } = &mut *guard;
            let Some(entry) = fetches.get_mut(key) else {
                return;
            };
            if entry.id != fetch_id {
                return;
            }
            entry.progress = Some((complete, total));
            entry
                .attached
                .iter()
                .filter_map(|id| {
                    tasks.get(id).map(|task| (*id, task.sink.clone()))
                })
                .collect::<Vec<_>>()
        };
        for (id, sink) in sinks {
            sink.on_progress(id, complete, total);
        }
    }

    /// Terminal event from the transport (or a local admission failure).
    ///
    /// The fetch entry is evicted before anything else happens: no new
    /// task may attach to a finished fetch. A late attach must trigger a
    /// fresh fetch instead.
    fn fetch_complete(
        &self,
        key: &RequestKey,
        fetch_id: FetchId,
        result: PicResult<FetchOutput>,
    ) {
        let entry = {
            let mut guard = self.state.lock().unwrap();
            let live = guard
                .fetches
                .get(key)
                .map(|entry| entry.id == fetch_id)
                .unwrap_or(false);
            if live {
                guard.fetches.remove(key)
            } else {
                None
            }
        };
        let Some(mut entry) = entry else {
            tracing::debug!(
                "dropping stale terminal fetch event for {key:?}"
            );
            return;
        };

        // Release the admission slot exactly once.
        if let Some(slot) = entry.slot_release.take() {
            let _ = slot.send(());
        }

        match result {
            Ok(output) => self.fetch_succeeded(&entry, output),
            Err(err) => self.deliver_fetch_error(&entry.attached, err),
        }
    }

    fn fetch_succeeded(&self, entry: &FetchEntry, output: FetchOutput) {
        if let Some(cache) = &self.cache {
            // Persist asynchronously, once per distinct cache-equivalence
            // class among the attached tasks; attached tasks may be only
            // load-equivalent and must not share one cache entry.
            let representatives = {
                let guard = self.state.lock().unwrap();
                let mut by_cache_key: HashMap<RequestKey, Arc<ImageRequest>> =
                    HashMap::new();
                for id in &entry.attached {
                    if let Some(task) = guard.tasks.get(id) {
                        by_cache_key
                            .entry(RequestKey::cache(
                                task.request.clone(),
                                self.policy.clone(),
                            ))
                            .or_insert_with(|| task.request.clone());
                    }
                }
                by_cache_key.into_values().collect::<Vec<_>>()
            };
            for request in representatives {
                let cache = cache.clone();
                let bytes = output.bytes.clone();
                tokio::task::spawn(async move {
                    if let Err(err) =
                        cache.store(bytes, request.clone()).await
                    {
                        tracing::warn!(
                            "could not store fetched bytes for {}: {err}",
                            request.address
                        );
                    }
                });
            }
        }

        let to_decode = {
            let mut guard = self.state.lock().unwrap();
            entry
                .attached
                .iter()
                .filter_map(|id| {
                    guard.tasks.get_mut(id).map(|task| {
                        task.state = LoadState::Decoding;
                        *id
                    })
                })
                .collect::<Vec<_>>()
        };
        for id in to_decode {
            if self.decode_queue.try_push((id, output.bytes.clone())).is_err()
            {
                tracing::warn!("could not pass {id} to the decode queue");
                self.fail_task(id, PicError::other("decode queue overflow"));
            }
        }
    }

    /// A fetch failure is shared by every attached task still registered.
    fn deliver_fetch_error(&self, attached: &[TaskId], err: PicError) {
        let done = {
            let mut guard = self.state.lock().unwrap();
            attached
                .iter()
                .filter_map(|id| {
                    guard.tasks.remove(id).map(|task| (*id, task.sink))
                })
                .collect::<Vec<_>>()
        };
        for (id, sink) in done {
            sink.on_complete(id, Err(err.clone()));
        }
    }

    async fn run_decode(&self, id: TaskId, bytes: Bytes) {
        // cancelled while queued: free
        if !self.is_registered(id) {
            return;
        }
        let decoder = self.decoder.clone();
        let decoded =
            match tokio::task::spawn_blocking(move || decoder.decode(bytes))
                .await
            {
                Ok(decoded) => decoded,
                Err(err) => {
                    tracing::warn!("decode for {id} panicked: {err}");
                    None
                }
            };
        self.decode_done(id, decoded).await;
    }

    async fn decode_done(&self, id: TaskId, decoded: Option<DynamicImage>) {
        let Some(decoded) = decoded else {
            let task = self.state.lock().unwrap().tasks.remove(&id);
            if let Some(task) = task {
                let err = PicError::decoding(task.request.address.clone());
                task.sink.on_complete(id, Err(err));
            }
            return;
        };

        // The processing step is derived from the request by the policy.
        let processor = {
            let mut guard = self.state.lock().unwrap();
            let Some(task) = guard.tasks.get_mut(&id) else {
                // cancelled while decoding: the result is discarded
                return;
            };
            match self.policy.processor_for(&task.request) {
                Some(processor) => {
                    task.state = LoadState::Processing;
                    Some(processor)
                }
                None => None,
            }
        };

        match processor {
            Some(processor) => {
                if self
                    .process_queue
                    .push((id, decoded, processor))
                    .await
                    .is_err()
                {
                    tracing::warn!("could not pass {id} to the process queue");
                    self.fail_task(id, PicError::other("process queue closed"));
                }
            }
            None => {
                let task = self.state.lock().unwrap().tasks.remove(&id);
                if let Some(task) = task {
                    task.sink.on_complete(id, Ok(decoded));
                }
            }
        }
    }

    async fn run_process(
        &self,
        id: TaskId,
        image: DynamicImage,
        processor: DynImageProcessor,
    ) {
        // cancelled while queued: free
        if !self.is_registered(id) {
            return;
        }
        let processed = match tokio::task::spawn_blocking(move || {
            processor.process(image)
        })
        .await
        {
            Ok(processed) => processed,
            Err(err) => {
                tracing::warn!("processing for {id} panicked: {err}");
                None
            }
        };

        let task = self.state.lock().unwrap().tasks.remove(&id);
        // cancelled while processing: the result is discarded
        let Some(task) = task else {
            return;
        };
        match processed {
            Some(image) => task.sink.on_complete(id, Ok(image)),
            None => {
                let err = PicError::processing(task.request.address.clone());
                task.sink.on_complete(id, Err(err));
            }
        }
    }

    fn cancel(&self, id: TaskId) {
        let mut cancel_handle = None;
        {
            let mut guard = self.state.lock().unwrap();
            let Some(task) = guard.tasks.remove(&id) else {
                // already finished or cancelled
                return;
            };
            if let LoadState::Loading(key) = task.state {
                let mut evict = false;
                if let Some(entry) = guard.fetches.get_mut(&key) {
                    entry.attached.retain(|attached| *attached != id);
                    evict = entry.attached.is_empty();
                }
                if evict {
                    // Last attached task gone: the fetch itself is
                    // cancelled and its entry evicted.
                    if let Some(mut entry) = guard.fetches.remove(&key) {
                        if let Some(slot) = entry.slot_release.take() {
                            let _ = slot.send(());
                        }
                        cancel_handle = entry.handle.take();
                    }
                }
            }
            // CacheLookup and Processing jobs die at the workers'
            // dequeue-time registry check; Decoding runs to completion and
            // its result is discarded.
        }
        if let Some(handle) = cancel_handle {
            handle.cancel();
        }
    }

    fn fail_task(&self, id: TaskId, err: PicError) {
        let task = self.state.lock().unwrap().tasks.remove(&id);
        if let Some(task) = task {
            task.sink.on_complete(id, Err(err));
        }
    }

    fn is_registered(&self, id: TaskId) -> bool {
        self.state.lock().unwrap().tasks.contains_key(&id)
    }

    async fn clear_cache(&self) -> PicResult<()> {
        if let Some(cache) = &self.cache {
            cache.clear_all().await?;
        }
        self.transport.clear_cache();
        Ok(())
    }
}

#[cfg(test)]
mod test;
