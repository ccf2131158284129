//! Load orchestration types.

use crate::*;
use image::DynamicImage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-unique identity of one logical load task.
///
/// Identity is per submission, not per request content: two identical
/// requests submitted by two callers get distinct ids and remain
/// independently cancellable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocate the next process-unique task id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Callback sink receiving progress and terminal completion for load tasks.
///
/// The orchestrator guarantees that no event is ever delivered for a task
/// without an active state entry: a cancelled task receives neither
/// progress nor completion, and completion is delivered at most once.
pub trait LoadSink: 'static + Send + Sync + std::fmt::Debug {
    /// Byte-level fetch progress for a task. Two tasks attached to the
    /// same underlying fetch receive updates in the same relative order.
    fn on_progress(&self, task: TaskId, complete: u64, total: Option<u64>);

    /// Terminal completion for a task: the final processed image, or the
    /// error that ended the pipeline.
    fn on_complete(&self, task: TaskId, result: PicResult<DynamicImage>);
}

/// Trait object [LoadSink].
pub type DynLoadSink = Arc<dyn LoadSink>;

/// One caller-visible unit of work.
#[derive(Debug, Clone)]
pub struct LoadTask {
    /// Unique per submission.
    pub id: TaskId,

    /// The requested resource.
    pub request: Arc<ImageRequest>,

    /// Where progress and completion for this task are delivered.
    pub sink: DynLoadSink,
}

impl LoadTask {
    /// Construct a task with a fresh [TaskId].
    pub fn new(request: ImageRequest, sink: DynLoadSink) -> Self {
        Self {
            id: TaskId::next(),
            request: Arc::new(request),
            sink,
        }
    }
}

/// Trait for implementing the load orchestration engine.
///
/// The engine deduplicates load-equivalent in-flight requests onto a single
/// underlying fetch, drives each fetch through a cache lookup → fetch →
/// decode → process pipeline, and fans progress and completion out to every
/// attached task.
pub trait Loader: 'static + Send + Sync + std::fmt::Debug {
    /// Begin the load pipeline for a task. Idempotent per task id while
    /// the task is live. Never blocks the caller on stage work; all stage
    /// entry is asynchronous.
    fn submit(&self, task: LoadTask) -> BoxFut<'_, PicResult<()>>;

    /// Cancel a task. The task's state entry is removed synchronously with
    /// this call taking effect on the control path; in-flight stage work
    /// is cancelled cooperatively. Safe to call repeatedly or after
    /// natural completion, in which case it is a no-op.
    fn cancel(&self, task: TaskId);

    /// Propagate invalidation to the transport collaborator. In-flight
    /// tasks are unaffected.
    fn invalidate(&self);

    /// Propagate cache clearing to the cache and transport collaborators.
    fn clear_cache(&self) -> BoxFut<'_, PicResult<()>>;
}

/// Trait object [Loader].
pub type DynLoader = Arc<dyn Loader>;

/// A factory for creating Loader instances.
pub trait LoaderFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut config::Config) -> PicResult<()>;

    /// Construct a Loader instance over the given collaborators. Passing
    /// no cache disables the cache lookup stage entirely.
    fn create(
        &self,
        builder: Arc<builder::Builder>,
        transport: DynTransport,
        cache: Option<DynByteCache>,
    ) -> BoxFut<'static, PicResult<DynLoader>>;
}

/// Trait object [LoaderFactory].
pub type DynLoaderFactory = Arc<dyn LoaderFactory>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn task_ids_are_unique_per_submission() {
        let a = TaskId::next();
        let b = TaskId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn task_id_display() {
        let id = TaskId::next();
        assert!(id.to_string().starts_with("task-"));
    }
}
