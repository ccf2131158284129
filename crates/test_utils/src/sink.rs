//! An instrumented [LoadSink] recording every delivery for assertions.

use image::DynamicImage;
use pictor_api::{LoadSink, PicResult, TaskId};
use std::sync::{Arc, Mutex};

/// Records every progress and completion event it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    progress: Mutex<Vec<(TaskId, u64, Option<u64>)>>,
    completions: Mutex<Vec<(TaskId, PicResult<DynamicImage>)>>,
}

impl RecordingSink {
    /// Construct a new recording sink.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All progress events received so far, in delivery order.
    pub fn progress(&self) -> Vec<(TaskId, u64, Option<u64>)> {
        self.progress.lock().unwrap().clone()
    }

    /// Progress events received for one task, in delivery order.
    pub fn progress_for(&self, task: TaskId) -> Vec<(u64, Option<u64>)> {
        self.progress
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| *id == task)
            .map(|(_, complete, total)| (*complete, *total))
            .collect()
    }

    /// Number of completion events received so far.
    pub fn completion_count(&self) -> usize {
        self.completions.lock().unwrap().len()
    }

    /// Task ids of all completions received so far, in delivery order.
    pub fn completed_ids(&self) -> Vec<TaskId> {
        self.completions
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    /// The completion received for one task, if any.
    pub fn completion_for(
        &self,
        task: TaskId,
    ) -> Option<PicResult<DynamicImage>> {
        self.completions
            .lock()
            .unwrap()
            .iter()
            .find(|(id, _)| *id == task)
            .map(|(_, result)| result.clone())
    }
}

impl LoadSink for RecordingSink {
    fn on_progress(&self, task: TaskId, complete: u64, total: Option<u64>) {
        self.progress.lock().unwrap().push((task, complete, total));
    }

    fn on_complete(&self, task: TaskId, result: PicResult<DynamicImage>) {
        self.completions.lock().unwrap().push((task, result));
    }
}
