//! Image decoding types.

use bytes::Bytes;
use image::DynamicImage;
use std::sync::Arc;

/// Decodes fetched bytes into an image.
///
/// Decoding is pure: no shared state mutation is visible to callers. An
/// implementation wrapping a non-reentrant native decoder may rely on the
/// orchestrator's decode stage being serialized (its default concurrency
/// cap is 1) instead of locking internally.
pub trait ImageDecoder: 'static + Send + Sync + std::fmt::Debug {
    /// Decode bytes into an image. `None` means the bytes were not
    /// decodable.
    fn decode(&self, bytes: Bytes) -> Option<DynamicImage>;
}

/// Trait object [ImageDecoder].
pub type DynImageDecoder = Arc<dyn ImageDecoder>;
