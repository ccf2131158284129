//! Default collaborator implementations shared across pictor modules.

use bytes::Bytes;
use image::imageops::FilterType;
use image::DynamicImage;
use pictor_api::*;
use std::sync::Arc;

/// The default structural [RequestPolicy].
///
/// Two requests are load-equivalent when their fetch would produce the
/// same bytes: same address and same transport options. Two requests are
/// cache-equivalent when they would produce the same processed output:
/// same address, same target size and content mode, and pairwise
/// equivalent processing steps.
#[derive(Debug)]
pub struct StdRequestPolicy;

impl RequestPolicy for StdRequestPolicy {
    fn is_load_equivalent(&self, a: &ImageRequest, b: &ImageRequest) -> bool {
        a.address == b.address && a.transport_options == b.transport_options
    }

    fn is_cache_equivalent(&self, a: &ImageRequest, b: &ImageRequest) -> bool {
        a.address == b.address
            && a.target_size == b.target_size
            && a.content_mode == b.content_mode
            && processors_equivalent(a.processor.as_ref(), b.processor.as_ref())
    }

    fn processor_for(
        &self,
        request: &ImageRequest,
    ) -> Option<DynImageProcessor> {
        let resize = request.target_size.map(|(width, height)| {
            let out: DynImageProcessor = Arc::new(ResizeProcessor::new(
                width,
                height,
                request.content_mode,
            ));
            out
        });
        match (resize, request.processor.clone()) {
            (None, None) => None,
            (Some(resize), None) => Some(resize),
            (None, Some(explicit)) => Some(explicit),
            (Some(resize), Some(explicit)) => {
                Some(Arc::new(ProcessorChain::new(vec![resize, explicit])))
            }
        }
    }
}

fn processors_equivalent(
    a: Option<&DynImageProcessor>,
    b: Option<&DynImageProcessor>,
) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.is_equivalent(&**b),
        _ => false,
    }
}

/// The default decoder, delegating to the image crate's format
/// auto-detection.
#[derive(Debug)]
pub struct StdImageDecoder;

impl ImageDecoder for StdImageDecoder {
    fn decode(&self, bytes: Bytes) -> Option<DynamicImage> {
        if bytes.is_empty() {
            return None;
        }
        image::load_from_memory(&bytes).ok()
    }
}

/// A processing step fitting an image into a target size under a
/// [ContentMode].
#[derive(Debug, Clone)]
pub struct ResizeProcessor {
    width: u32,
    height: u32,
    mode: ContentMode,
}

impl ResizeProcessor {
    /// Construct a resize step for the given target size and mode.
    pub fn new(width: u32, height: u32, mode: ContentMode) -> Self {
        Self {
            width,
            height,
            mode,
        }
    }
}

impl ImageProcessor for ResizeProcessor {
    fn process(&self, image: DynamicImage) -> Option<DynamicImage> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(match self.mode {
            ContentMode::AspectFit => {
                image.resize(self.width, self.height, FilterType::Triangle)
            }
            ContentMode::AspectFill => image.resize_to_fill(
                self.width,
                self.height,
                FilterType::Triangle,
            ),
            ContentMode::Fill => image.resize_exact(
                self.width,
                self.height,
                FilterType::Triangle,
            ),
        })
    }

    fn ident(&self) -> String {
        format!("resize:{}x{}:{:?}", self.width, self.height, self.mode)
    }
}
