//! Image processing step types.

use image::DynamicImage;
use std::sync::Arc;

/// A single post-decode image processing step.
///
/// Processing steps are pure: they mutate no shared state visible to
/// callers. They are composable into an ordered [ProcessorChain] where the
/// first failing step short-circuits the remainder and yields no result.
pub trait ImageProcessor: 'static + Send + Sync + std::fmt::Debug {
    /// Apply this step to an image. `None` means the step failed to
    /// produce an image.
    fn process(&self, image: DynamicImage) -> Option<DynamicImage>;

    /// A stable structural identifier for this step. Two steps with equal
    /// identifiers must produce identical output for identical input.
    fn ident(&self) -> String;

    /// Structural equivalence between steps. Used when deciding whether
    /// two requests would produce the same cacheable output.
    fn is_equivalent(&self, other: &dyn ImageProcessor) -> bool {
        self.ident() == other.ident()
    }
}

/// Trait object [ImageProcessor].
pub type DynImageProcessor = Arc<dyn ImageProcessor>;

/// An ordered chain of processing steps.
///
/// Two chains are equivalent iff their components are pairwise equivalent
/// in order, which the identifier concatenation below realizes.
#[derive(Debug, Clone, Default)]
pub struct ProcessorChain {
    steps: Vec<DynImageProcessor>,
}

impl ProcessorChain {
    /// Construct a chain from an ordered list of steps.
    pub fn new(steps: Vec<DynImageProcessor>) -> Self {
        Self { steps }
    }

    /// Append a step to the end of the chain.
    pub fn push(&mut self, step: DynImageProcessor) {
        self.steps.push(step);
    }

    /// The number of steps in the chain.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the chain contains no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl ImageProcessor for ProcessorChain {
    fn process(&self, image: DynamicImage) -> Option<DynamicImage> {
        let mut image = image;
        for step in &self.steps {
            image = step.process(image)?;
        }
        Some(image)
    }

    fn ident(&self) -> String {
        let parts = self
            .steps
            .iter()
            .map(|s| s.ident())
            .collect::<Vec<_>>()
            .join("|");
        format!("chain({parts})")
    }
}
