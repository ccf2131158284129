//! Pictor error types.

use std::sync::Arc;

/// A clonable trait-object inner error.
#[derive(Clone, Default)]
pub struct DynInnerError(
    pub Option<Arc<dyn std::error::Error + 'static + Send + Sync>>,
);

impl std::fmt::Debug for DynInnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::fmt::Display for DynInnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_ref() {
            None => f.write_str("None"),
            Some(s) => s.fmt(f),
        }
    }
}

impl std::error::Error for DynInnerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.as_ref().map(|s| {
            let out: &(dyn std::error::Error + 'static) = &**s;
            out
        })
    }
}

impl DynInnerError {
    /// Construct a new DynInnerError from a source error.
    pub fn new<E: std::error::Error + 'static + Send + Sync>(e: E) -> Self {
        Self(Some(Arc::new(e)))
    }
}

/// The core pictor error type. This type is used in all external
/// pictor apis as well as internally in some modules.
///
/// This type is required to implement `Clone`: a single transport failure
/// is delivered to the completion callback of every logical task attached
/// to the failed fetch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PicError {
    /// The transport collaborator failed or aborted an underlying fetch.
    /// Shared verbatim by every logical task attached to that fetch.
    #[error("transport failure: {ctx} (src: {src})")]
    Transport {
        /// Any context associated with this error.
        ctx: Arc<str>,

        /// The inner error (if any).
        #[source]
        src: DynInnerError,
    },

    /// The decoder returned no image for non-empty fetched bytes.
    #[error("image decoding failed: {ctx}")]
    DecodingFailed {
        /// Any context associated with this error.
        ctx: Arc<str>,
    },

    /// A stage of the processing chain returned no image.
    #[error("image processing failed: {ctx}")]
    ProcessingFailed {
        /// Any context associated with this error.
        ctx: Arc<str>,
    },

    /// Generic pictor internal error.
    #[error("{ctx} (src: {src})")]
    Other {
        /// Any context associated with this error.
        ctx: Arc<str>,

        /// The inner error (if any).
        #[source]
        src: DynInnerError,
    },
}

impl PicError {
    /// Construct a transport error with an inner source error.
    pub fn transport_src<
        C: std::fmt::Display,
        S: std::error::Error + 'static + Send + Sync,
    >(
        ctx: C,
        src: S,
    ) -> Self {
        Self::Transport {
            ctx: ctx.to_string().into_boxed_str().into(),
            src: DynInnerError::new(src),
        }
    }

    /// Construct a transport error.
    pub fn transport<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Transport {
            ctx: ctx.to_string().into_boxed_str().into(),
            src: DynInnerError::default(),
        }
    }

    /// Construct a decoding-failed error.
    pub fn decoding<C: std::fmt::Display>(ctx: C) -> Self {
        Self::DecodingFailed {
            ctx: ctx.to_string().into_boxed_str().into(),
        }
    }

    /// Construct a processing-failed error.
    pub fn processing<C: std::fmt::Display>(ctx: C) -> Self {
        Self::ProcessingFailed {
            ctx: ctx.to_string().into_boxed_str().into(),
        }
    }

    /// Construct an "other" error with an inner source error.
    pub fn other_src<
        C: std::fmt::Display,
        S: std::error::Error + 'static + Send + Sync,
    >(
        ctx: C,
        src: S,
    ) -> Self {
        Self::Other {
            ctx: ctx.to_string().into_boxed_str().into(),
            src: DynInnerError::new(src),
        }
    }

    /// Construct an "other" error.
    pub fn other<C: std::fmt::Display>(ctx: C) -> Self {
        Self::Other {
            ctx: ctx.to_string().into_boxed_str().into(),
            src: DynInnerError::default(),
        }
    }
}

/// The core pictor result type.
pub type PicResult<T> = Result<T, PicError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            "bla (src: None)",
            PicError::other("bla").to_string().as_str(),
        );
        assert_eq!(
            "transport failure: timeout (src: None)",
            PicError::transport("timeout").to_string().as_str(),
        );
        assert_eq!(
            "transport failure: foo (src: bar)",
            PicError::transport_src("foo", std::io::Error::other("bar"))
                .to_string()
                .as_str(),
        );
        assert_eq!(
            "image decoding failed: https://x.test/a.png",
            PicError::decoding("https://x.test/a.png").to_string().as_str(),
        );
        assert_eq!(
            "image processing failed: resize",
            PicError::processing("resize").to_string().as_str(),
        );
    }

    #[test]
    fn error_clone_preserves_source() {
        let err =
            PicError::transport_src("foo", std::io::Error::other("bar"));
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
        assert!(std::error::Error::source(&cloned).is_some());
    }

    #[test]
    fn ensure_pic_error_type_is_send_and_sync() {
        fn ensure<T: std::fmt::Display + Send + Sync>(_t: T) {}
        ensure(PicError::other("bla"));
    }
}
