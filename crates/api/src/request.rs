//! Image request types and request equivalence.

use crate::*;
use std::sync::Arc;
use url::Url;

/// How a decoded image is fitted into a requested target size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ContentMode {
    /// Scale preserving aspect ratio so the whole image fits within the
    /// target size.
    #[default]
    AspectFit,

    /// Scale preserving aspect ratio so the image covers the target size,
    /// cropping the overflow.
    AspectFill,

    /// Scale to the exact target size, ignoring aspect ratio.
    Fill,
}

/// Admission hint carried by a request.
///
/// Stage queues admit work in FIFO order; the priority travels with the
/// request so that policies and transports may act on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Below-normal urgency.
    Low,

    /// The default urgency.
    #[default]
    Normal,

    /// Above-normal urgency.
    High,
}

/// Transport options of a request.
///
/// These affect which bytes a fetch produces and therefore participate in
/// load-equivalence decisions, but not in cache-equivalence decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TransportOptions {
    /// Extra request headers, in insertion order.
    pub headers: Vec<(String, String)>,

    /// Opaque token appended by request-building layers to defeat
    /// intermediary caches.
    pub cache_buster: Option<String>,
}

/// Immutable description of a desired remote image.
///
/// Identity is structural: two requests with equal observable fields are
/// interchangeable for caching and dedup purposes. Logical tasks submitting
/// equal requests still remain independently cancellable, see
/// [TaskId](crate::TaskId).
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// The source address of the image.
    pub address: Url,

    /// The target size in pixels. `None` requests the intrinsic size.
    pub target_size: Option<(u32, u32)>,

    /// How the image is fitted into the target size.
    pub content_mode: ContentMode,

    /// An explicit processing step applied after decoding, if any.
    pub processor: Option<DynImageProcessor>,

    /// Admission hint.
    pub priority: Priority,

    /// Options forwarded to the transport collaborator.
    pub transport_options: TransportOptions,
}

impl ImageRequest {
    /// Construct a request for the image at `address` with default options.
    pub fn new(address: Url) -> Self {
        Self {
            address,
            target_size: None,
            content_mode: ContentMode::default(),
            processor: None,
            priority: Priority::default(),
            transport_options: TransportOptions::default(),
        }
    }

    /// Set the target size in pixels.
    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.target_size = Some((width, height));
        self
    }

    /// Set the content mode.
    pub fn with_content_mode(mut self, content_mode: ContentMode) -> Self {
        self.content_mode = content_mode;
        self
    }

    /// Set the explicit post-decode processing step.
    pub fn with_processor(mut self, processor: DynImageProcessor) -> Self {
        self.processor = Some(processor);
        self
    }

    /// Set the admission hint.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Append a transport request header.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.transport_options
            .headers
            .push((key.to_string(), value.to_string()));
        self
    }

    /// Set the cache-busting token.
    pub fn with_cache_buster(mut self, token: &str) -> Self {
        self.transport_options.cache_buster = Some(token.to_string());
        self
    }
}

impl PartialEq for ImageRequest {
    fn eq(&self, other: &Self) -> bool {
        let processors_eq = match (&self.processor, &other.processor) {
            (None, None) => true,
            (Some(a), Some(b)) => a.is_equivalent(&**b),
            _ => false,
        };
        self.address == other.address
            && self.target_size == other.target_size
            && self.content_mode == other.content_mode
            && self.priority == other.priority
            && self.transport_options == other.transport_options
            && processors_eq
    }
}

impl Eq for ImageRequest {}

/// Pluggable request equivalence and processing policy.
///
/// Both relations must be true equivalence relations: they are used as
/// registry key equality by the orchestrator and by caches.
pub trait RequestPolicy: 'static + Send + Sync + std::fmt::Debug {
    /// `true` if fetching `a` and `b` would produce the same underlying
    /// bytes, so that both can share one fetch.
    fn is_load_equivalent(&self, a: &ImageRequest, b: &ImageRequest) -> bool;

    /// `true` if `a` and `b` would produce the same processed output
    /// image, so that both can share one cached result. This relation is
    /// strictly narrower-or-equal than load-equivalence: every
    /// cache-equivalent pair is also resource-addressable the same way.
    fn is_cache_equivalent(&self, a: &ImageRequest, b: &ImageRequest) -> bool;

    /// The processing step to run for `request` after decoding, if any.
    fn processor_for(&self, request: &ImageRequest)
        -> Option<DynImageProcessor>;
}

/// Trait object [RequestPolicy].
pub type DynRequestPolicy = Arc<dyn RequestPolicy>;

/// Which equivalence relation a [RequestKey] compares under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Keys are equal when their requests can share one fetch.
    Load,

    /// Keys are equal when their requests can share one cached result.
    Cache,
}

/// Registry key deduplicating requests under a policy-defined equivalence.
///
/// Equality is delegated to the owning [RequestPolicy] rather than to raw
/// structural request equality, because irrelevant fields may differ between
/// requests that should still share one fetch.
#[derive(Clone)]
pub struct RequestKey {
    request: Arc<ImageRequest>,
    kind: KeyKind,
    policy: DynRequestPolicy,
}

impl RequestKey {
    /// A key comparing under load-equivalence.
    pub fn load(request: Arc<ImageRequest>, policy: DynRequestPolicy) -> Self {
        Self {
            request,
            kind: KeyKind::Load,
            policy,
        }
    }

    /// A key comparing under cache-equivalence.
    pub fn cache(
        request: Arc<ImageRequest>,
        policy: DynRequestPolicy,
    ) -> Self {
        Self {
            request,
            kind: KeyKind::Cache,
            policy,
        }
    }

    /// The request this key was derived from.
    pub fn request(&self) -> &Arc<ImageRequest> {
        &self.request
    }

    /// The equivalence relation this key compares under.
    pub fn kind(&self) -> KeyKind {
        self.kind
    }
}

impl std::fmt::Debug for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestKey")
            .field("kind", &self.kind)
            .field("address", &self.request.address.as_str())
            .finish()
    }
}

impl PartialEq for RequestKey {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match self.kind {
            KeyKind::Load => {
                self.policy.is_load_equivalent(&self.request, &other.request)
            }
            KeyKind::Cache => self
                .policy
                .is_cache_equivalent(&self.request, &other.request),
        }
    }
}

impl Eq for RequestKey {}

impl std::hash::Hash for RequestKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Every cache-equivalent pair is also addressable the same way, so
        // hashing the address alone is consistent with both equality
        // relations.
        self.request.address.hash(state);
    }
}
