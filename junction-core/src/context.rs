//! # Call Context
//!
//! The call-scoped value threaded from the transport through every middleware
//! link into handlers that ask for it.
//!
//! The dispatch engine never inspects the context: deadlines, cancellation
//! and extension values are read by middlewares and handlers only.
//!
//! # Example
//!
//! ```rust,ignore
//! let ctx = CallContext::new(PeerInfo::new("ws", "10.0.0.7:51234"))
//!     .with_timeout(Duration::from_secs(5))
//!     .with_value(RequestId(42));
//!
//! assert_eq!(ctx.value::<RequestId>(), Some(&RequestId(42)));
//! ```

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// Information about the connection a call arrived on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerInfo {
    /// Transport name, e.g. `"http"`, `"ws"` or `"ipc"`.
    pub transport: String,
    /// Remote address of the peer, when known.
    pub remote_addr: String,
}

impl PeerInfo {
    /// Create peer information.
    pub fn new(transport: impl Into<String>, remote_addr: impl Into<String>) -> Self {
        Self {
            transport: transport.into(),
            remote_addr: remote_addr.into(),
        }
    }
}

type Extensions = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Call-scoped context.
///
/// Cloning is O(1). Derivation methods (`with_*`) return a new context and
/// leave the original untouched; the cancellation flag is shared between a
/// context and everything derived from it.
#[derive(Clone)]
pub struct CallContext {
    peer: Arc<PeerInfo>,
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
    extensions: Arc<Extensions>,
}

impl CallContext {
    /// Create a context for a call from the given peer.
    pub fn new(peer: PeerInfo) -> Self {
        Self {
            peer: Arc::new(peer),
            deadline: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            extensions: Arc::new(HashMap::new()),
        }
    }

    /// A context with no peer information, deadline or values.
    pub fn background() -> Self {
        Self::new(PeerInfo::default())
    }

    /// Information about the calling peer.
    pub fn peer(&self) -> &PeerInfo {
        &self.peer
    }

    /// Derive a context that expires at `deadline`.
    ///
    /// An existing earlier deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Derive a context that expires after `timeout`.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline. `None` if there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Signal cancellation to everyone holding this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the call was cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Derive a context carrying `value`, replacing any value of the same type.
    pub fn with_value<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        Arc::make_mut(&mut self.extensions).insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    /// Look up a value previously attached with [`with_value`](Self::with_value).
    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("peer", &self.peer)
            .field("deadline", &self.deadline)
            .field("cancelled", &self.cancelled.load(Ordering::Relaxed))
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
