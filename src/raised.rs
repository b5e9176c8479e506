//! The raised-error object and its trace bookkeeping.
//!
//! A [`RaisedError`] carries three trace-related fields with deliberately
//! asymmetric lifetimes:
//!
//! - `local_trace`: the opaque handle attached by an unwind engine, valid
//!   only inside the execution context that produced it;
//! - `cached_trace_text`: a memoized rendering of `local_trace`, set only by
//!   explicit render-and-cache operations, never by ordinary reads;
//! - `imported_trace_text`: the accumulated text of earlier propagation
//!   legs. Once non-empty it is only ever extended at the tail.
//!
//! The derivation rule in [`trace_text`](RaisedError::trace_text) prefers
//! the cached text, and re-renders the local trace freshly on every call
//! when no cache exists. That fallback branch is intentionally not memoized.

use core::fmt;

use triomphe::Arc;

use crate::{
    DiagnosticPayload, LocalTrace,
    hook_lock::StateLock,
    render,
};

/// The dispatch fields of one raised error, mutated as a unit.
#[derive(Default)]
pub(crate) struct DispatchFields {
    pub(crate) local_trace: Option<LocalTrace>,
    pub(crate) cached_trace_text: Option<String>,
    pub(crate) imported_trace_text: String,
    pub(crate) payload: Option<DiagnosticPayload>,
    pub(crate) raise_ip: usize,
}

impl DispatchFields {
    /// The full rendering of the trace fields as they stand right now.
    ///
    /// With a cached rendering: `imported + cached`. Without one but with a
    /// local trace: `imported + render(local)`, computed freshly on every
    /// call. With neither: the imported text alone.
    pub(crate) fn rendered(&self) -> String {
        if let Some(cached) = &self.cached_trace_text {
            let mut out =
                String::with_capacity(self.imported_trace_text.len() + cached.len());
            out.push_str(&self.imported_trace_text);
            out.push_str(cached);
            out
        } else if let Some(trace) = &self.local_trace {
            let mut out = self.imported_trace_text.clone();
            out.push_str(&render::render_trace(trace));
            out
        } else {
            self.imported_trace_text.clone()
        }
    }
}

/// A throwable entity carrying diagnostic metadata.
///
/// The message and cause are fixed at construction; the trace-related fields
/// have interior mutability because the same instance may be observed,
/// captured, and restored from several threads while it propagates.
///
/// # Examples
///
/// ```
/// use redispatch::{FrameRecord, LocalTrace, RaisedError};
///
/// let error = RaisedError::new("connection reset");
/// error.attach_local_trace(LocalTrace::new(vec![FrameRecord::new("read_frame")]));
/// assert_eq!(error.trace_text(), "   at read_frame");
/// ```
pub struct RaisedError {
    message: Option<String>,
    cause: Option<Arc<RaisedError>>,
    shareable: bool,
    state: StateLock<DispatchFields>,
}

impl RaisedError {
    /// Creates an error with a message and no cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::build(Some(message.into()), None, false)
    }

    /// Creates an error caused by an earlier one.
    ///
    /// The cause chain is acyclic by construction: a cause must exist
    /// before the error that references it, so no cycle detection is needed
    /// anywhere in the crate.
    #[must_use]
    pub fn with_cause(message: impl Into<String>, cause: Arc<RaisedError>) -> Self {
        Self::build(Some(message.into()), Some(cause), false)
    }

    /// Creates a shareable, pre-allocated instance.
    ///
    /// Shareable instances are meant to be allocated up front and raised
    /// from anywhere (the out-of-memory pattern), so they never carry
    /// per-raise-site state: every mutating operation on them, including
    /// [`DispatchSnapshot::restore_onto`](crate::DispatchSnapshot::restore_onto),
    /// is a silent no-op.
    #[must_use]
    pub fn preallocated(message: impl Into<String>) -> Self {
        Self::build(Some(message.into()), None, true)
    }

    pub(crate) fn from_decoded(
        message: Option<String>,
        fields: DispatchFields,
    ) -> Self {
        Self {
            message,
            cause: None,
            shareable: false,
            state: StateLock::new(fields),
        }
    }

    fn build(
        message: Option<String>,
        cause: Option<Arc<RaisedError>>,
        shareable: bool,
    ) -> Self {
        Self {
            message,
            cause,
            shareable,
            state: StateLock::new(DispatchFields::default()),
        }
    }

    /// The message this error was constructed with.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The earlier error that caused this one, if any.
    pub fn cause(&self) -> Option<&RaisedError> {
        self.cause.as_deref()
    }

    /// Whether this is a shareable, pre-allocated instance.
    pub fn is_shareable(&self) -> bool {
        self.shareable
    }

    /// Attaches captured call-frame data, replacing any previous handle.
    ///
    /// This is the unwind engine's entry point, called when the engine first
    /// observes the error in flight, and again after a re-raise. A memoized
    /// rendering from an earlier explicit cache operation is kept: the
    /// derivation rule keeps preferring it until something clears it.
    pub fn attach_local_trace(&self, trace: LocalTrace) {
        if self.shareable {
            return;
        }
        self.state.write().local_trace = Some(trace);
    }

    /// Attaches crash-report correlation data.
    pub fn attach_payload(&self, payload: DiagnosticPayload) {
        if self.shareable {
            return;
        }
        self.state.write().payload = Some(payload);
    }

    /// Records the raise-site instruction-pointer correlation value.
    ///
    /// The value is context-local; the transfer codec zeroes it on decode.
    pub fn record_raise_ip(&self, ip: usize) {
        if self.shareable {
            return;
        }
        self.state.write().raise_ip = ip;
    }

    /// Derives the full textual trace for this error.
    ///
    /// Returns `imported + cached` when a memoized rendering exists,
    /// `imported + render(local_trace)` when only a live handle exists
    /// (re-rendered freshly on every call), and the imported text alone
    /// otherwise. Never mutates the error.
    ///
    /// Relative to a concurrent restore this may observe either the pre- or
    /// the post-restore field set; both are internally consistent.
    #[must_use]
    pub fn trace_text(&self) -> String {
        self.state.read().rendered()
    }

    /// Renders the local trace and memoizes the result.
    ///
    /// No-op when a memoized rendering already exists or when there is no
    /// local trace. This is the only path that sets the cache; ordinary
    /// [`trace_text`](Self::trace_text) reads never do.
    pub fn cache_trace_text(&self) {
        if self.shareable {
            return;
        }
        let mut state = self.state.write();
        let text = match (&state.cached_trace_text, &state.local_trace) {
            (None, Some(trace)) => render::render_trace(trace),
            _ => return,
        };
        state.cached_trace_text = Some(text);
    }

    /// Folds the current rendering into the imported accumulator before the
    /// same instance is re-raised.
    ///
    /// The accumulator becomes the full current rendering plus a single line
    /// break; since the rendering starts with the old accumulator, existing
    /// content stays at the head and the append-only invariant holds. The
    /// local trace and the memoized rendering are cleared, so a later real
    /// unwind that reattaches a fresh trace renders as
    /// `old_imported + "\n" + new_local_render`.
    ///
    /// No-op when the current rendering is empty.
    pub fn preserve_trace(&self) {
        if self.shareable {
            return;
        }
        let mut state = self.state.write();
        let mut rendered = state.rendered();
        if rendered.is_empty() {
            return;
        }
        rendered.push('\n');
        state.imported_trace_text = rendered;
        state.local_trace = None;
        state.cached_trace_text = None;
        tracing::trace!("folded trace into imported accumulator before re-raise");
    }

    /// The accumulated trace text imported from earlier propagation legs.
    #[must_use]
    pub fn imported_trace_text(&self) -> String {
        self.state.read().imported_trace_text.clone()
    }

    /// The memoized rendering of the local trace, if one has been cached.
    #[must_use]
    pub fn cached_trace_text(&self) -> Option<String> {
        self.state.read().cached_trace_text.clone()
    }

    /// Whether a context-local trace handle is currently attached.
    pub fn has_local_trace(&self) -> bool {
        self.state.read().local_trace.is_some()
    }

    /// The exception code of the attached payload, if any.
    pub fn payload_code(&self) -> Option<u32> {
        self.state.read().payload.as_ref().map(DiagnosticPayload::code)
    }

    /// The recorded raise-site correlation value, zero when unset.
    pub fn raise_ip(&self) -> usize {
        self.state.read().raise_ip
    }

    pub(crate) fn state(&self) -> &StateLock<DispatchFields> {
        &self.state
    }

    pub(crate) fn clear_cached_trace_text(&self) {
        self.state.write().cached_trace_text = None;
    }
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => f.write_str("raised error"),
        }
    }
}

impl fmt::Debug for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("RaisedError")
            .field("message", &self.message)
            .field("shareable", &self.shareable)
            .field("has_local_trace", &state.local_trace.is_some())
            .field("cached_trace_text", &state.cached_trace_text)
            .field("imported_trace_text", &state.imported_trace_text)
            .finish_non_exhaustive()
    }
}

impl std::error::Error for RaisedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause().map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}
