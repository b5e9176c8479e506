//! Context-local call-frame data.
//!
//! A [`LocalTrace`] is the opaque handle an unwind engine attaches to a
//! [`RaisedError`](crate::RaisedError) when it first observes the error in
//! flight. It is modeled as an immutable ordered sequence of frame
//! descriptors, most recent call first. The handle is only meaningful inside
//! the execution context that produced it: the transfer codec in
//! [`transfer`](crate::transfer) never lets one cross a context boundary.
//!
//! There is deliberately no `Clone` implementation. Duplicating a trace is an
//! allocation that can fail under memory pressure, so the only way to copy
//! one is the explicit [`LocalTrace::try_clone`].

use crate::CopyError;

/// A single resolved call frame.
///
/// Symbolization and file/line resolution are the responsibility of whoever
/// produces the trace; this crate only carries the results around.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRecord {
    symbol: String,
    file: Option<String>,
    line: Option<u32>,
}

impl FrameRecord {
    /// Creates a frame with a symbol name and no source location.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            file: None,
            line: None,
        }
    }

    /// Creates a frame with a symbol name and a resolved source location.
    pub fn with_location(
        symbol: impl Into<String>,
        file: impl Into<String>,
        line: Option<u32>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            file: Some(file.into()),
            line,
        }
    }

    /// The demangled symbol name for this frame.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The source file this frame resolved to, if known.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The line number in [`file`](Self::file), if known.
    pub fn line(&self) -> Option<u32> {
        self.line
    }
}

/// Captured call-frame data, exclusively owned by one raised error.
///
/// # Examples
///
/// ```
/// use redispatch::{FrameRecord, LocalTrace};
///
/// let trace = LocalTrace::new(vec![
///     FrameRecord::with_location("parse_config", "src/config.rs", Some(41)),
///     FrameRecord::new("main"),
/// ]);
/// assert_eq!(trace.frames().len(), 2);
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct LocalTrace {
    frames: Vec<FrameRecord>,
}

impl LocalTrace {
    /// Creates a trace from frames ordered most recent call first.
    #[must_use]
    pub fn new(frames: Vec<FrameRecord>) -> Self {
        Self { frames }
    }

    /// The frames of this trace, most recent call first.
    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    /// Returns true when the trace holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Deep-copies the trace into an independently owned handle.
    ///
    /// The copy shares no storage with `self`, so later mutation of the
    /// error object owning `self` cannot retroactively alter it.
    ///
    /// # Errors
    ///
    /// Returns [`CopyError`] when the backing allocation cannot be reserved.
    pub fn try_clone(&self) -> Result<Self, CopyError> {
        let mut frames = Vec::new();
        frames.try_reserve_exact(self.frames.len())?;
        frames.extend(self.frames.iter().cloned());
        Ok(Self { frames })
    }

    /// Captures a trace of the live call stack.
    ///
    /// Frames without a resolvable symbol name are skipped. Returns `None`
    /// when nothing could be resolved, which typically means debug info has
    /// been stripped.
    ///
    /// This stands in for an external unwind engine in applications that do
    /// not have one of their own.
    #[cfg(feature = "backtrace")]
    #[must_use]
    pub fn capture() -> Option<Self> {
        let mut frames = Vec::new();

        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                let Some(sym) = symbol.name() else {
                    return;
                };
                frames.push(FrameRecord {
                    symbol: format!("{sym:#}"),
                    file: symbol.filename().map(|path| path.display().to_string()),
                    line: symbol.lineno(),
                });
            });
            true
        });

        if frames.is_empty() {
            None
        } else {
            Some(Self { frames })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_clone_is_independent() {
        let trace = LocalTrace::new(vec![
            FrameRecord::with_location("alpha", "src/a.rs", Some(10)),
            FrameRecord::new("beta"),
        ]);
        let copy = trace.try_clone().expect("copy should succeed");
        assert_eq!(copy, trace);

        drop(trace);
        assert_eq!(copy.frames()[0].symbol(), "alpha");
        assert_eq!(copy.frames()[0].file(), Some("src/a.rs"));
        assert_eq!(copy.frames()[1].line(), None);
    }

    #[test]
    fn empty_trace_clones_empty() {
        let trace = LocalTrace::new(Vec::new());
        let copy = trace.try_clone().expect("copy should succeed");
        assert!(copy.is_empty());
    }
}
