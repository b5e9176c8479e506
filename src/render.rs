//! Rendering of captured traces into human-readable text.
//!
//! The renderer is a collaborator, not part of the capture/restore protocol:
//! it turns a [`LocalTrace`] into text, one frame per line, and that is all.
//! Rendering never mutates the error object and never fails the caller; if a
//! renderer wants to degrade on unresolvable frames, that policy is its own.
//!
//! By default every error renders through [`LineRenderer`]. A process-wide
//! override can be installed with [`install_renderer`], e.g. to match the
//! trace format of an embedding runtime.
//!
//! # Examples
//!
//! ```
//! use redispatch::{FrameRecord, LineRenderer, LocalTrace, TraceRenderer};
//!
//! let trace = LocalTrace::new(vec![
//!     FrameRecord::with_location("load", "src/load.rs", Some(7)),
//!     FrameRecord::new("main"),
//! ]);
//! let text = LineRenderer.render(&trace);
//! assert_eq!(text, "   at load in src/load.rs:7\n   at main");
//! ```

use std::fmt::Write as _;

use crate::{LocalTrace, hook_lock::HookLock};

/// Renders a captured trace into text, one frame per line.
pub trait TraceRenderer: 'static + Send + Sync {
    /// Produces the textual form of `trace`.
    ///
    /// The output must not end with a line break: the preservation logic in
    /// [`RaisedError::preserve_trace`](crate::RaisedError::preserve_trace)
    /// supplies the separator between propagation legs itself.
    fn render(&self, trace: &LocalTrace) -> String;
}

/// The default renderer: `   at symbol in file:line` per frame.
///
/// Frames without a resolved location render as `   at symbol` alone.
#[derive(Copy, Clone, Debug, Default)]
pub struct LineRenderer;

impl TraceRenderer for LineRenderer {
    fn render(&self, trace: &LocalTrace) -> String {
        let mut out = String::new();
        for (i, frame) in trace.frames().iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str("   at ");
            out.push_str(frame.symbol());
            if let Some(file) = frame.file() {
                // Infallible; the write! is only for the formatting.
                let _ = match frame.line() {
                    Some(line) => write!(out, " in {file}:{line}"),
                    None => write!(out, " in {file}"),
                };
            }
        }
        out
    }
}

static RENDERER: HookLock<Box<dyn TraceRenderer>> = HookLock::new();

/// Installs a process-wide renderer override.
///
/// All subsequent trace-text derivations go through `renderer` instead of
/// [`LineRenderer`]. Installing a new renderer replaces the previous
/// override.
///
/// Already-memoized trace text is not re-rendered: a cached rendering always
/// reflects the renderer that was installed at the moment it was cached.
pub fn install_renderer<R>(renderer: R)
where
    R: TraceRenderer,
{
    *RENDERER.write().get() = Some(Box::new(renderer));
}

/// Renders through the installed override, or [`LineRenderer`] if none.
pub(crate) fn render_trace(trace: &LocalTrace) -> String {
    match RENDERER.read().get() {
        Some(renderer) => renderer.render(trace),
        None => LineRenderer.render(trace),
    }
}
