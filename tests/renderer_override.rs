//! Renderer-override behavior, isolated in its own binary because the
//! installed renderer is process-global.

use redispatch::{
    FrameRecord, LocalTrace, RaisedError, TraceRenderer, install_renderer,
};

struct BareSymbols;

impl TraceRenderer for BareSymbols {
    fn render(&self, trace: &LocalTrace) -> String {
        trace
            .frames()
            .iter()
            .map(|frame| frame.symbol().to_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[test]
fn installed_renderer_drives_derivation_but_not_existing_caches() {
    let cached_early = RaisedError::new("cached before override");
    cached_early.attach_local_trace(LocalTrace::new(vec![FrameRecord::new("early")]));
    cached_early.cache_trace_text();

    install_renderer(BareSymbols);

    let error = RaisedError::new("rendered after override");
    error.attach_local_trace(LocalTrace::new(vec![
        FrameRecord::new("first"),
        FrameRecord::new("second"),
    ]));
    assert_eq!(error.trace_text(), "first\nsecond");

    // A rendering memoized before the override keeps its original form.
    assert_eq!(cached_early.trace_text(), "   at early");
}
