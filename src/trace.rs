//! Stage spans and count events for the detection pipeline.
//!
//! Every stage opens a span named after the stage and reports how many
//! candidates it produced or kept. With the `tracing` feature both go to the
//! `dogspot` target at info level. Without it the field values are still
//! evaluated, then dropped, and the span is a unit guard.

#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($stage:literal $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info_span!(target: "dogspot", $stage $(, $key = $value)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($stage:literal $(, $key:ident = $value:expr)* $(,)?) => {{
        $(let _ = $value;)*
        $crate::trace::StageGuard
    }};
}

#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($stage:literal $(, $key:ident = $value:expr)+ $(,)?) => {
        tracing::info!(target: "dogspot", stage = $stage $(, $key = $value)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($stage:literal $(, $key:ident = $value:expr)+ $(,)?) => {
        $(let _ = $value;)+
    };
}

pub(crate) use trace_event;
pub(crate) use trace_span;

/// Span guard used when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub struct StageGuard;

#[cfg(not(feature = "tracing"))]
impl StageGuard {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
