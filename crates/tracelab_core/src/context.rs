//! Trace correlation context threaded through every operation.

use std::fmt;
use tracelab_store::CallContext;
use uuid::Uuid;

/// A 128-bit trace identifier, rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(u128);

impl TraceId {
    /// Generates a random trace id.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().as_u128())
    }

    /// Creates a trace id from its raw value.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// A 64-bit span identifier, rendered as 16 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

impl SpanId {
    /// Generates a random, non-zero span id.
    #[must_use]
    pub fn random() -> Self {
        loop {
            let id = rand::random::<u64>();
            if id != 0 {
                return Self(id);
            }
        }
    }

    /// Creates a span id from its raw value.
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Identifies one span within one trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanContext {
    /// Trace the span belongs to.
    pub trace_id: TraceId,
    /// The span itself.
    pub span_id: SpanId,
}

impl SpanContext {
    /// Starts a new trace.
    #[must_use]
    pub fn root() -> Self {
        Self {
            trace_id: TraceId::random(),
            span_id: SpanId::random(),
        }
    }

    /// Creates a span in the same trace.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: SpanId::random(),
        }
    }
}

/// Per-operation context: the optional active span and the store call
/// context (deadline and cancellation).
#[derive(Debug, Clone, Default)]
pub struct Context {
    span: Option<SpanContext>,
    call: CallContext,
}

impl Context {
    /// A context with no span and no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Replaces the store call context.
    #[must_use]
    pub fn with_call(mut self, call: CallContext) -> Self {
        self.call = call;
        self
    }

    /// Replaces the active span.
    #[must_use]
    pub fn with_span(mut self, span: SpanContext) -> Self {
        self.span = Some(span);
        self
    }

    /// Returns the active span, if any.
    #[must_use]
    pub fn span(&self) -> Option<&SpanContext> {
        self.span.as_ref()
    }

    /// Returns the store call context.
    #[must_use]
    pub fn call(&self) -> &CallContext {
        &self.call
    }

    /// Returns a context for a new span: a child of the active span, or the
    /// root of a new trace when there is none.
    #[must_use]
    pub fn child(&self) -> Self {
        let span = match &self.span {
            Some(parent) => parent.child(),
            None => SpanContext::root(),
        };
        Self {
            span: Some(span),
            call: self.call.clone(),
        }
    }
}
