//! Plain-text event format with span ids.
//!
//! Each line inside a span carries `[root/current name]`: the id of the
//! outermost span (the `graph_run` of one `ragbot ask`), the id and name of the
//! innermost one. Grepping for the root id collects every line of a run.

use std::fmt;

use tracing_core::{Event, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// `TIMESTAMP LEVEL [root/span name] target: fields`. The bracket is left out
/// for events outside any span, the target when disabled.
#[derive(Debug, Clone, Copy)]
pub struct SpanIdFormat {
    with_target: bool,
}

impl Default for SpanIdFormat {
    fn default() -> Self {
        Self { with_target: true }
    }
}

impl SpanIdFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// The terminal layer drops module paths.
    pub fn with_target(self, with_target: bool) -> Self {
        Self { with_target }
    }
}

impl<S, N> FormatEvent<S, N> for SpanIdFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        SystemTime.format_time(&mut writer)?;
        write!(writer, " {:>5}", meta.level().as_str())?;

        if let Some(span) = ctx.parent_span() {
            let current = span.id().into_u64();
            let root = span
                .scope()
                .from_root()
                .next()
                .map_or(current, |r| r.id().into_u64());
            write!(writer, " [{}/{} {}]", root, current, span.name())?;
        }
        if self.with_target {
            write!(writer, " {}:", meta.target())?;
        }
        write!(writer, " ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
