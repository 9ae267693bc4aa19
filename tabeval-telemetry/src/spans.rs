//! Span helpers for evaluation runs

use tracing::Span;

/// Span covering one metric's pass over a table.
///
/// # Example
/// ```
/// use tabeval_telemetry::eval_run_span;
/// let span = eval_run_span("Metric 1", 10);
/// let _enter = span.enter();
/// ```
pub fn eval_run_span(metric_label: &str, record_count: usize) -> Span {
    tracing::info_span!("eval.run", metric.label = metric_label, record.count = record_count)
}

/// Span covering a single record's prompt, model call and extraction.
pub fn record_span(index: &str) -> Span {
    tracing::debug_span!("eval.record", record.index = index)
}

/// Span around one judge model call.
pub fn model_call_span(model_name: &str) -> Span {
    tracing::debug_span!("model.call", model.name = model_name)
}
