/*!
 * Monitoring
 * Structured logging setup and poll tracing
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, span_poll, PollSpan};
