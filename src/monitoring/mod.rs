/*!
 * Monitoring
 * Structured tracing for collector activity
 */

mod tracer;

pub use tracer::{init_tracing, CollectionSpan, SLOW_COLLECTION};
