/*!
 * Monitoring
 * Structured tracing for supervised runs
 */

mod tracer;

pub use tracer::{generate_run_id, init_tracing, SupervisionSpan};
