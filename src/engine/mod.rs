pub mod alignment;
pub mod batch;
pub mod coercion;
pub mod dedupe;
pub mod enforcement;
pub mod loader;
