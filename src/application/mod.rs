pub mod orchestrator;
pub mod runtime;
pub mod transforms;
