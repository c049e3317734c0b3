pub mod artifact_port;
pub mod batch_source;
pub mod warehouse_port;
