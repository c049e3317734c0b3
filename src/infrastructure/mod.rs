pub mod artifacts;
pub mod memory;
pub mod postgres;
pub mod sources;
