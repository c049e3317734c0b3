//! # Diamond ETL
//!
//! Contract-driven validation and upsert loading of baseball statistics
//! (Statcast pitches, MLB box scores) into a layered PostgreSQL warehouse.
//!
//! The crate follows the **Hexagonal Architecture** (Ports and Adapters):
//! `domain` and `engine` hold the pure contract logic, `ports` define the
//! seams, `infrastructure` implements them, and `application` wires a run.

pub mod application;
pub mod builders;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod engine;
pub mod infrastructure;
pub mod ports;
