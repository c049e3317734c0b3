pub mod contract;
pub mod entities;
pub mod errors;
pub mod kind_mapper;
pub mod report;
