pub mod connection_manager;
pub mod postgres_warehouse_adapter;
pub mod sql_utils;
