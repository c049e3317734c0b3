pub mod memory_warehouse_adapter;
