pub mod file_batch_source;
