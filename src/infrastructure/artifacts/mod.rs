pub mod ddl_artifact_adapter;
