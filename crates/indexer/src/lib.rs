pub mod config;
pub mod ingest;
