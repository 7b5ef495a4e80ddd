pub mod app;
pub mod config;
pub mod ingest;
pub mod listener;
pub mod logging;
