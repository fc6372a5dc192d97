pub mod analyzers;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod reporting;
pub mod scoring;
pub mod utils;
