pub mod airports;
pub mod analyzers;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod flights;
pub mod loader;
pub mod output;
pub mod source;
