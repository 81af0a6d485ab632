// Library for tests to access modules

pub mod alerts;
pub mod analyzer;
pub mod bounded;
pub mod config;
pub mod detector;
pub mod error;
pub mod heap_repo;
pub mod introspection;
pub mod models;
pub mod profiler;
pub mod routes;
mod sampler;
pub mod store;
pub mod suggestions;
pub mod trend;
pub mod version;
