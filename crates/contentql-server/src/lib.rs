pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use bootstrap::{ContentEngine, init_engine};
pub use config::{AppConfig, LoggingConfig, ServerConfig, StorageConfig};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, ContentqlServer, ServerBuilder, build_app};
