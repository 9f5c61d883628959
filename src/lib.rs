pub mod cli;
pub mod config;
pub mod data;
pub mod handlers;
pub mod mode;
pub mod prefix;
pub mod render;
pub mod search;
pub mod server;
pub mod settings;
pub mod state;
pub mod stats;
pub mod translations;

pub use config::{ConfigError, LaunchOptions, Mode, RunConfiguration};
pub use server::{build_app, build_router, prepare, start_server};
pub use state::{AppState, MetadataDirs};
