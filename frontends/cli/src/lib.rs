// Library interface for tabula-cli
// Exposes modules for testing and reuse

pub mod config;
pub mod launcher;
pub mod render;

pub use config::CliConfig;
pub use launcher::{load_and_render, run_app, CliArgs};
