//! Playground HTTP server
//!
//! Wires the sandbox and the snippet store behind five routes:
//! - `POST /compile` runs a program and returns its timed output events
//! - `POST /fmt` formats a program
//! - `POST /share` stores a snippet and returns its id
//! - `GET /p/{id}` returns a stored snippet
//! - `GET /js/{id}` serves a stored snippet's translation in a host page,
//!   from the artifact tiers when present, otherwise built on demand

pub mod config;
mod error;
mod playground;
mod render;
mod server;

pub use config::{AppConfig, ArtifactConfig, ConfigError, ServerConfig};
pub use error::ApiError;
pub use playground::Playground;
pub use render::render_page;
pub use server::{create_router, start_server, watch_signals};
