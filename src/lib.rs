//! translate-proxy: a local HTTP proxy in front of Yandex Cloud Translate.
//!
//! The library holds everything the binary wires together; integration tests
//! in `tests/` drive it through the same entry points.

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod prompt;
pub mod proxy;
pub mod resolver;
pub mod startup;
pub mod store;
pub mod translator;

/// Shared application state passed to handlers.
pub struct AppState {
    pub translator: translator::Translator,
}
