//! Credential lifecycle: the in-memory token state, the refresh exchange and
//! the startup OAuth check.

pub mod credentials;
pub mod manager;
pub mod oauth;

pub use credentials::Credentials;
pub use manager::TokenManager;
