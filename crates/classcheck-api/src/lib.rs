// classcheck-api: Async Rust client for the ClassCheck attendance service

pub mod attendance;
pub mod auth;
pub mod client;
pub mod error;
pub mod service;
pub mod students;
pub mod transport;
pub mod types;

pub use auth::Credentials;
pub use client::ClassCheckClient;
pub use error::Error;
pub use students::STUDENT_PAGE_SIZE;
pub use transport::{TlsMode, TransportConfig};
