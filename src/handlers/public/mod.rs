// Endpoints reachable without a token: health and token acquisition.
pub mod auth;
pub mod health;

pub use auth::{login, register};
pub use health::health;
