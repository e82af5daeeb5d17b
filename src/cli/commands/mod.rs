pub mod admin;
pub mod health;
pub mod migrate;
pub mod token;
