#![doc = "The `todoforge` library crate."]
#![doc = ""]
#![doc = "Server side: domain models, the persistence gateway, credential handling, the"]
#![doc = "access-control middleware, routing configuration and error handling used by the"]
#![doc = "binary (`main.rs`). Client side: a typed HTTP client with session and todo stores."]

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

pub use crate::error::AppError;
