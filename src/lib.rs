// src/lib.rs

pub mod analytics;
pub mod catalog;
pub mod client;
pub mod config;
pub mod docs;
pub mod error;
pub mod feedback;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod utils;

// Most callers only need the router.
pub use routes::create_router;
