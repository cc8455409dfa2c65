pub mod app;
pub mod config;
pub mod csp;
pub mod error;
pub mod filter;
pub mod handler;
pub mod metadata;
pub mod normalize;
pub mod sink;
