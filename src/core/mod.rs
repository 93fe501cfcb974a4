//! Core gateway engine module

pub mod cache;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod health;
pub mod models;
pub mod rate_limiter;
