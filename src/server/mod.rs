//! HTTP surface over the gateway

pub mod api;
