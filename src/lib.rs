//! Gale - Event-driven HTTP/1.1 server core
//!
//! Core library for connection handling, request parsing and graceful shutdown.

pub mod config;
pub mod http;
pub mod server;
