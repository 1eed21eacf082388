//! # TiK API Server Library
//!
//! HTTP surface of the TiK ticket tracker.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error taxonomy and HTTP response mapping
//! - `extract`: Validated request extractors
//! - `guard`: Not-found guard
//! - `logging`: Console and rotating file logs
//! - `middleware`: Session scope layer
//! - `pagination`: Page envelope for list endpoints
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod guard;
pub mod logging;
pub mod middleware;
pub mod pagination;
pub mod routes;
