//! Library crate for quiz-arena-back, exposing modules for binaries and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Persistence traits, models and MongoDB implementations.
pub mod dao;
/// Request, response and WebSocket wire types.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP and WebSocket route trees.
pub mod routes;
/// Business logic services.
pub mod services;
/// Shared in-memory application state.
pub mod state;
