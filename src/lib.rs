//! Library crate for quiz-rush-back, exposing modules for binaries and integration tests.

/// Runtime configuration loading.
pub mod config;
/// Durable storage layer (models, store trait, MongoDB backend).
pub mod dao;
/// Wire-facing request/response payloads.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP and WebSocket route trees.
pub mod routes;
/// Business logic services.
pub mod services;
/// Shared in-memory application state.
pub mod state;
