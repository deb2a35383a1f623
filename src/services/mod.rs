/// Admin service for lifecycle, question bank and participant management.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Participant registration and session issuance.
pub mod registration_service;
/// End-of-game ranking and persistence.
pub mod results_service;
/// Session protocol logic shared by connect, resync, answer and finish.
pub mod session_service;
/// Storage supervision with reconnect and degraded mode.
pub mod storage_supervisor;
#[cfg(test)]
pub(crate) mod test_support;
/// WebSocket connection and message handling service.
pub mod websocket_service;
