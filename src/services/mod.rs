/// Admin service for dashboard and question management operations.
pub mod admin_service;
/// Account registration, login and token handling.
pub mod auth_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Core game controller driving the live competition.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Standalone quiz listing and grading.
pub mod quiz_service;
/// Storage connection supervisor with degraded-mode handling.
pub mod storage_supervisor;
/// Question image upload handling.
pub mod upload_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
