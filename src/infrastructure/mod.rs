// Infrastructure layer - External dependencies and adapters
pub mod artifact_store;
pub mod config;
pub mod http_repository;
pub mod http_response;
pub mod pdf;
pub mod render;
