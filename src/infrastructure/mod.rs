// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod elasticsearch_repository;
pub mod file_dashboard_repository;
pub mod http_response;
pub mod memory_dashboard_repository;
