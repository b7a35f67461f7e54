// Application layer - Use cases and the ports they depend on
pub mod confirmation_prompt;
pub mod dashboard_controller;
pub mod dashboard_repository;
pub mod logstash_node_service;
pub mod monitoring_repository;
