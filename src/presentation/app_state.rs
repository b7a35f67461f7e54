// Application state for HTTP handlers
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::logstash_node_service::LogstashNodeService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dashboard_repository: Arc<dyn DashboardRepository>,
    pub logstash_node_service: LogstashNodeService,
}
