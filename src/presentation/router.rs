// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_dashboard, health_check, list_dashboards, logstash_node};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/api/dashboards", get(list_dashboards))
        .route("/api/dashboards/:id", get(get_dashboard))
        .route(
            "/api/monitoring/v1/clusters/:cluster_uuid/logstash/node/:logstash_uuid",
            post(logstash_node),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_repository::DashboardRepository;
    use crate::application::logstash_node_service::LogstashNodeService;
    use crate::application::monitoring_repository::{
        MetricQuery, MonitoringError, MonitoringRepository, MonitoringResult, NodeScope,
    };
    use crate::domain::dashboard::{DashboardConfig, EmbeddableRef, TimeRange};
    use crate::domain::metric_series::MetricBucket;
    use crate::domain::saved_dashboard::SavedDashboard;
    use crate::infrastructure::config::MonitoringSettings;
    use crate::infrastructure::file_dashboard_repository::FileDashboardRepository;
    use crate::infrastructure::memory_dashboard_repository::InMemoryDashboardRepository;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::Duration;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct StubMonitoring {
        forbidden: bool,
    }

    #[async_trait]
    impl MonitoringRepository for StubMonitoring {
        async fn search_metric_buckets(
            &self,
            query: &MetricQuery,
        ) -> MonitoringResult<Vec<MetricBucket>> {
            if self.forbidden {
                return Err(MonitoringError::Forbidden);
            }
            let start = query.scope.min.timestamp_millis();
            Ok(vec![MetricBucket::new(start).with_value(query.fields[0].0, 1.0)])
        }

        async fn latest_node_stats(&self, _scope: &NodeScope) -> MonitoringResult<Option<Value>> {
            Ok(Some(json!({
                "timestamp": "2018-05-01T10:00:00Z",
                "logstash_stats": { "logstash": { "uuid": "ls-1" } }
            })))
        }
    }

    async fn test_app(forbidden: bool) -> (Router, Arc<InMemoryDashboardRepository>) {
        let dashboards = Arc::new(InMemoryDashboardRepository::new());
        let mut config = DashboardConfig::empty(TimeRange::last(Duration::minutes(15)));
        config.title = "Dashboard View Edit Test".to_string();
        config.add_panel(EmbeddableRef::visualization("area"));
        dashboards
            .save(SavedDashboard::from_config("dash-1".to_string(), &config))
            .await
            .unwrap();

        (app_with(dashboards.clone(), forbidden), dashboards)
    }

    fn app_with(dashboards: Arc<dyn DashboardRepository>, forbidden: bool) -> Router {
        let service = LogstashNodeService::new(
            Arc::new(StubMonitoring { forbidden }),
            MonitoringSettings::default(),
        );
        create_router(Arc::new(AppState {
            dashboard_repository: dashboards,
            logstash_node_service: service,
        }))
    }

    fn node_request(body: Value) -> Request<Body> {
        Request::post("/api/monitoring/v1/clusters/cluster-1/logstash/node/ls-1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let (app, _) = test_app(false).await;
        let response = app
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logstash_node_route() {
        let (app, _) = test_app(false).await;
        let response = app
            .oneshot(node_request(json!({
                "timeRange": { "min": "2018-05-01T10:00:00Z", "max": 1525172400000i64 },
                "is_advanced": false
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["metrics"]["logstash_node_cpu_metric"].is_array());
        assert_eq!(json["nodeSummary"]["uuid"], "ls-1");
        assert_eq!(json["nodeSummary"]["availability"], false);
    }

    #[tokio::test]
    async fn test_logstash_node_route_validation() {
        let bodies = [
            json!({ "timeRange": { "min": "2018-05-01T10:00:00Z" }, "is_advanced": false }),
            json!({ "timeRange": { "min": 0, "max": 1 } }),
            json!({ "timeRange": { "min": "yesterday", "max": 1 }, "is_advanced": true }),
            json!({ "timeRange": { "min": 0, "max": 1 }, "is_advanced": true, "extra": 1 }),
            json!({ "timeRange": { "min": 10, "max": 1 }, "is_advanced": true }),
        ];

        for body in bodies {
            let (app, _) = test_app(false).await;
            let response = app.oneshot(node_request(body.clone())).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(body_json(response).await["statusCode"], 400);
        }
    }

    #[tokio::test]
    async fn test_logstash_node_route_backend_failure() {
        let (app, _) = test_app(true).await;
        let response = app
            .oneshot(node_request(json!({
                "ccs": "remote",
                "timeRange": { "min": 0, "max": 3_600_000 },
                "is_advanced": true
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["error"], "Forbidden");
    }

    #[tokio::test]
    async fn test_dashboard_listing_and_lookup() {
        let (app, _) = test_app(false).await;

        let response = app
            .clone()
            .oneshot(Request::get("/api/dashboards?search=view").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listing = body_json(response).await;
        assert_eq!(listing[0]["id"], "dash-1");

        let response = app
            .clone()
            .oneshot(Request::get("/api/dashboards/dash-1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["panels"].as_array().unwrap().len(), 1);

        let response = app
            .oneshot(Request::get("/api/dashboards/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unstorable_dashboard_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let dashboards = FileDashboardRepository::open(dir.path()).await.unwrap();
        let app = app_with(Arc::new(dashboards), false);

        let response = app
            .oneshot(Request::get("/api/dashboards/..%2Fsecrets").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["statusCode"], 404);
    }

    #[tokio::test]
    async fn test_brotli_when_accepted() {
        let (app, _) = test_app(false).await;
        let response = app
            .oneshot(
                Request::get("/api/dashboards")
                    .header(header::ACCEPT_ENCODING, "br")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "br");
    }
}
