// Error replies in the `{ statusCode, error, message }` shape
use crate::application::dashboard_controller::ControllerError;
use crate::application::monitoring_repository::MonitoringError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorPayload {
    status_code: u16,
    error: String,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<MonitoringError> for ApiError {
    fn from(err: MonitoringError) -> Self {
        let status = match &err {
            MonitoringError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MonitoringError::Forbidden => StatusCode::FORBIDDEN,
            MonitoringError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            MonitoringError::Backend { .. } | MonitoringError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.to_string())
    }
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        let status = match &err {
            ControllerError::NotFound(_) => StatusCode::NOT_FOUND,
            ControllerError::DuplicateTitle(_) => StatusCode::CONFLICT,
            ControllerError::InvalidTitle => StatusCode::BAD_REQUEST,
            ControllerError::Mode(_) => StatusCode::CONFLICT,
            ControllerError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}", self.message);
        } else {
            tracing::debug!(status = %self.status, "{}", self.message);
        }

        // backend and internal details stay in the log
        let message = match self.status {
            StatusCode::SERVICE_UNAVAILABLE => {
                "Monitoring data is temporarily unavailable".to_string()
            }
            status if status.is_server_error() => "An internal server error occurred".to_string(),
            _ => self.message,
        };

        let payload = ErrorPayload {
            status_code: self.status.as_u16(),
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message,
        };
        (self.status, Json(payload)).into_response()
    }
}

impl IntoResponse for MonitoringError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitoring_error_status_mapping() {
        let cases = [
            (MonitoringError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (MonitoringError::Forbidden, StatusCode::FORBIDDEN),
            (MonitoringError::Unavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                MonitoringError::Backend {
                    status: 404,
                    message: "no index".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[tokio::test]
    async fn test_error_payload_shape() {
        let response = MonitoringError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["statusCode"], 403);
        assert_eq!(json["error"], "Forbidden");
        assert_eq!(json["message"], "Insufficient user permissions for monitoring data");
    }

    #[tokio::test]
    async fn test_server_errors_hide_backend_detail() {
        let errors = [
            MonitoringError::Unavailable("connect error: 10.0.0.7:9200 refused".into()),
            MonitoringError::Backend {
                status: 404,
                message: "index_not_found_exception [.monitoring-x]".into(),
            },
        ];

        for err in errors {
            let response = err.into_response();
            assert!(response.status().is_server_error());

            let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let text = String::from_utf8(body.to_vec()).unwrap();
            assert!(!text.contains("10.0.0.7"), "leaked: {}", text);
            assert!(!text.contains("index_not_found"), "leaked: {}", text);
        }
    }
}
