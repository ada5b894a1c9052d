use crate::config::ConfigError;
use crate::services::ServiceError;
use crate::tasks::TaskError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Task(TaskError),
    Service(ServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Task(err) => write!(f, "task error: {}", err),
            AppError::Service(err) => write!(f, "service error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Task(err) => Some(err),
            AppError::Service(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Task(TaskError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Task(TaskError::NoHandler(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Task(TaskError::Tenant(_)) => StatusCode::FORBIDDEN,
            AppError::Task(_)
            | AppError::Service(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<TaskError> for AppError {
    fn from(value: TaskError) -> Self {
        Self::Task(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::MessageKind;

    #[test]
    fn task_errors_map_to_client_statuses() {
        let missing = AppError::from(TaskError::NotFound(9)).into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let unhandled =
            AppError::from(TaskError::NoHandler(MessageKind::SyncAccounting)).into_response();
        assert_eq!(unhandled.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let io = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
            .into_response();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
