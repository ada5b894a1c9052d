use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::manager::{TaskError, TaskManager};
use super::message::Message;
use super::task::TaskView;
use crate::tenancy::{Actor, Company, CompanyId, OrganizationId, UserId};

pub const USER_HEADER: &str = "x-user-id";
pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const COMPANY_HEADER: &str = "x-company-id";

/// Router exposing task dispatch and status endpoints.
pub fn task_router(manager: Arc<TaskManager>) -> Router {
    Router::new()
        .route("/api/v1/tasks", post(dispatch_handler).get(list_handler))
        .route("/api/v1/tasks/:task_id", get(status_handler))
        .with_state(manager)
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ActorRejection {
    MissingUser,
    Invalid(&'static str),
    CompanyWithoutOrganization,
}

impl IntoResponse for ActorRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingUser => (
                StatusCode::UNAUTHORIZED,
                format!("missing {USER_HEADER} header"),
            ),
            Self::Invalid(header) => (
                StatusCode::BAD_REQUEST,
                format!("{header} must be a positive integer"),
            ),
            Self::CompanyWithoutOrganization => (
                StatusCode::BAD_REQUEST,
                format!("{COMPANY_HEADER} requires {ORGANIZATION_HEADER}"),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn header_id(headers: &HeaderMap, name: &'static str) -> Result<Option<u64>, ActorRejection> {
    let Some(raw) = headers.get(name) else {
        return Ok(None);
    };
    raw.to_str()
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|id| *id > 0)
        .map(Some)
        .ok_or(ActorRejection::Invalid(name))
}

/// Identity arrives from the authenticating proxy as plain headers.
pub(crate) fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ActorRejection> {
    let user = header_id(headers, USER_HEADER)?.ok_or(ActorRejection::MissingUser)?;
    let organization = header_id(headers, ORGANIZATION_HEADER)?.map(OrganizationId);
    let company = match header_id(headers, COMPANY_HEADER)? {
        Some(company) => {
            let organization =
                organization.ok_or(ActorRejection::CompanyWithoutOrganization)?;
            Some(Company {
                id: CompanyId(company),
                organization,
            })
        }
        None => None,
    };

    Ok(Actor {
        user: UserId(user),
        organization,
        company,
    })
}

fn error_response(err: TaskError) -> Response {
    let status = match &err {
        TaskError::NotFound(_) => StatusCode::NOT_FOUND,
        TaskError::NoHandler(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TaskError::QueueUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        TaskError::Tenant(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

pub(crate) async fn dispatch_handler(
    State(manager): State<Arc<TaskManager>>,
    headers: HeaderMap,
    payload: Result<Json<Message>, JsonRejection>,
) -> Response {
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection.into_response(),
    };
    let message = match payload {
        Ok(Json(message)) => message,
        Err(rejection) => {
            return (
                rejection.status(),
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response()
        }
    };

    match manager.dispatch(&actor, message) {
        Ok(task) => (StatusCode::ACCEPTED, Json(task.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_handler(
    State(manager): State<Arc<TaskManager>>,
    headers: HeaderMap,
) -> Response {
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection.into_response(),
    };

    match manager.list(&actor) {
        Ok(tasks) => {
            let views: Vec<TaskView> = tasks.iter().map(|task| task.view()).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler(
    State(manager): State<Arc<TaskManager>>,
    headers: HeaderMap,
    Path(task_id): Path<u64>,
) -> Response {
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(rejection) => return rejection.into_response(),
    };

    match manager.get(&actor, task_id) {
        Ok(task) => (StatusCode::OK, Json(task.view())).into_response(),
        Err(err) => error_response(err),
    }
}
