//! HTTP request handlers.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::ApiState;
use crate::core::BrokerError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::NoMessage => ApiError::NotFound(err.to_string()),
            BrokerError::TooManyItems => ApiError::TooManyRequests(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::NotFound(_) => debug!("API error: {}", self),
            _ => warn!("API error: {}", self),
        }

        let status = self.status_code();
        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Request and response body of the queue endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDto {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GetParams {
    pub timeout: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    pub name: String,
    pub len: usize,
}

/// `PUT /queue/{name}`
pub async fn put_message(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let dto: MessageDto = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;
    state.manager.put(&name, dto.message).await?;
    Ok(StatusCode::OK)
}

/// `GET /queue/{name}[?timeout=N]`
pub async fn get_message(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Query(params): Query<GetParams>,
) -> Result<Json<MessageDto>, ApiError> {
    let timeout = parse_timeout(params.timeout.as_deref(), state.default_timeout)?;
    let message = state.manager.get(&state.shutdown, &name, timeout).await?;
    Ok(Json(MessageDto { message }))
}

/// `GET /queues`
pub async fn list_queues(State(state): State<ApiState>) -> Json<Vec<QueueInfo>> {
    let queues = state
        .manager
        .list_queues()
        .await
        .into_iter()
        .map(|(name, len)| QueueInfo { name, len })
        .collect();
    Json(queues)
}

pub async fn unsupported_method() -> ApiError {
    ApiError::BadRequest("unsupported method".to_string())
}

pub async fn unknown_route() -> ApiError {
    ApiError::BadRequest("expected /queue/{name}".to_string())
}

/// An absent or empty value means "use the default"; anything else must be a
/// positive whole number of seconds.
fn parse_timeout(raw: Option<&str>, default: Duration) -> Result<Duration, ApiError> {
    match raw {
        None | Some("") => Ok(default),
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ApiError::BadRequest(format!("invalid timeout {raw:?}"))),
        },
    }
}
