use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::CommonError;
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Kubernetes error: {0}")]
    Kubernetes(#[from] kube::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Status code for the response; API errors keep the cluster's code
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Kubernetes(kube::Error::Api(resp)) => {
                StatusCode::from_u16(resp.code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Kubernetes(_) => StatusCode::BAD_GATEWAY,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<CommonError> for ApiError {
    fn from(err: CommonError) -> Self {
        ApiError::InvalidInput(err.to_string())
    }
}
