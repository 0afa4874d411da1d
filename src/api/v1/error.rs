use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use crate::domain_model::ConflictField;
use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply, reject};

pub async fn recover_error(err: Rejection) -> Result<Response, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiErrorCode::InvalidRequest(e.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else if err.find::<reject::UnsupportedMediaType>().is_some() {
        ApiErrorCode::UnsupportedMediaType
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        ApiErrorCode::PayloadTooLarge
    } else if let Some(e) = err.find::<reject::LengthRequired>() {
        ApiErrorCode::InvalidRequest(e.to_string())
    } else if let Some(e) = err.find::<reject::InvalidHeader>() {
        ApiErrorCode::InvalidRequest(e.to_string())
    } else {
        ApiErrorCode::internal(format!("unhandled rejection: {:?}", err))
    };

    Ok(code.into_response())
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0} already registered")]
    AlreadyExists(ConflictField),
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Request timed out")]
    Timeout,
    #[error("Request canceled")]
    Canceled,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Body must be JSON")]
    UnsupportedMediaType,
    #[error("Body is too large")]
    PayloadTooLarge,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidRequest(_) => "invalid_request",
            ApiErrorCode::AlreadyExists(_) => "already_exists",
            ApiErrorCode::InvalidCredentials => "invalid_credentials",
            ApiErrorCode::MissingToken => "missing_token",
            ApiErrorCode::InvalidToken => "invalid_token",
            ApiErrorCode::Timeout => "timeout",
            ApiErrorCode::Canceled => "canceled",
            ApiErrorCode::NotFound => "not_found",
            ApiErrorCode::MethodNotAllowed => "method_not_allowed",
            ApiErrorCode::UnsupportedMediaType => "unsupported_media_type",
            ApiErrorCode::PayloadTooLarge => "payload_too_large",
            ApiErrorCode::InternalError => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiErrorCode::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiErrorCode::InvalidCredentials
            | ApiErrorCode::MissingToken
            | ApiErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiErrorCode::Canceled => client_closed_request(),
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// 499: the caller is gone, nobody reads the body.
fn client_closed_request() -> StatusCode {
    StatusCode::from_u16(499).unwrap_or(StatusCode::SERVICE_UNAVAILABLE)
}

impl Reply for ApiErrorCode {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiErrorCode::Canceled = self {
            debug!("request canceled, sending no body");
            return warp::reply::with_status(warp::reply(), status).into_response();
        }
        let json = warp::reply::json(&ApiResponse::<()>::err(self.code(), self.to_string()));
        warp::reply::with_status(json, status).into_response()
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::AlreadyExists(field) => ApiErrorCode::AlreadyExists(field),
            AuthError::NotFound | AuthError::InvalidCredentials => {
                ApiErrorCode::InvalidCredentials
            }
            AuthError::InvalidToken | AuthError::TokenExpired => ApiErrorCode::InvalidToken,
            AuthError::Canceled => ApiErrorCode::Canceled,
            AuthError::DeadlineExceeded => ApiErrorCode::Timeout,
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}
