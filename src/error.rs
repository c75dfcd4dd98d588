//! Error taxonomy: fatal configuration errors vs. per-request client errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors that prevent the server from starting at all. Always fatal;
/// `main` logs the message and exits with status 1.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid map configuration: {0}")]
    InvalidMap(String),
    #[error("duplicate map id {0}")]
    DuplicateMap(String),
}

/// Errors returned to HTTP clients. Each variant carries its own status
/// code and JSON `{code, message}` envelope.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Bad request")]
    BadRequest,
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Invalid method")]
    InvalidMethod { allow: &'static str },
    #[error("Authorization header is missing")]
    InvalidToken,
    #[error("Player token has not been found")]
    UnknownToken,
    #[error("Map not found")]
    MapNotFound,
    #[error("file not found")]
    FileNotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl ClientError {
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::BadRequest => "badRequest",
            ClientError::InvalidArgument(_) => "invalidArgument",
            ClientError::InvalidMethod { .. } => "invalidMethod",
            ClientError::InvalidToken => "invalidToken",
            ClientError::UnknownToken => "unknownToken",
            ClientError::MapNotFound => "mapNotFound",
            ClientError::FileNotFound => "fileNotFound",
            ClientError::Internal(_) => "internalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ClientError::BadRequest => StatusCode::BAD_REQUEST,
            ClientError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ClientError::InvalidMethod { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ClientError::InvalidToken => StatusCode::UNAUTHORIZED,
            ClientError::UnknownToken => StatusCode::UNAUTHORIZED,
            ClientError::MapNotFound => StatusCode::NOT_FOUND,
            ClientError::FileNotFound => StatusCode::NOT_FOUND,
            ClientError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let body = ErrorBody {
            code: self.code(),
            message: &message,
        };
        let status = self.status();
        let mut response = (status, Json(body)).into_response();
        if let ClientError::InvalidMethod { allow } = self {
            response
                .headers_mut()
                .insert("Allow", allow.parse().expect("static allow header is valid"));
        }
        response
    }
}
