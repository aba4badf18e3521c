use axum::{
    Router,
    extract::{
        FromRef, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use axum_extra::typed_header::TypedHeaderRejection;
use feedgraph_common::{
    model::{
        Id,
        auth::{AuthTokenDecodeError, AuthTokenHashError},
        comment::CommentMarker,
        post::PostMarker,
        profile::ProfileMarker,
    },
    policy::{FollowError, PolicyError},
};
use feedgraph_db::{DbError, Store};
use json::Json;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

mod auth;
mod json;
mod query;
mod routes;
#[cfg(test)]
mod tests;

pub type ServerRouter = Router<ServerState>;

#[derive(Clone, FromRef)]
pub struct ServerState {
    pub store: Arc<dyn Store>,
}

pub fn routes() -> ServerRouter {
    routes::routes().fallback(fallback)
}

pub async fn fallback(request: Request) -> ServerError {
    ServerError::UnknownRoute(request.into_parts().0.uri)
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown route requested: {0}")]
    UnknownRoute(Uri),
    #[error("Path rejected: {0}")]
    PathRejection(#[from] PathRejection),
    #[error("Query string rejected: {0}")]
    QueryRejection(#[from] QueryRejection),
    #[error("Incoming JSON rejected: {0}")]
    JsonRejection(#[from] JsonRejection),
    #[error("JSON response could not be serialized: {0}")]
    JsonResponse(#[from] serde_json::Error),
    #[error("Authorization header was missing or invalid: {0}")]
    InvalidAuthorizationHeader(TypedHeaderRejection),
    #[error("The provided auth token could not be decoded: {0}")]
    InvalidAuthToken(#[from] AuthTokenDecodeError),
    #[error("The auth token could not be hashed: {0}")]
    AuthTokenHash(#[from] AuthTokenHashError),
    #[error("Provided token was invalid")]
    InvalidToken,
    #[error(transparent)]
    Denied(#[from] PolicyError),
    #[error(transparent)]
    Follow(#[from] FollowError),
    #[error(transparent)]
    Database(#[from] DbError),
    #[error("Profile with id {0} was not found.")]
    ProfileByIdNotFound(Id<ProfileMarker>),
    #[error("Post with id {0} was not found.")]
    PostByIdNotFound(Id<PostMarker>),
    #[error("Comment with id {0} was not found.")]
    CommentByIdNotFound(Id<CommentMarker>),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownRoute(_)
            | ServerError::PathRejection(_)
            | ServerError::ProfileByIdNotFound(_)
            | ServerError::PostByIdNotFound(_)
            | ServerError::CommentByIdNotFound(_)
            | ServerError::Database(DbError::MissingReference(_)) => StatusCode::NOT_FOUND,
            ServerError::InvalidAuthorizationHeader(rejection) if rejection.is_missing() => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::InvalidAuthToken(_) | ServerError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::QueryRejection(_)
            | ServerError::JsonRejection(_)
            | ServerError::InvalidAuthorizationHeader(_)
            | ServerError::Follow(_) => StatusCode::BAD_REQUEST,
            ServerError::Database(err) if err.is_precondition() => StatusCode::BAD_REQUEST,
            ServerError::Denied(_) => StatusCode::FORBIDDEN,
            ServerError::JsonResponse(_)
            | ServerError::Database(_)
            | ServerError::AuthTokenHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable error kind, stable across releases.
    pub fn reason(&self) -> &'static str {
        match self {
            ServerError::Denied(PolicyError::MissingProfile) => "missing_profile",
            ServerError::Follow(_) => "precondition_failed",
            ServerError::Database(err) if err.is_precondition() => "precondition_failed",
            _ => match self.status() {
                StatusCode::NOT_FOUND => "not_found",
                StatusCode::UNAUTHORIZED => "unauthorized",
                StatusCode::BAD_REQUEST => "bad_request",
                StatusCode::FORBIDDEN => "forbidden",
                _ => "internal",
            },
        }
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
struct ErrorResponse {
    status: u16,
    reason: &'static str,
    detail: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = self.reason();

        let detail = if status.is_server_error() {
            error!(error = %self, %status, "Replying with error");
            "Internal server error.".to_owned()
        } else {
            debug!(error = %self, %status, reason, "Rejecting request");
            self.to_string()
        };

        let error_response = ErrorResponse {
            status: status.as_u16(),
            reason,
            detail,
        };
        (status, Json(error_response)).into_response()
    }
}
