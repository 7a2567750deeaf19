use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// JSON body extractor whose rejections are JSON too, in the same shape as
/// `ApiError` responses.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(json_rejection_response(rejection)),
        }
    }
}

/// Query string extractor with the same JSON error shape as [`AppJson`].
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(rejection) => Err(query_rejection_response(rejection)),
        }
    }
}

fn json_rejection_response(rejection: JsonRejection) -> Response {
    error_response(
        rejection.status(),
        format!("Failed to parse JSON request body: {}", rejection.body_text()),
    )
}

fn query_rejection_response(rejection: QueryRejection) -> Response {
    error_response(
        rejection.status(),
        format!("Invalid query string: {}", rejection.body_text()),
    )
}

fn error_response(status: StatusCode, message: String) -> Response {
    tracing::warn!("{}", message);
    (
        status,
        Json(json!({
            "message": message,
            "status": status.as_u16()
        })),
    )
        .into_response()
}
