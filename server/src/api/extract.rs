use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection},
        FromRequest, FromRequestParts, OriginalUri, Path, Request,
    },
    http::{request::Parts, StatusCode},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use super::handlers::AppError;

/// `Json` extractor whose rejections use the API error envelope.
///
/// Unparseable bodies are a bad request; well-formed JSON of the wrong
/// shape is unprocessable.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::JsonDataError(e)) => Err(AppError::Unprocessable(e.body_text())),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(AppError::PayloadTooLarge(rejection.body_text()))
            }
            Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
        }
    }
}

/// Raw request body; buffering failures use the API error envelope.
pub struct RawBody(pub Bytes);

impl<S> FromRequest<S> for RawBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Bytes::from_request(req, state)
            .await
            .map(Self)
            .map_err(|rejection: BytesRejection| {
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::PayloadTooLarge(rejection.body_text())
                } else {
                    AppError::BadRequest(rejection.body_text())
                }
            })
    }
}

/// Numeric drink id from the `{id}` path segment. Anything that does not
/// decode to an integer is treated as an absent drink.
pub struct DrinkId(pub i64);

impl<S> FromRequestParts<S> for DrinkId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let id = Path::<String>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Path(raw)| raw.parse().ok());

        match id {
            Some(id) => Ok(Self(id)),
            None => {
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map_or_else(|| parts.uri.to_string(), |original| original.0.to_string());
                Err(AppError::NotFound(uri))
            }
        }
    }
}

/// Parse a raw request body with the same classification as [`JsonBody`].
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        Category::Data => AppError::Unprocessable(e.to_string()),
        Category::Io | Category::Syntax | Category::Eof => AppError::BadRequest(e.to_string()),
    })
}
