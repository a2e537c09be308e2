use axum::{
    extract::{Extension, OriginalUri, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::extract::{parse_json, DrinkId, JsonBody, RawBody};
use crate::api::models::*;
use crate::auth::Claims;
use crate::db::{DrinkPatch, NewDrink, StoreError};
use crate::state::AppState;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed(Method),
    PayloadTooLarge(String),
    Unprocessable(String),
    Conflict(String),
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateTitle(title) => {
                Self::Conflict(format!("a drink titled {title:?} already exists"))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(_) => "Bad request".to_string(),
            Self::NotFound(url) => format!("resource not found: {url}"),
            Self::MethodNotAllowed(method) => format!("method not allowed: {method}"),
            Self::PayloadTooLarge(_) => "payload too large".to_string(),
            Self::Unprocessable(_) => "unprocessable".to_string(),
            Self::Conflict(detail) => format!("conflict: {detail}"),
            Self::Internal(_) => "internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Internal(detail) => tracing::error!(error = %detail, "Request failed"),
            Self::BadRequest(detail)
            | Self::Unprocessable(detail)
            | Self::PayloadTooLarge(detail) => {
                tracing::debug!(status = status.as_u16(), detail = %detail, "Rejected request body");
            }
            Self::NotFound(_) | Self::MethodNotAllowed(_) | Self::Conflict(_) => {}
        }

        let body = Json(ErrorResponse {
            success: false,
            error: status.as_u16(),
            message: self.message(),
        });
        (status, body).into_response()
    }
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn not_found(uri: OriginalUri) -> AppError {
    AppError::NotFound(uri.0.to_string())
}

pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method)
}

pub async fn list_drinks(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<DrinksResponse<ShortDrink>>> {
    let drinks = state.store.list_drinks().await?;
    Ok(Json(DrinksResponse::new(
        drinks.iter().map(ShortDrink::from).collect(),
    )))
}

pub async fn list_drinks_detail(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<DrinksResponse<LongDrink>>> {
    let drinks = state.store.list_drinks().await?;
    tracing::debug!(sub = %claims.sub, count = drinks.len(), "Listing drink details");
    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(LongDrink::from).collect(),
    )))
}

pub async fn create_drink(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateDrinkRequest>,
) -> AppResult<Json<DrinksResponse<LongDrink>>> {
    let new = NewDrink::try_from(req).map_err(AppError::Unprocessable)?;
    let drink = state.store.create_drink(&new).await?;

    tracing::info!(id = drink.id, title = %drink.title, "Drink created");
    Ok(Json(DrinksResponse::new(vec![LongDrink::from(drink)])))
}

/// The id is resolved before the body is looked at, so an absent drink is a
/// 404 whatever was sent.
pub async fn update_drink(
    State(state): State<Arc<AppState>>,
    uri: OriginalUri,
    DrinkId(id): DrinkId,
    RawBody(body): RawBody,
) -> AppResult<Json<DrinksResponse<LongDrink>>> {
    if state.store.get_drink(id).await?.is_none() {
        return Err(AppError::NotFound(uri.0.to_string()));
    }

    let req: UpdateDrinkRequest = parse_json(&body)?;
    let patch = DrinkPatch::try_from(req).map_err(AppError::Unprocessable)?;

    let drink = state
        .store
        .update_drink(id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(uri.0.to_string()))?;

    tracing::info!(id, title = %drink.title, "Drink updated");
    Ok(Json(DrinksResponse::new(vec![LongDrink::from(drink)])))
}

pub async fn delete_drink(
    State(state): State<Arc<AppState>>,
    uri: OriginalUri,
    DrinkId(id): DrinkId,
) -> AppResult<Json<DeleteResponse>> {
    if !state.store.delete_drink(id).await? {
        return Err(AppError::NotFound(uri.0.to_string()));
    }

    tracing::info!(id, "Drink deleted");
    Ok(Json(DeleteResponse {
        success: true,
        delete: id,
    }))
}
