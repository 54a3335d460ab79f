//! API handlers

use std::any::Any;

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::extract::{Authorized, DeleteDrinks, GetDrinksDetail, PatchDrinks, PostDrinks};
use crate::api::AppState;
use crate::models::{Drink, DrinkId, DrinkPatch, LongDrink, NewDrink, ShortDrink};
use crate::Error;

#[derive(Debug, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: DrinkId,
}

/// List all drinks in short form. Public.
pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<ShortDrink>>, ApiError> {
    let drinks = state.store.list_all().await.map_err(list_failed)?;

    Ok(Json(DrinksResponse::new(
        drinks.iter().map(Drink::short).collect(),
    )))
}

/// List all drinks in long form
pub async fn list_drink_details(
    State(state): State<AppState>,
    auth: Authorized<GetDrinksDetail>,
) -> Result<Json<DrinksResponse<LongDrink>>, ApiError> {
    tracing::debug!(subject = auth.subject(), "Listing drink details");
    let drinks = state.store.list_all().await.map_err(list_failed)?;

    Ok(Json(DrinksResponse::new(
        drinks.iter().map(Drink::long).collect(),
    )))
}

/// Create a drink from `title` and `recipe`
pub async fn create_drink(
    State(state): State<AppState>,
    auth: Authorized<PostDrinks>,
    body: Bytes,
) -> Result<Json<DrinksResponse<LongDrink>>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::unprocessable());
    }

    let new_drink: NewDrink = serde_json::from_slice(&body).map_err(|err| {
        tracing::warn!(error = %err, "Rejected drink body");
        ApiError::unprocessable()
    })?;

    let drink = state
        .store
        .insert(new_drink)
        .await
        .map_err(write_failed)?;

    tracing::info!(drink_id = drink.id, subject = auth.subject(), "Created drink");
    Ok(Json(DrinksResponse::new(vec![drink.long()])))
}

/// Replace a drink's title and, when given, its recipe
pub async fn patch_drink(
    State(state): State<AppState>,
    auth: Authorized<PatchDrinks>,
    id: Result<Path<DrinkId>, PathRejection>,
    body: Bytes,
) -> Result<Json<DrinksResponse<LongDrink>>, ApiError> {
    let Ok(Path(id)) = id else {
        return Err(ApiError::not_found());
    };

    let patch: DrinkPatch = if body.is_empty() {
        DrinkPatch::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| {
            tracing::warn!(drink_id = id, error = %err, "Rejected patch body");
            ApiError::unprocessable()
        })?
    };

    let mut drink = state
        .store
        .find_by_id(id)
        .await
        .map_err(write_failed)?
        .ok_or_else(ApiError::not_found)?;

    if !patch.apply_to(&mut drink) {
        return Err(ApiError::bad_request());
    }

    state.store.update(&drink).await.map_err(write_failed)?;

    tracing::info!(drink_id = id, subject = auth.subject(), "Updated drink");
    Ok(Json(DrinksResponse::new(vec![drink.long()])))
}

/// Delete a drink by id
pub async fn delete_drink(
    State(state): State<AppState>,
    auth: Authorized<DeleteDrinks>,
    id: Result<Path<DrinkId>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let Ok(Path(id)) = id else {
        return Err(ApiError::not_found());
    };

    let drink = state
        .store
        .find_by_id(id)
        .await
        .map_err(write_failed)?
        .ok_or_else(ApiError::not_found)?;

    state.store.delete(&drink).await.map_err(write_failed)?;

    tracing::info!(drink_id = id, subject = auth.subject(), "Deleted drink");
    Ok(Json(DeletedResponse {
        success: true,
        deleted: id,
    }))
}

/// Unknown paths
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// Give the router's bare 405 responses the JSON envelope
pub async fn method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut envelope = ApiError::method_not_allowed().into_response();
    if let Some(allow) = allow {
        envelope.headers_mut().insert(header::ALLOW, allow);
    }
    envelope
}

/// Answer panicking handlers with the 500 envelope
pub fn panic_response(_err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    ApiError::internal().into_response()
}

fn list_failed(err: Error) -> ApiError {
    tracing::error!(error = %err, "Failed to list drinks");
    ApiError::internal()
}

// Write-path failures all answer 422; the kind only shows up in the log.
fn write_failed(err: Error) -> ApiError {
    match &err {
        Error::ConstraintViolation(_) => {
            tracing::warn!(error = %err, "Drink write violated a constraint")
        }
        _ => tracing::warn!(error = %err, "Drink store failure"),
    }
    ApiError::unprocessable()
}
