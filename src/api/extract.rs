//! Per-route permission enforcement
//!
//! Protected handlers take an [`Authorized<S>`] argument; extraction fails
//! with 401 before the handler runs unless the bearer token grants
//! `S::PERMISSION`.

use std::marker::PhantomData;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::error::ApiError;
use super::state::AppState;
use crate::auth::Claims;

/// A permission a route requires
pub trait Scope: Send + Sync + 'static {
    const PERMISSION: &'static str;
}

pub struct GetDrinksDetail;
pub struct PostDrinks;
pub struct PatchDrinks;
pub struct DeleteDrinks;

impl Scope for GetDrinksDetail {
    const PERMISSION: &'static str = "get:drinks-detail";
}

impl Scope for PostDrinks {
    const PERMISSION: &'static str = "post:drinks";
}

impl Scope for PatchDrinks {
    const PERMISSION: &'static str = "patch:drinks";
}

impl Scope for DeleteDrinks {
    const PERMISSION: &'static str = "delete:drinks";
}

/// Verified claims of a caller holding permission `S`
pub struct Authorized<S: Scope> {
    pub claims: Claims,
    scope: PhantomData<S>,
}

impl<S: Scope> Authorized<S> {
    pub fn subject(&self) -> &str {
        self.claims.subject.as_deref().unwrap_or("unknown")
    }
}

#[async_trait]
impl<S: Scope> FromRequestParts<AppState> for Authorized<S> {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // A non-ASCII header can never be a valid bearer header.
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().unwrap_or_default());

        match state.verifier.authorize(header, S::PERMISSION).await {
            Ok(claims) => Ok(Self {
                claims,
                scope: PhantomData,
            }),
            Err(err) => {
                tracing::debug!(
                    scope = S::PERMISSION,
                    code = err.code(),
                    reason = %err,
                    "Rejected request"
                );
                Err(err.into())
            }
        }
    }
}
