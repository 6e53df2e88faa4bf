//! Item CRUD endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{Item, ItemId, ItemUpdate, NewItem, Role};
use identity::{Credential, IdentityProvider};
use item_store::{ItemFilter, ItemStore};
use serde::Deserialize;

use crate::AppState;
use crate::auth::Authenticated;
use crate::error::ApiError;

const MAX_NAME_LEN: usize = 255;
const MAX_EMAIL_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 6;
const GENERATED_PASSWORD_LEN: usize = 8;

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub name: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub email_address: String,
    #[serde(default)]
    pub role: i32,
    pub password: Option<String>,
}

impl CreateItemRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_name(&self.name)?;
        let email_address = self.email_address.trim();
        if !email_address.contains('@') {
            return Err(ApiError::BadRequest(
                "email_address must be a valid email address".to_string(),
            ));
        }
        if email_address.chars().count() > MAX_EMAIL_LEN {
            return Err(ApiError::BadRequest(format!(
                "email_address must be at most {MAX_EMAIL_LEN} characters"
            )));
        }
        if self.role < 0 {
            return Err(ApiError::BadRequest("role must not be negative".to_string()));
        }
        if let Some(ref password) = self.password
            && password.chars().count() < MIN_PASSWORD_LEN
        {
            return Err(ApiError::BadRequest(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub name: String,
}

// -- Handlers --

/// GET /items — list items, optionally filtered by name and email address.
#[tracing::instrument(skip(state))]
pub async fn list<S: ItemStore + 'static, I: IdentityProvider + 'static>(
    State(state): State<Arc<AppState<S, I>>>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let mut filter = ItemFilter::new();
    if let Some(name) = params.name {
        filter = filter.with_name(name);
    }
    if let Some(email_address) = params.email_address {
        filter = filter.with_email_address(email_address);
    }

    let items = if filter.is_empty() {
        state.service.find_all().await?
    } else {
        state.service.find(&filter).await?
    };

    if items.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(items).into_response())
}

/// GET /items/{id} — load a single item.
#[tracing::instrument(skip(state))]
pub async fn get<S: ItemStore + 'static, I: IdentityProvider + 'static>(
    State(state): State<Arc<AppState<S, I>>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    let item_id = parse_item_id(&id)?;
    let item = state
        .service
        .find_by_id(item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {item_id} not found")))?;

    Ok(Json(item))
}

/// POST /items — create an item and its external user.
#[tracing::instrument(skip(state, auth, body), fields(subject = %auth.subject))]
pub async fn create<S: ItemStore + 'static, I: IdentityProvider + 'static>(
    State(state): State<Arc<AppState<S, I>>>,
    auth: Authenticated,
    body: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    req.validate()?;

    let credential = match req.password {
        Some(password) => Credential::new(password),
        None => generate_password(),
    };
    let item = NewItem::new(
        req.name.trim(),
        req.email_address.trim(),
        Role::new(req.role),
    );

    let created = state.service.create(item, &credential).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /items/{id} — rename an item.
#[tracing::instrument(skip(state, auth, body), fields(subject = %auth.subject))]
pub async fn update<S: ItemStore + 'static, I: IdentityProvider + 'static>(
    State(state): State<Arc<AppState<S, I>>>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let item_id = parse_item_id(&id)?;
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    validate_name(&req.name)?;

    state
        .service
        .update(item_id, ItemUpdate::new(req.name.trim()))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /items/{id} — delete an item and its external user.
#[tracing::instrument(skip(state, auth), fields(subject = %auth.subject))]
pub async fn delete<S: ItemStore + 'static, I: IdentityProvider + 'static>(
    State(state): State<Arc<AppState<S, I>>>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let item_id = parse_item_id(&id)?;
    state.service.delete(item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- Helpers --

fn parse_item_id(id: &str) -> Result<ItemId, ApiError> {
    id.parse::<i64>()
        .ok()
        .filter(|raw| *raw > 0)
        .map(ItemId::new)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid item id: {id}")))
}

/// Names are stored trimmed, so limits apply to the trimmed value.
fn validate_name(name: &str) -> Result<(), ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Random alphanumeric credential for items created without a password.
fn generate_password() -> Credential {
    let mut password = uuid::Uuid::new_v4().simple().to_string();
    password.truncate(GENERATED_PASSWORD_LEN);
    Credential::new(password)
}
