// src/handlers/products.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    common::events::{ChangeEntity, ChangeEvent},
    config::AppState,
    models::auth::Viewer,
};

fn publish_catalog_change(app_state: &AppState) {
    app_state.events.publish(ChangeEvent {
        entity: ChangeEntity::Products,
        status: None,
    });
}

// ---
// Validação customizada
// ---
fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O preço deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: CreateProductPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Potencia Azul")]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = crate::models::product::Product)
    )
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product =
        app_state
            .catalog_service
            .create_product(&payload.name, payload.description, payload.active)?;
    publish_catalog_change(&app_state);
    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catalog",
    responses(
        (status = 200, description = "Catálogo completo", body = [crate::models::product::Product])
    )
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    _viewer: Viewer,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.recompute_in_use_flags()?;
    let products = app_state.catalog_service.list_products()?;
    Ok((StatusCode::OK, Json(products)))
}

// ---
// Payload: UpdateProductPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    /// Renomear propaga o novo nome de exibição para os pedidos.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Catalog",
    request_body = UpdateProductPayload,
    params(("id" = String, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto atualizado", body = crate::models::product::Product)
    )
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.update_product(
        &id,
        payload.name,
        payload.description,
        payload.active,
    )?;
    publish_catalog_change(&app_state);
    Ok((StatusCode::OK, Json(product)))
}

// DELETE /api/products/{id} (soft delete)
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Catalog",
    params(("id" = String, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto inativado", body = crate::models::product::Product)
    )
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.soft_delete_product(&id)?;
    publish_catalog_change(&app_state);
    Ok((StatusCode::OK, Json(product)))
}

// ---
// Payload: OfferPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Kit 3 Gel")]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[validate(custom(function = "validate_positive_price"))]
    #[schema(example = "297.00")]
    pub price: Decimal,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub gel_quantity: u32,

    #[serde(default)]
    pub capsulas_quantity: u32,
}

impl CreateOfferPayload {
    // A oferta precisa consumir pelo menos um SKU.
    fn validate_consistency(&self) -> Result<(), ValidationError> {
        if self.gel_quantity == 0 && self.capsulas_quantity == 0 {
            let mut err = ValidationError::new("CompositionRequired");
            err.message =
                Some("A oferta precisa de pelo menos uma unidade de gel ou cápsulas.".into());
            return Err(err);
        }
        Ok(())
    }
}

// POST /api/products/{id}/offers
#[utoipa::path(
    post,
    path = "/api/products/{id}/offers",
    tag = "Catalog",
    request_body = CreateOfferPayload,
    params(("id" = String, Path, description = "ID do produto")),
    responses(
        (status = 201, description = "Oferta criada", body = crate::models::product::Offer)
    )
)]
pub async fn add_offer(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Path(id): Path<String>,
    Json(payload): Json<CreateOfferPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.validate_consistency().map_err(|e| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("gelQuantity".into(), e);
        AppError::ValidationError(errors)
    })?;

    let offer = app_state.catalog_service.add_offer(
        &id,
        &payload.name,
        payload.description,
        payload.price,
        payload.active,
        payload.gel_quantity,
        payload.capsulas_quantity,
    )?;
    publish_catalog_change(&app_state);
    Ok((StatusCode::CREATED, Json(offer)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferPayload {
    /// Renomear propaga o novo nome de exibição para os pedidos.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub gel_quantity: Option<u32>,
    #[serde(default)]
    pub capsulas_quantity: Option<u32>,
}

// PUT /api/products/{id}/offers/{offer_id}
#[utoipa::path(
    put,
    path = "/api/products/{id}/offers/{offer_id}",
    tag = "Catalog",
    request_body = UpdateOfferPayload,
    params(
        ("id" = String, Path, description = "ID do produto"),
        ("offer_id" = String, Path, description = "ID da oferta")
    ),
    responses(
        (status = 200, description = "Oferta atualizada", body = crate::models::product::Offer)
    )
)]
pub async fn update_offer(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Path((id, offer_id)): Path<(String, String)>,
    Json(payload): Json<UpdateOfferPayload>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(price) = payload.price {
        validate_positive_price(&price).map_err(|e| {
            let mut errors = validator::ValidationErrors::new();
            errors.add("price".into(), e);
            AppError::ValidationError(errors)
        })?;
    }

    let offer = app_state.catalog_service.update_offer(
        &id,
        &offer_id,
        payload.name,
        payload.description,
        payload.price,
        payload.active,
        payload.gel_quantity,
        payload.capsulas_quantity,
    )?;
    publish_catalog_change(&app_state);
    Ok((StatusCode::OK, Json(offer)))
}

// DELETE /api/products/{id}/offers/{offer_id} (guarda de uso)
#[utoipa::path(
    delete,
    path = "/api/products/{id}/offers/{offer_id}",
    tag = "Catalog",
    params(
        ("id" = String, Path, description = "ID do produto"),
        ("offer_id" = String, Path, description = "ID da oferta")
    ),
    responses(
        (status = 200, description = "Removida, ou apenas inativada se estiver em uso",
         body = crate::services::catalog_service::OfferDeletion)
    )
)]
pub async fn delete_offer(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Path((id, offer_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state.catalog_service.delete_offer(&id, &offer_id)?;
    publish_catalog_change(&app_state);
    Ok((StatusCode::OK, Json(outcome)))
}

// GET /api/products/offers/active: o que o formulário do vendedor lista.
#[utoipa::path(
    get,
    path = "/api/products/offers/active",
    tag = "Catalog",
    responses(
        (status = 200, description = "Ofertas vendáveis (produto e oferta ativos)",
         body = [crate::models::product::ResolvedOffer])
    )
)]
pub async fn list_active_offers(
    State(app_state): State<AppState>,
    _viewer: Viewer,
) -> Result<impl IntoResponse, AppError> {
    let offers = app_state.catalog_service.list_active_offers()?;
    Ok((StatusCode::OK, Json(offers)))
}
