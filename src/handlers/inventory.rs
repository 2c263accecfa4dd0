// src/handlers/inventory.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    common::events::{ChangeEntity, ChangeEvent},
    config::AppState,
    models::auth::Viewer,
    models::inventory::{TransactionType, VariationType},
    services::inventory_service::{TransactionDraft, TransactionFilter},
};

fn publish_inventory_change(app_state: &AppState) {
    app_state.events.publish(ChangeEvent {
        entity: ChangeEntity::Inventory,
        status: None,
    });
}

fn actor_name(viewer: &Viewer) -> String {
    if viewer.name.is_empty() {
        viewer.email.clone()
    } else {
        viewer.name.clone()
    }
}

// GET /api/inventory/items
#[utoipa::path(
    get,
    path = "/api/inventory/items",
    tag = "Inventory",
    responses(
        (status = 200, description = "Saldos por SKU", body = [crate::models::inventory::InventoryItem])
    )
)]
pub async fn list_items(
    State(app_state): State<AppState>,
    _viewer: Viewer,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.inventory_service.list_items()?;
    Ok((StatusCode::OK, Json(items)))
}

// GET /api/inventory/levels
#[utoipa::path(
    get,
    path = "/api/inventory/levels",
    tag = "Inventory",
    responses(
        (status = 200, description = "Quantidade em mãos por SKU", body = crate::models::inventory::InventoryLevels)
    )
)]
pub async fn get_levels(
    State(app_state): State<AppState>,
    _viewer: Viewer,
) -> Result<impl IntoResponse, AppError> {
    let levels = app_state.inventory_service.levels()?;
    Ok((StatusCode::OK, Json(levels)))
}

// GET /api/inventory/stats
#[utoipa::path(
    get,
    path = "/api/inventory/stats",
    tag = "Inventory",
    responses(
        (status = 200, description = "Indicadores do estoque", body = crate::models::inventory::InventoryStats)
    )
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    _viewer: Viewer,
) -> Result<impl IntoResponse, AppError> {
    let stats = app_state.inventory_service.stats()?;
    Ok((StatusCode::OK, Json(stats)))
}

// ---
// Query: extrato do razão
// ---
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    /// sale | purchase | adjustment | return
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// gel | capsulas
    pub sku: Option<VariationType>,
    /// Data inicial (AAAA-MM-DD).
    pub from: Option<NaiveDate>,
    /// Data final (AAAA-MM-DD).
    pub to: Option<NaiveDate>,
}

// GET /api/inventory/transactions
#[utoipa::path(
    get,
    path = "/api/inventory/transactions",
    tag = "Inventory",
    params(TransactionsQuery),
    responses(
        (status = 200, description = "Extrato, mais recente primeiro",
         body = [crate::models::inventory::InventoryTransaction])
    )
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Query(query): Query<TransactionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let transactions = app_state.inventory_service.list_transactions(TransactionFilter {
        transaction_type: query.transaction_type,
        variation_type: query.sku,
        from: query.from,
        to: query.to,
    })?;
    Ok((StatusCode::OK, Json(transactions)))
}

// ---
// Payload: PostTransactionPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostTransactionPayload {
    pub variation_type: VariationType,

    /// Positivo: entrada de estoque.
    #[schema(example = 100)]
    pub quantity: i64,

    /// purchase | return (venda entra pelo ciclo do pedido; ajuste tem
    /// rota própria com guarda de saldo).
    pub transaction_type: TransactionType,

    #[serde(default)]
    #[schema(example = "25.50")]
    pub cost_per_unit: Option<Decimal>,

    #[validate(length(min = 1, message = "As observações são obrigatórias."))]
    pub notes: String,
}

// POST /api/inventory/transactions
#[utoipa::path(
    post,
    path = "/api/inventory/transactions",
    tag = "Inventory",
    request_body = PostTransactionPayload,
    responses(
        (status = 201, description = "Lançamento registrado",
         body = crate::models::inventory::InventoryTransaction)
    )
)]
pub async fn post_transaction(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<PostTransactionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut errors = ValidationErrors::new();
    match payload.transaction_type {
        TransactionType::Sale | TransactionType::Adjustment => {
            let mut err = ValidationError::new("invalid");
            err.message = Some(
                "Vendas são lançadas pelo ciclo do pedido e ajustes pela rota de ajuste.".into(),
            );
            errors.add("transactionType".into(), err);
        }
        TransactionType::Purchase | TransactionType::Return => {
            if payload.quantity <= 0 {
                let mut err = ValidationError::new("range");
                err.message = Some("A quantidade deve ser maior que zero.".into());
                errors.add("quantity".into(), err);
            }
        }
    }
    if !errors.is_empty() {
        return Err(AppError::ValidationError(errors));
    }

    let transaction = app_state.inventory_service.post(TransactionDraft {
        variation_type: payload.variation_type,
        quantity: payload.quantity,
        transaction_type: payload.transaction_type,
        order_id: None,
        notes: payload.notes,
        created_by: actor_name(&viewer),
        cost_per_unit: payload.cost_per_unit,
    })?;
    publish_inventory_change(&app_state);
    Ok((StatusCode::CREATED, Json(transaction)))
}

// ---
// Payload: AdjustPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustPayload {
    pub variation_type: VariationType,

    /// Assinado: negativo retira do estoque.
    #[schema(example = -5)]
    pub quantity: i64,

    #[validate(length(min = 1, message = "As observações são obrigatórias."))]
    pub notes: String,
}

// POST /api/inventory/adjust (recusado se deixaria o saldo negativo)
#[utoipa::path(
    post,
    path = "/api/inventory/adjust",
    tag = "Inventory",
    request_body = AdjustPayload,
    responses(
        (status = 201, description = "Ajuste registrado",
         body = crate::models::inventory::InventoryTransaction),
        (status = 422, description = "Saldo ficaria negativo")
    )
)]
pub async fn adjust_inventory(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<AdjustPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let transaction = app_state.inventory_service.adjust(
        payload.variation_type,
        payload.quantity,
        payload.notes,
        actor_name(&viewer),
    )?;
    publish_inventory_change(&app_state);
    Ok((StatusCode::CREATED, Json(transaction)))
}
