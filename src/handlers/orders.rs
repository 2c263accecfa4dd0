// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::Viewer,
    models::order::{Order, OrderStatus},
    services::order_service::{self, NewOrder},
    services::visibility::{self, OrderQuery, SortDirection, SortKey},
};

fn invalid_value_error(field: &'static str, message: String) -> AppError {
    let mut error = ValidationError::new("invalid");
    error.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add(field.into(), error);
    AppError::ValidationError(errors)
}

fn parse_status(field: &'static str, raw: &str) -> Result<OrderStatus, AppError> {
    OrderStatus::parse(raw)
        .ok_or_else(|| invalid_value_error(field, format!("Situação desconhecida: '{raw}'.")))
}

// ---
// Payload: CreateOrderPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    /// Gerado por quem chama; nunca é reaproveitado.
    #[validate(length(min = 1, message = "O ID do pedido é obrigatório."))]
    #[schema(example = "V1712345678901")]
    pub id: String,

    #[validate(length(min = 1, message = "O nome do cliente é obrigatório."))]
    pub customer_name: String,

    #[validate(length(min = 10, message = "Telefone inválido."))]
    #[schema(example = "11999999999")]
    pub customer_phone: String,

    #[validate(length(min = 11, message = "CPF inválido."))]
    pub customer_document: String,

    #[serde(default)]
    pub customer_address: String,

    /// Id da oferta ou nome de exibição "Produto - Oferta".
    #[validate(length(min = 1, message = "A oferta é obrigatória."))]
    pub offer_id: String,

    #[serde(default)]
    #[schema(example = "07/03/2024")]
    pub negotiation_date: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order: Order,
    /// O pedido caiu na fila de possíveis duplicados?
    pub is_duplicate: bool,
}

// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado (duplicado vai para a fila de aprovação)", body = CreateOrderResponse),
        (status = 409, description = "ID de pedido já usado")
    )
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let seller_name = if viewer.name.is_empty() {
        viewer.email.clone()
    } else {
        viewer.name.clone()
    };

    let (order, duplicate) = app_state.order_service.create(NewOrder {
        id: payload.id,
        customer_name: payload.customer_name,
        customer_phone: payload.customer_phone,
        customer_document: payload.customer_document,
        customer_address: payload.customer_address,
        offer_reference: payload.offer_id,
        negotiation_date: payload.negotiation_date,
        seller_name,
    })?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            order,
            is_duplicate: duplicate.is_duplicate,
        }),
    ))
}

// ---
// Query: listagem com projeção de visibilidade
// ---
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    /// Filtro de igualdade de situação (sem diferenciar caixa).
    pub status: Option<String>,
    /// Filtro especial: "recebidoHoje".
    pub special: Option<String>,
    /// dataVenda | ultimaAtualizacao | dataNegociacao | atualizacaoCorreios
    pub sort: Option<String>,
    /// asc | desc (padrão desc)
    pub direction: Option<String>,
}

impl OrderListQuery {
    fn to_query(&self) -> Result<OrderQuery, AppError> {
        let status = match self.status.as_deref() {
            Some(raw) => Some(parse_status("status", raw)?),
            None => None,
        };

        let received_today = match self.special.as_deref() {
            None => false,
            Some("recebidoHoje") => true,
            Some(other) => {
                return Err(invalid_value_error(
                    "special",
                    format!("Filtro especial desconhecido: '{other}'."),
                ))
            }
        };

        let sort = match self.sort.as_deref() {
            Some(raw) => Some(SortKey::parse(raw).ok_or_else(|| {
                invalid_value_error("sort", format!("Campo de ordenação desconhecido: '{raw}'."))
            })?),
            None => None,
        };

        let direction = match self.direction.as_deref() {
            None => SortDirection::default(),
            Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(invalid_value_error(
                    "direction",
                    format!("Direção de ordenação desconhecida: '{other}'."),
                ))
            }
        };

        Ok(OrderQuery {
            status,
            received_today,
            sort,
            direction,
        })
    }
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Pedidos visíveis para quem consulta", body = [Order])
    )
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<OrderListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let order_query = query.to_query()?;
    let orders = app_state.order_service.list()?;
    let visible = visibility::project(orders, &viewer, &order_query);
    Ok((StatusCode::OK, Json(visible)))
}

// GET /api/orders/duplicates
#[utoipa::path(
    get,
    path = "/api/orders/duplicates",
    tag = "Orders",
    responses(
        (status = 200, description = "Fila de possíveis duplicados", body = [Order])
    )
)]
pub async fn list_duplicates(
    State(app_state): State<AppState>,
    viewer: Viewer,
) -> Result<impl IntoResponse, AppError> {
    let query = OrderQuery {
        status: Some(OrderStatus::PossiveisDuplicados),
        ..Default::default()
    };
    let orders = app_state.order_service.list()?;
    let visible = visibility::project(orders, &viewer, &query);
    Ok((StatusCode::OK, Json(visible)))
}

// GET /api/orders/stats
#[utoipa::path(
    get,
    path = "/api/orders/stats",
    tag = "Orders",
    responses(
        (status = 200, description = "Indicadores sobre o recorte visível",
         body = crate::services::order_service::OrderStats)
    )
)]
pub async fn get_order_stats(
    State(app_state): State<AppState>,
    viewer: Viewer,
) -> Result<impl IntoResponse, AppError> {
    let orders = app_state.order_service.list()?;
    let visible = visibility::project(orders, &viewer, &OrderQuery::default());
    Ok((StatusCode::OK, Json(order_service::summarize(&visible))))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = String, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido", body = Order),
        (status = 404, description = "Inexistente ou fora do recorte de quem consulta")
    )
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .order_service
        .get(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Pedido '{id}'")))?;

    // Fora do recorte do papel (ou deletado, para não-admin) é como se
    // não existisse.
    let hidden_deleted = order.sale_status == OrderStatus::Deletado && !viewer.is_admin();
    if !visibility::can_view(&order, &viewer) || hidden_deleted {
        return Err(AppError::NotFound(format!("Pedido '{id}'")));
    }

    Ok((StatusCode::OK, Json(order)))
}

// ---
// Payload: TransitionPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPayload {
    #[validate(length(min = 1, message = "A situação é obrigatória."))]
    #[schema(example = "Em Separação")]
    pub status: String,

    #[serde(default)]
    pub note: Option<String>,
}

// PUT /api/orders/{id}/status
#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    tag = "Orders",
    request_body = TransitionPayload,
    params(("id" = String, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido após a transição", body = Order),
        (status = 422, description = "Transição fora da tabela canônica")
    )
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    Json(payload): Json<TransitionPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let to = parse_status("status", &payload.status)?;
    let order = app_state
        .order_service
        .transition(&id, to, payload.note, &viewer)?;
    Ok((StatusCode::OK, Json(order)))
}

// POST /api/orders/{id}/approve
#[utoipa::path(
    post,
    path = "/api/orders/{id}/approve",
    tag = "Orders",
    params(("id" = String, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido aprovado para separação", body = Order)
    )
)]
pub async fn approve_order(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.order_service.approve(&id, &viewer)?;
    Ok((StatusCode::OK, Json(order)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RejectPayload {
    #[validate(length(min = 1, message = "O motivo da rejeição é obrigatório."))]
    pub reason: String,
}

// POST /api/orders/{id}/reject
#[utoipa::path(
    post,
    path = "/api/orders/{id}/reject",
    tag = "Orders",
    request_body = RejectPayload,
    params(("id" = String, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido rejeitado (cancelado com motivo)", body = Order)
    )
)]
pub async fn reject_order(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    Json(payload): Json<RejectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let order = app_state
        .order_service
        .reject(&id, &payload.reason, &viewer)?;
    Ok((StatusCode::OK, Json(order)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingPayload {
    #[validate(length(min = 1, message = "O código de rastreio é obrigatório."))]
    #[schema(example = "BR123456789BR")]
    pub tracking_code: String,
}

// PUT /api/orders/{id}/tracking
#[utoipa::path(
    put,
    path = "/api/orders/{id}/tracking",
    tag = "Orders",
    request_body = TrackingPayload,
    params(("id" = String, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Código anexado; pedido em trânsito", body = Order)
    )
)]
pub async fn attach_tracking(
    State(app_state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    Json(payload): Json<TrackingPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let order = app_state
        .order_service
        .attach_tracking(&id, &payload.tracking_code, &viewer)?;
    Ok((StatusCode::OK, Json(order)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarrierStatusPayload {
    #[validate(length(min = 1, message = "O status dos Correios é obrigatório."))]
    #[schema(example = "Objeto em trânsito")]
    pub status: String,

    #[serde(default)]
    #[schema(example = "07/03/2024")]
    pub updated_at: String,
}

// PUT /api/orders/{id}/carrier-status (fronteira com o rastreador)
#[utoipa::path(
    put,
    path = "/api/orders/{id}/carrier-status",
    tag = "Orders",
    request_body = CarrierStatusPayload,
    params(("id" = String, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Status dos Correios registrado", body = Order)
    )
)]
pub async fn update_carrier_status(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CarrierStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let order =
        app_state
            .order_service
            .set_carrier_status(&id, &payload.status, &payload.updated_at)?;
    Ok((StatusCode::OK, Json(order)))
}

// ---
// Payload: ImportPayload
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportPayload {
    /// Conteúdo bruto do arquivo CSV/TSV exportado.
    #[validate(length(min = 1, message = "O conteúdo da planilha é obrigatório."))]
    pub content: String,
}

// POST /api/orders/import
#[utoipa::path(
    post,
    path = "/api/orders/import",
    tag = "Orders",
    request_body = ImportPayload,
    responses(
        (status = 200, description = "Resultado da importação, com linhas rejeitadas",
         body = crate::services::import_service::ImportReport)
    )
)]
pub async fn import_orders(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Json(payload): Json<ImportPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let report = app_state.import_service.import(&payload.content)?;
    Ok((StatusCode::OK, Json(report)))
}
