// src/handlers/zap.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::error::AppError,
    common::events::{ChangeEntity, ChangeEvent},
    config::AppState,
    models::auth::Viewer,
    models::zap::ZapConfig,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ZapListQuery {
    /// Se verdadeiro, só configurações ativas.
    pub active: Option<bool>,
}

// GET /api/zap-configs
#[utoipa::path(
    get,
    path = "/api/zap-configs",
    tag = "Zap",
    params(ZapListQuery),
    responses(
        (status = 200, description = "Configurações de canal", body = [ZapConfig])
    )
)]
pub async fn list_configs(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Query(query): Query<ZapListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut configs = app_state.zap_repo.list()?;
    if query.active == Some(true) {
        configs.retain(|c| c.is_active);
    }
    Ok((StatusCode::OK, Json(configs)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZapConfigPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Cobrança - Turno da manhã")]
    pub name: String,

    #[serde(default)]
    pub is_active: bool,
}

// POST /api/zap-configs
#[utoipa::path(
    post,
    path = "/api/zap-configs",
    tag = "Zap",
    request_body = ZapConfigPayload,
    responses(
        (status = 201, description = "Configuração criada", body = ZapConfig)
    )
)]
pub async fn create_config(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Json(payload): Json<ZapConfigPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let now = Utc::now();
    let config = ZapConfig {
        id: format!("zap_{}", now.timestamp_millis()),
        name: payload.name,
        is_active: payload.is_active,
        created_at: now,
        updated_at: now,
    };
    app_state.zap_repo.save(&config)?;
    app_state.events.publish(ChangeEvent {
        entity: ChangeEntity::ZapConfigs,
        status: None,
    });
    Ok((StatusCode::CREATED, Json(config)))
}

// PUT /api/zap-configs/{id}
#[utoipa::path(
    put,
    path = "/api/zap-configs/{id}",
    tag = "Zap",
    request_body = ZapConfigPayload,
    params(("id" = String, Path, description = "ID da configuração")),
    responses(
        (status = 200, description = "Configuração atualizada", body = ZapConfig)
    )
)]
pub async fn update_config(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Path(id): Path<String>,
    Json(payload): Json<ZapConfigPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let mut config = app_state
        .zap_repo
        .get(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Configuração '{id}'")))?;

    config.name = payload.name;
    config.is_active = payload.is_active;
    config.updated_at = Utc::now();
    app_state.zap_repo.save(&config)?;

    app_state.events.publish(ChangeEvent {
        entity: ChangeEntity::ZapConfigs,
        status: None,
    });
    Ok((StatusCode::OK, Json(config)))
}

// DELETE /api/zap-configs/{id}
#[utoipa::path(
    delete,
    path = "/api/zap-configs/{id}",
    tag = "Zap",
    params(("id" = String, Path, description = "ID da configuração")),
    responses(
        (status = 204, description = "Configuração removida"),
        (status = 404, description = "Configuração inexistente")
    )
)]
pub async fn delete_config(
    State(app_state): State<AppState>,
    _viewer: Viewer,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !app_state.zap_repo.remove(&id)? {
        return Err(AppError::NotFound(format!("Configuração '{id}'")));
    }
    app_state.events.publish(ChangeEvent {
        entity: ChangeEntity::ZapConfigs,
        status: None,
    });
    Ok(StatusCode::NO_CONTENT)
}
