// src/models/zap.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Configuração de canal de mensagens (Zap) usada pelo painel para
/// disparar contato com o cliente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ZapConfig {
    #[schema(example = "zap_1712345678901")]
    pub id: String,
    #[schema(example = "Cobrança - Turno da manhã")]
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
