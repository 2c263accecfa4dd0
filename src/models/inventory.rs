// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Nível mínimo aplicado quando o razão cria um item que ainda não existia.
pub const DEFAULT_MINIMUM_LEVEL: i64 = 50;

/// SKU controlado pelo razão de estoque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VariationType {
    Gel,
    Capsulas,
}

impl VariationType {
    pub fn as_str(self) -> &'static str {
        match self {
            VariationType::Gel => "gel",
            VariationType::Capsulas => "capsulas",
        }
    }

    pub fn parse(raw: &str) -> Option<VariationType> {
        match raw.trim().to_lowercase().as_str() {
            "gel" => Some(VariationType::Gel),
            "capsulas" | "cápsulas" => Some(VariationType::Capsulas),
            _ => None,
        }
    }
}

impl std::fmt::Display for VariationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Purchase,
    Adjustment,
    Return,
}

/// Saldo atual de um SKU. Invariante: `quantity` é sempre a soma das
/// quantidades de todas as transações lançadas para o SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub variation_type: VariationType,
    pub quantity: i64,
    /// Abaixo ou igual a este nível o item conta como estoque baixo.
    pub minimum_level: i64,
    #[schema(example = "25.50")]
    pub cost_per_unit: Decimal,
    pub last_updated_at: DateTime<Utc>,
}

/// Lançamento assinado e imutável do razão. Estorno é um novo lançamento
/// de sinal oposto, nunca edição.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryTransaction {
    #[schema(example = "inv_1712345678901_a3f9")]
    pub id: String,
    pub date: DateTime<Utc>,
    pub variation_type: VariationType,
    /// Negativo = saída de estoque.
    #[schema(example = -3)]
    pub quantity: i64,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub order_id: Option<String>,
    pub notes: String,
    pub created_by: String,
}

/// Identificador ordenado pelo instante de geração.
pub fn generate_transaction_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "inv_{}_{}",
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLevels {
    pub gel: i64,
    pub capsulas: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStats {
    pub total_items: i64,
    pub low_stock_items: usize,
    #[schema(example = "12750.00")]
    pub total_value: Decimal,
    pub most_sold_variation: Option<VariationType>,
}
