// src/models/product.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Oferta: uma configuração vendável de um produto, composta por
/// quantidades de cada SKU (gel e/ou cápsulas).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    #[schema(example = "Kit 3 Gel")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(example = "297.00")]
    pub price: Decimal,
    pub active: bool,
    /// Quantos frascos de gel saem do estoque por unidade vendida.
    pub gel_quantity: u32,
    /// Quantos potes de cápsulas saem do estoque por unidade vendida.
    pub capsulas_quantity: u32,
    /// Derivado: existe pedido persistido referenciando esta oferta pelo
    /// nome de exibição. Oferta em uso nunca é removida, apenas inativada.
    #[serde(default)]
    pub in_use: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[schema(example = "Potencia Azul")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub active: bool,
    pub offers: Vec<Offer>,
}

impl Product {
    /// Nome de exibição combinado usado como referência nos pedidos.
    pub fn display_name(&self, offer: &Offer) -> String {
        format!("{} - {}", self.name, offer.name)
    }
}

/// Resultado de `resolve_offer`: a oferta junto do contexto do produto.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOffer {
    pub product_id: String,
    pub product_name: String,
    #[schema(example = "Potencia Azul - Kit 3 Gel")]
    pub display_name: String,
    pub offer: Offer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn oferta_sobrevive_a_ida_e_volta_pelo_formato_persistido() {
        let oferta = Offer {
            id: "of_1".to_string(),
            name: "Kit 3 Gel".to_string(),
            description: Some("3 frascos".to_string()),
            price: Decimal::from_str("297.00").unwrap(),
            active: true,
            gel_quantity: 3,
            capsulas_quantity: 0,
            in_use: true,
        };
        let json = serde_json::to_string(&oferta).unwrap();
        let de_volta: Offer = serde_json::from_str(&json).unwrap();
        assert_eq!(oferta, de_volta);
        assert!(json.contains("\"gelQuantity\""));
    }
}
