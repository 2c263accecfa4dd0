// src/services/duplicate_service.rs
//
// Heurística de duplicidade usada na criação de pedido: mesmo telefone e
// valor dentro de 5% do valor do pedido já existente. É uma varredura
// linear rodada uma vez por tentativa de criação, não um índice.

use rust_decimal::Decimal;

use crate::models::order::Order;

#[derive(Debug, Clone)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub matches: Vec<Order>,
}

/// A tolerância é calculada sobre o valor do pedido EXISTENTE (assimétrica
/// de propósito: um pedido antigo de R$ 1000 absorve candidatos entre
/// R$ 950 e R$ 1050, independente do valor do candidato).
pub fn check(phone: &str, sale_value: Decimal, existing: &[Order]) -> DuplicateCheck {
    let phone = phone.trim();
    if phone.is_empty() {
        // Sem telefone não há o que comparar.
        return DuplicateCheck {
            is_duplicate: false,
            matches: Vec::new(),
        };
    }

    let tolerance_rate = Decimal::new(5, 2); // 5%
    let matches: Vec<Order> = existing
        .iter()
        .filter(|order| {
            if order.customer_phone.trim() != phone {
                return false;
            }
            let diff = (order.sale_value - sale_value).abs();
            diff <= order.sale_value * tolerance_rate
        })
        .cloned()
        .collect();

    DuplicateCheck {
        is_duplicate: !matches.is_empty(),
        matches,
    }
}
