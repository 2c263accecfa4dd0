// src/models/order.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// --- Situação do pedido ---
//
// Enum fechado com a tabela canônica de transições. Historicamente a
// situação era texto livre comparado com toLowerCase espalhado pelas telas;
// aqui toda comparação passa por este tipo e toda mudança passa por
// `can_transition_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    #[serde(rename = "Liberação")]
    Liberacao,
    #[serde(rename = "Possíveis Duplicados")]
    PossiveisDuplicados,
    #[serde(rename = "Em Separação")]
    EmSeparacao,
    #[serde(rename = "Em Trânsito")]
    EmTransito,
    #[serde(rename = "Entregue")]
    Entregue,
    #[serde(rename = "Confirmar Entrega")]
    ConfirmarEntrega,
    #[serde(rename = "Pagamento Pendente")]
    PagamentoPendente,
    #[serde(rename = "Completo")]
    Completo,
    #[serde(rename = "Cancelado")]
    Cancelado,
    #[serde(rename = "Deletado")]
    Deletado,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Liberacao => "Liberação",
            OrderStatus::PossiveisDuplicados => "Possíveis Duplicados",
            OrderStatus::EmSeparacao => "Em Separação",
            OrderStatus::EmTransito => "Em Trânsito",
            OrderStatus::Entregue => "Entregue",
            OrderStatus::ConfirmarEntrega => "Confirmar Entrega",
            OrderStatus::PagamentoPendente => "Pagamento Pendente",
            OrderStatus::Completo => "Completo",
            OrderStatus::Cancelado => "Cancelado",
            OrderStatus::Deletado => "Deletado",
        }
    }

    /// Interpretação tolerante para dados históricos: sem diferenciar
    /// maiúsculas e aceitando variantes sem acento (planilhas exportadas).
    /// "Pendente" e "Aguardando Aprovação" eram os rótulos antigos dos
    /// estados iniciais e são mantidos como apelidos.
    pub fn parse(raw: &str) -> Option<OrderStatus> {
        let normalized = raw.trim().to_lowercase();
        let status = match normalized.as_str() {
            "liberação" | "liberacao" | "pendente" => OrderStatus::Liberacao,
            "possíveis duplicados" | "possiveis duplicados" | "aguardando aprovação"
            | "aguardando aprovacao" => OrderStatus::PossiveisDuplicados,
            "em separação" | "em separacao" => OrderStatus::EmSeparacao,
            "em trânsito" | "em transito" => OrderStatus::EmTransito,
            "entregue" => OrderStatus::Entregue,
            "confirmar entrega" => OrderStatus::ConfirmarEntrega,
            "pagamento pendente" => OrderStatus::PagamentoPendente,
            "completo" => OrderStatus::Completo,
            "cancelado" => OrderStatus::Cancelado,
            "deletado" => OrderStatus::Deletado,
            _ => return None,
        };
        Some(status)
    }

    /// Tabela canônica de transições.
    ///
    /// `Deletado` é terminal: pedido deletado não ressuscita pelo ciclo de
    /// vida (reparo de dados é outra operação). `Possíveis Duplicados` só
    /// sai para aprovação ou cancelamento.
    pub fn allowed_targets(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Liberacao => &[EmSeparacao, PagamentoPendente, Cancelado, Deletado],
            PossiveisDuplicados => &[EmSeparacao, Cancelado, Deletado],
            EmSeparacao => &[EmTransito, PagamentoPendente, Cancelado, Deletado],
            EmTransito => &[Entregue, ConfirmarEntrega, PagamentoPendente, Cancelado, Deletado],
            Entregue => &[PagamentoPendente, Completo, Cancelado, Deletado],
            ConfirmarEntrega => &[Entregue, PagamentoPendente, Completo, Cancelado, Deletado],
            PagamentoPendente => &[Completo, Cancelado, Deletado],
            Completo => &[Deletado],
            Cancelado => &[Deletado],
            Deletado => &[],
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        self.allowed_targets().contains(&to)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Histórico de cobrança ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingEntry {
    #[schema(example = "12/04/2024 14:32")]
    pub date: String,
    #[schema(example = "Status atualizado para: Em Separação")]
    pub note: String,
    pub status_at_time: OrderStatus,
}

// --- Pedido ---
//
// As datas legadas (venda, negociação, recebimento, atualização dos
// Correios) circulam como texto "DD/MM/YYYY" vindo das planilhas; a
// interpretação fica em `common::br`. Campo vazio significa ausente.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[schema(example = "V1712345678901")]
    pub id: String,
    /// Ordem de criação na coleção; desempates de ordenação são estáveis
    /// em relação a ela.
    pub seq: u64,
    #[schema(example = "07/03/2024")]
    pub sale_date: String,
    pub customer_name: String,
    #[schema(example = "11999999999")]
    pub customer_phone: String,
    pub customer_document: String,
    pub customer_address: String,
    pub zap: String,
    #[schema(example = "Potencia Azul - Kit 3 Gel")]
    pub offer_ref: String,
    #[schema(example = "297.00")]
    pub sale_value: Decimal,
    pub received_value: Decimal,
    pub sale_status: OrderStatus,
    /// Espelho de `sale_status`, mantido igual em toda escrita (campo
    /// legado que as planilhas exportadas ainda leem).
    pub legacy_status: OrderStatus,
    pub seller_name: String,
    pub operator_name: String,
    pub tracking_code: String,
    pub carrier_status: String,
    pub carrier_status_at: String,
    pub negotiation_date: String,
    pub receipt_date: String,
    pub payment_method: String,
    #[schema(example = "07/03/2024 10:15")]
    pub last_updated_at: String,
    pub billing_history: Vec<BillingEntry>,
}

impl Order {
    /// Lei do preenchimento automático: pedido "Completo" sem valor
    /// recebido registrado vale o valor da venda para qualquer leitor.
    pub fn effective_received_value(&self) -> Decimal {
        if self.sale_status == OrderStatus::Completo && self.received_value.is_zero() {
            self.sale_value
        } else {
            self.received_value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn pedido_base() -> Order {
        Order {
            id: "V1".to_string(),
            seq: 1,
            sale_date: "01/03/2024".to_string(),
            customer_name: "Maria Souza".to_string(),
            customer_phone: "11999999999".to_string(),
            customer_document: "12345678901".to_string(),
            customer_address: "Rua A, 10, Centro, São Paulo, SP, 01000000".to_string(),
            zap: "11999999999".to_string(),
            offer_ref: "Potencia Azul - Kit 3 Gel".to_string(),
            sale_value: Decimal::from_str("297.00").unwrap(),
            received_value: Decimal::ZERO,
            sale_status: OrderStatus::Liberacao,
            legacy_status: OrderStatus::Liberacao,
            seller_name: "Maria".to_string(),
            operator_name: String::new(),
            tracking_code: String::new(),
            carrier_status: String::new(),
            carrier_status_at: String::new(),
            negotiation_date: String::new(),
            receipt_date: String::new(),
            payment_method: String::new(),
            last_updated_at: "01/03/2024 09:00".to_string(),
            billing_history: Vec::new(),
        }
    }

    #[test]
    fn deletado_e_terminal() {
        for to in [
            OrderStatus::Liberacao,
            OrderStatus::EmSeparacao,
            OrderStatus::Completo,
            OrderStatus::Cancelado,
        ] {
            assert!(!OrderStatus::Deletado.can_transition_to(to));
        }
    }

    #[test]
    fn fluxo_logistico_segue_a_tabela() {
        assert!(OrderStatus::Liberacao.can_transition_to(OrderStatus::EmSeparacao));
        assert!(OrderStatus::EmSeparacao.can_transition_to(OrderStatus::EmTransito));
        assert!(OrderStatus::EmTransito.can_transition_to(OrderStatus::Entregue));
        // Trânsito exige passar pela separação.
        assert!(!OrderStatus::Liberacao.can_transition_to(OrderStatus::EmTransito));
        // Duplicado só sai para aprovação ou cancelamento (e soft delete).
        assert!(OrderStatus::PossiveisDuplicados.can_transition_to(OrderStatus::EmSeparacao));
        assert!(OrderStatus::PossiveisDuplicados.can_transition_to(OrderStatus::Cancelado));
        assert!(!OrderStatus::PossiveisDuplicados.can_transition_to(OrderStatus::EmTransito));
    }

    #[test]
    fn parse_tolerante_e_apelidos_legados() {
        assert_eq!(OrderStatus::parse("completo"), Some(OrderStatus::Completo));
        assert_eq!(OrderStatus::parse("EM SEPARACAO"), Some(OrderStatus::EmSeparacao));
        assert_eq!(OrderStatus::parse("Pendente"), Some(OrderStatus::Liberacao));
        assert_eq!(
            OrderStatus::parse("Aguardando Aprovação"),
            Some(OrderStatus::PossiveisDuplicados)
        );
        assert_eq!(OrderStatus::parse("qualquer coisa"), None);
    }

    #[test]
    fn completo_sem_recebido_vale_o_valor_da_venda() {
        let mut pedido = pedido_base();
        pedido.sale_status = OrderStatus::Completo;
        pedido.legacy_status = OrderStatus::Completo;
        assert_eq!(pedido.effective_received_value(), pedido.sale_value);

        // Com valor registrado, nada de preenchimento automático.
        pedido.received_value = Decimal::from_str("100.00").unwrap();
        assert_eq!(
            pedido.effective_received_value(),
            Decimal::from_str("100.00").unwrap()
        );

        // Em outros estados o zero é zero mesmo.
        let pendente = pedido_base();
        assert_eq!(pendente.effective_received_value(), Decimal::ZERO);
    }

    #[test]
    fn pedido_sobrevive_a_ida_e_volta_pelo_formato_persistido() {
        let mut pedido = pedido_base();
        pedido.billing_history.push(BillingEntry {
            date: "02/03/2024 08:00".to_string(),
            note: "Status atualizado para: Em Separação".to_string(),
            status_at_time: OrderStatus::EmSeparacao,
        });
        let json = serde_json::to_string(&pedido).unwrap();
        let de_volta: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(pedido, de_volta);

        // O formato persistido usa os rótulos de exibição.
        assert!(json.contains("\"Liberação\""));
        assert!(json.contains("\"saleValue\""));
    }
}
