// src/services/order_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::br::{now_br, today_br},
    common::error::AppError,
    common::events::{ChangeEntity, ChangeEvent, EventBus},
    db::OrdersRepo,
    models::auth::Viewer,
    models::order::{BillingEntry, Order, OrderStatus},
    services::catalog_service::CatalogService,
    services::duplicate_service::{self, DuplicateCheck},
    services::inventory_service::InventoryService,
};

/// Dados de um pedido novo vindos do formulário do vendedor. O id vem de
/// quem chama e nunca é reaproveitado.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_document: String,
    pub customer_address: String,
    pub offer_reference: String,
    pub negotiation_date: Option<String>,
    pub seller_name: String,
}

/// Indicadores agregados sobre um recorte de pedidos.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: usize,
    #[schema(example = "12500.00")]
    pub total_amount: Decimal,
    #[schema(example = "9800.00")]
    pub total_paid: Decimal,
    /// total_paid / total_amount (0 quando não há valor vendido).
    pub payment_rate: Decimal,
    pub status_counts: HashMap<String, usize>,
}

/// Agrega um conjunto de pedidos (já projetado para quem consulta).
/// O recebido usa a lei do preenchimento automático: "Completo" sem valor
/// registrado conta pelo valor da venda.
pub fn summarize(orders: &[Order]) -> OrderStats {
    let mut total_amount = Decimal::ZERO;
    let mut total_paid = Decimal::ZERO;
    let mut status_counts: HashMap<String, usize> = HashMap::new();

    for order in orders {
        total_amount += order.sale_value;
        total_paid += order.effective_received_value();
        *status_counts
            .entry(order.sale_status.as_str().to_string())
            .or_insert(0) += 1;
    }

    let payment_rate = if total_amount.is_zero() {
        Decimal::ZERO
    } else {
        total_paid / total_amount
    };

    OrderStats {
        total_orders: orders.len(),
        total_amount,
        total_paid,
        payment_rate,
        status_counts,
    }
}

#[derive(Clone)]
pub struct OrderService {
    orders: OrdersRepo,
    catalog: CatalogService,
    inventory: InventoryService,
    events: EventBus,
}

impl OrderService {
    pub fn new(
        orders: OrdersRepo,
        catalog: CatalogService,
        inventory: InventoryService,
        events: EventBus,
    ) -> Self {
        Self {
            orders,
            catalog,
            inventory,
            events,
        }
    }

    pub fn get(&self, id: &str) -> Result<Option<Order>, AppError> {
        Ok(self.orders.get(id)?)
    }

    pub fn list(&self) -> Result<Vec<Order>, AppError> {
        Ok(self.orders.list()?)
    }

    /// Cria um pedido: checa unicidade do id, roda o detector de
    /// duplicidade (duplicado entra em "Possíveis Duplicados" em vez do
    /// estado inicial normal, mas é persistido do mesmo jeito), resolve a
    /// oferta para precificar, e debita o estoque da composição vendida.
    pub fn create(&self, input: NewOrder) -> Result<(Order, DuplicateCheck), AppError> {
        if self.orders.get(&input.id)?.is_some() {
            return Err(AppError::DuplicateId(input.id));
        }

        let resolved = self.catalog.resolve_offer(&input.offer_reference)?;
        let existing = self.orders.list()?;
        let duplicate = duplicate_service::check(&input.customer_phone, resolved.offer.price, &existing);

        let initial_status = if duplicate.is_duplicate {
            OrderStatus::PossiveisDuplicados
        } else {
            OrderStatus::Liberacao
        };

        let mut order = Order {
            id: input.id,
            seq: 0,
            sale_date: today_br(),
            customer_name: input.customer_name,
            customer_phone: input.customer_phone.clone(),
            customer_document: input.customer_document,
            customer_address: input.customer_address,
            zap: input.customer_phone,
            offer_ref: resolved.display_name.clone(),
            sale_value: resolved.offer.price,
            received_value: Decimal::ZERO,
            sale_status: initial_status,
            legacy_status: initial_status,
            seller_name: input.seller_name,
            operator_name: String::new(),
            tracking_code: String::new(),
            carrier_status: String::new(),
            carrier_status_at: String::new(),
            negotiation_date: input.negotiation_date.unwrap_or_default(),
            receipt_date: String::new(),
            payment_method: String::new(),
            last_updated_at: now_br(),
            billing_history: Vec::new(),
        };

        self.orders.insert_new(&mut order)?;
        self.inventory.process_sale_for_order(&order)?;

        if duplicate.is_duplicate {
            tracing::info!(
                "Pedido {} marcado como possível duplicado ({} correspondência(s))",
                order.id,
                duplicate.matches.len()
            );
        }
        self.publish(initial_status);

        Ok((order, duplicate))
    }

    /// Transição de situação com seus efeitos colaterais, tudo na mesma
    /// escrita: preenchimento automático do recebido ao entrar em
    /// "Completo", entrada no histórico de cobrança, atualização do
    /// carimbo e do espelho legado.
    pub fn transition(
        &self,
        id: &str,
        to: OrderStatus,
        note: Option<String>,
        viewer: &Viewer,
    ) -> Result<Order, AppError> {
        if to == OrderStatus::Deletado && !viewer.is_admin() {
            return Err(AppError::Forbidden(
                "Apenas administradores podem deletar pedidos.".to_string(),
            ));
        }

        let updated = self.orders.update_with(id, |order| {
            let from = order.sale_status;
            if !from.can_transition_to(to) {
                return Err(AppError::InvalidTransition {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }

            // Rejeitar um pedido pendente de aprovação exige motivo.
            let rejecting = to == OrderStatus::Cancelado
                && matches!(
                    from,
                    OrderStatus::Liberacao | OrderStatus::PossiveisDuplicados
                );
            let note_text = note.as_deref().map(str::trim).unwrap_or("");
            if rejecting && note_text.is_empty() {
                return Err(required_field_error(
                    "note",
                    "O motivo da rejeição é obrigatório.",
                ));
            }

            let entry_note = if note_text.is_empty() {
                format!("Status atualizado para: {to}")
            } else {
                note_text.to_string()
            };
            apply_status(order, to, entry_note);
            Ok(())
        })?;

        self.publish(to);
        Ok(updated)
    }

    /// Aprovação: vale tanto para "Liberação" quanto para a fila de
    /// possíveis duplicados.
    pub fn approve(&self, id: &str, viewer: &Viewer) -> Result<Order, AppError> {
        self.transition(
            id,
            OrderStatus::EmSeparacao,
            Some("Pedido aprovado".to_string()),
            viewer,
        )
    }

    pub fn reject(&self, id: &str, reason: &str, viewer: &Viewer) -> Result<Order, AppError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(required_field_error(
                "reason",
                "O motivo da rejeição é obrigatório.",
            ));
        }
        self.transition(
            id,
            OrderStatus::Cancelado,
            Some(format!("Pedido rejeitado: {reason}")),
            viewer,
        )
    }

    /// Anexa o código de rastreio; o pedido em separação segue para
    /// "Em Trânsito" na mesma escrita.
    pub fn attach_tracking(
        &self,
        id: &str,
        tracking_code: &str,
        _viewer: &Viewer,
    ) -> Result<Order, AppError> {
        let code = tracking_code.trim();
        if code.is_empty() {
            return Err(required_field_error(
                "trackingCode",
                "O código de rastreio é obrigatório.",
            ));
        }

        let updated = self.orders.update_with(id, |order| {
            let from = order.sale_status;
            if !from.can_transition_to(OrderStatus::EmTransito) {
                return Err(AppError::InvalidTransition {
                    from: from.to_string(),
                    to: OrderStatus::EmTransito.to_string(),
                });
            }
            order.tracking_code = code.to_string();
            apply_status(
                order,
                OrderStatus::EmTransito,
                format!("Código de rastreio anexado: {code}"),
            );
            Ok(())
        })?;

        self.publish(OrderStatus::EmTransito);
        Ok(updated)
    }

    /// Fronteira com o rastreador dos Correios: grava o texto e o carimbo
    /// reportados. Não passa pela máquina de estados.
    pub fn set_carrier_status(
        &self,
        id: &str,
        carrier_status: &str,
        reported_at: &str,
    ) -> Result<Order, AppError> {
        let updated = self.orders.update_with(id, |order| {
            order.carrier_status = carrier_status.to_string();
            order.carrier_status_at = reported_at.to_string();
            order.last_updated_at = now_br();
            Ok(())
        })?;

        let status = updated.sale_status;
        self.publish(status);
        Ok(updated)
    }

    fn publish(&self, status: OrderStatus) {
        self.events.publish(ChangeEvent {
            entity: ChangeEntity::Orders,
            status: Some(status),
        });
    }
}

fn apply_status(order: &mut Order, to: OrderStatus, note: String) {
    order.sale_status = to;
    order.legacy_status = to;

    // Preenchimento automático do recebível, exclusivo do "Completo".
    if to == OrderStatus::Completo && order.received_value.is_zero() {
        order.received_value = order.sale_value;
    }

    let now = now_br();
    order.billing_history.push(BillingEntry {
        date: now.clone(),
        note,
        status_at_time: to,
    });
    order.last_updated_at = now;
}

fn required_field_error(field: &'static str, message: &'static str) -> AppError {
    let mut error = ValidationError::new("required");
    error.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add(field.into(), error);
    AppError::ValidationError(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InventoryRepo, ProductsRepo, Store};
    use crate::models::auth::Role;
    use crate::services::inventory_service::TransactionFilter;
    use std::str::FromStr;

    fn setup() -> (OrderService, InventoryService, CatalogService) {
        let store = Store::open_in_memory().unwrap();
        let orders = OrdersRepo::new(store.clone());
        let catalog = CatalogService::new(ProductsRepo::new(store.clone()), orders.clone());
        let inventory = InventoryService::new(InventoryRepo::new(store), catalog.clone());
        let service = OrderService::new(
            orders,
            catalog.clone(),
            inventory.clone(),
            EventBus::new(),
        );
        (service, inventory, catalog)
    }

    fn admin() -> Viewer {
        Viewer {
            role: Role::Admin,
            name: "Admin".to_string(),
            email: "admin@empresa.com".to_string(),
        }
    }

    fn vendedora() -> Viewer {
        Viewer {
            role: Role::Vendedor,
            name: "Maria Oliveira".to_string(),
            email: "maria@empresa.com".to_string(),
        }
    }

    fn oferta(catalog: &CatalogService) -> String {
        let product = catalog.create_product("Potencia Azul", None, true).unwrap();
        let offer = catalog
            .add_offer(
                &product.id,
                "Kit 3 Gel",
                None,
                Decimal::from_str("297.00").unwrap(),
                true,
                3,
                0,
            )
            .unwrap();
        offer.id
    }

    fn novo_pedido(id: &str, phone: &str, offer_id: &str) -> NewOrder {
        NewOrder {
            id: id.to_string(),
            customer_name: "Cliente".to_string(),
            customer_phone: phone.to_string(),
            customer_document: "12345678901".to_string(),
            customer_address: "Rua A, 10, Centro, São Paulo, SP, 01000000".to_string(),
            offer_reference: offer_id.to_string(),
            negotiation_date: None,
            seller_name: "Maria Oliveira".to_string(),
        }
    }

    #[test]
    fn criar_pedido_precifica_pela_oferta_e_debita_estoque() {
        let (service, inventory, catalog) = setup();
        let offer_id = oferta(&catalog);

        let (pedido, dup) = service
            .create(novo_pedido("V1", "11999999999", &offer_id))
            .unwrap();
        assert!(!dup.is_duplicate);
        assert_eq!(pedido.sale_status, OrderStatus::Liberacao);
        assert_eq!(pedido.sale_value, Decimal::from_str("297.00").unwrap());
        assert_eq!(pedido.offer_ref, "Potencia Azul - Kit 3 Gel");

        // A composição da oferta (3 gel, 0 cápsulas) virou um único
        // lançamento SALE de -3 no SKU gel.
        let txs = inventory
            .list_transactions(TransactionFilter::default())
            .unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].quantity, -3);
    }

    #[test]
    fn id_de_pedido_nunca_e_reaproveitado() {
        let (service, _, catalog) = setup();
        let offer_id = oferta(&catalog);

        service
            .create(novo_pedido("V1", "11999999999", &offer_id))
            .unwrap();
        let err = service
            .create(novo_pedido("V1", "11000000000", &offer_id))
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateId(_)));
    }

    #[test]
    fn duplicado_entra_na_fila_de_aprovacao_mas_e_persistido() {
        let (service, _, catalog) = setup();
        let offer_id = oferta(&catalog);

        service
            .create(novo_pedido("V1", "11999999999", &offer_id))
            .unwrap();
        // Mesmo telefone, mesma oferta (mesmo valor): possível duplicado.
        let (pedido, dup) = service
            .create(novo_pedido("V2", "11999999999", &offer_id))
            .unwrap();
        assert!(dup.is_duplicate);
        assert_eq!(pedido.sale_status, OrderStatus::PossiveisDuplicados);
        assert!(service.get("V2").unwrap().is_some());
    }

    #[test]
    fn completar_preenche_o_recebido_e_registra_historico() {
        let (service, _, catalog) = setup();
        let offer_id = oferta(&catalog);
        service
            .create(novo_pedido("V1", "11999999999", &offer_id))
            .unwrap();

        let admin = admin();
        service.approve("V1", &admin).unwrap();
        service
            .transition("V1", OrderStatus::PagamentoPendente, None, &admin)
            .unwrap();
        let completo = service
            .transition("V1", OrderStatus::Completo, None, &admin)
            .unwrap();

        assert_eq!(completo.received_value, completo.sale_value);
        assert_eq!(completo.legacy_status, OrderStatus::Completo);
        // Aprovação + pagamento pendente + completo = 3 entradas.
        assert_eq!(completo.billing_history.len(), 3);
        assert_eq!(
            completo.billing_history.last().unwrap().status_at_time,
            OrderStatus::Completo
        );
    }

    #[test]
    fn completar_nao_sobrescreve_recebido_ja_registrado() {
        let (service, _, catalog) = setup();
        let offer_id = oferta(&catalog);
        service
            .create(novo_pedido("V1", "11999999999", &offer_id))
            .unwrap();

        let admin = admin();
        service.approve("V1", &admin).unwrap();
        service
            .transition("V1", OrderStatus::PagamentoPendente, None, &admin)
            .unwrap();

        // Simula recebimento parcial registrado por fora do fluxo.
        let parcial = service
            .orders
            .update_with("V1", |order| {
                order.received_value = Decimal::from_str("100.00").unwrap();
                Ok(())
            })
            .unwrap();
        assert_eq!(parcial.received_value, Decimal::from_str("100.00").unwrap());

        let completo = service
            .transition("V1", OrderStatus::Completo, None, &admin)
            .unwrap();
        assert_eq!(
            completo.received_value,
            Decimal::from_str("100.00").unwrap()
        );
    }

    #[test]
    fn deletado_e_terminal_e_exclusivo_de_admin() {
        let (service, _, catalog) = setup();
        let offer_id = oferta(&catalog);
        service
            .create(novo_pedido("V1", "11999999999", &offer_id))
            .unwrap();

        let err = service
            .transition("V1", OrderStatus::Deletado, None, &vendedora())
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let admin = admin();
        service
            .transition("V1", OrderStatus::Deletado, None, &admin)
            .unwrap();

        // Soft delete: o registro continua existindo.
        assert_eq!(
            service.get("V1").unwrap().unwrap().sale_status,
            OrderStatus::Deletado
        );

        // E não ressuscita.
        let err = service
            .transition("V1", OrderStatus::Liberacao, None, &admin)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn rejeicao_exige_motivo() {
        let (service, _, catalog) = setup();
        let offer_id = oferta(&catalog);
        service
            .create(novo_pedido("V1", "11999999999", &offer_id))
            .unwrap();

        let admin = admin();
        let err = service.reject("V1", "  ", &admin).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let rejeitado = service.reject("V1", "Cliente desistiu", &admin).unwrap();
        assert_eq!(rejeitado.sale_status, OrderStatus::Cancelado);
        assert!(rejeitado
            .billing_history
            .last()
            .unwrap()
            .note
            .contains("Cliente desistiu"));
    }

    #[test]
    fn rastreio_so_sai_da_separacao_e_leva_para_transito() {
        let (service, _, catalog) = setup();
        let offer_id = oferta(&catalog);
        service
            .create(novo_pedido("V1", "11999999999", &offer_id))
            .unwrap();

        let admin = admin();
        // Ainda em Liberação: não pode.
        let err = service
            .attach_tracking("V1", "BR123456789BR", &admin)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        service.approve("V1", &admin).unwrap();
        let em_transito = service
            .attach_tracking("V1", "BR123456789BR", &admin)
            .unwrap();
        assert_eq!(em_transito.sale_status, OrderStatus::EmTransito);
        assert_eq!(em_transito.tracking_code, "BR123456789BR");
    }

    #[test]
    fn resumo_conta_completos_sem_recebido_pelo_valor_da_venda() {
        let (service, _, catalog) = setup();
        let offer_id = oferta(&catalog);
        service
            .create(novo_pedido("V1", "11999999999", &offer_id))
            .unwrap();

        // Importado como "Completo" com recebido zerado (legado).
        let completo = service
            .orders
            .update_with("V1", |order| {
                order.sale_status = OrderStatus::Completo;
                order.legacy_status = OrderStatus::Completo;
                Ok(())
            })
            .unwrap();
        assert!(completo.received_value.is_zero());

        let stats = summarize(&service.list().unwrap());
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_paid, Decimal::from_str("297.00").unwrap());
        assert_eq!(stats.payment_rate, Decimal::ONE);
        assert_eq!(stats.status_counts.get("Completo"), Some(&1));
    }

    #[test]
    fn status_dos_correios_nao_mexe_na_maquina_de_estados() {
        let (service, _, catalog) = setup();
        let offer_id = oferta(&catalog);
        service
            .create(novo_pedido("V1", "11999999999", &offer_id))
            .unwrap();

        let atualizado = service
            .set_carrier_status("V1", "Objeto postado", "05/03/2024")
            .unwrap();
        assert_eq!(atualizado.carrier_status, "Objeto postado");
        assert_eq!(atualizado.carrier_status_at, "05/03/2024");
        assert_eq!(atualizado.sale_status, OrderStatus::Liberacao);
        // Sem entrada de histórico: não é transição.
        assert!(atualizado.billing_history.is_empty());
    }
}
