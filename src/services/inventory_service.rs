// src/services/inventory_service.rs

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::InventoryRepo,
    models::inventory::{
        generate_transaction_id, InventoryItem, InventoryLevels, InventoryStats,
        InventoryTransaction, TransactionType, VariationType,
    },
    models::order::Order,
    services::catalog_service::CatalogService,
};

/// Rascunho de lançamento: o razão atribui id e instante.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub variation_type: VariationType,
    pub quantity: i64,
    pub transaction_type: TransactionType,
    pub order_id: Option<String>,
    pub notes: String,
    pub created_by: String,
    /// Compras podem atualizar o custo unitário do item.
    pub cost_per_unit: Option<Decimal>,
}

/// Filtros de consulta do extrato do razão.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub variation_type: Option<VariationType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct InventoryService {
    repo: InventoryRepo,
    catalog: CatalogService,
}

impl InventoryService {
    pub fn new(repo: InventoryRepo, catalog: CatalogService) -> Self {
        Self { repo, catalog }
    }

    pub fn list_items(&self) -> Result<Vec<InventoryItem>, AppError> {
        Ok(self.repo.list_items()?)
    }

    /// Lança uma entrada no razão e aplica a quantidade ao saldo do SKU.
    pub fn post(&self, draft: TransactionDraft) -> Result<InventoryTransaction, AppError> {
        let tx = InventoryTransaction {
            id: generate_transaction_id(),
            date: Utc::now(),
            variation_type: draft.variation_type,
            quantity: draft.quantity,
            transaction_type: draft.transaction_type,
            order_id: draft.order_id,
            notes: draft.notes,
            created_by: draft.created_by,
        };
        let mut item = self.repo.post(&tx)?;

        if let Some(cost) = draft.cost_per_unit {
            item.cost_per_unit = cost;
            self.repo.save_item(&item)?;
        }

        Ok(tx)
    }

    pub fn would_go_negative(&self, sku: VariationType, delta: i64) -> Result<bool, AppError> {
        let current = self
            .repo
            .get_item(sku)?
            .map(|item| item.quantity)
            .unwrap_or(0);
        Ok(current + delta < 0)
    }

    /// Ajuste manual, recusado antes de qualquer mutação se deixaria o
    /// saldo negativo.
    pub fn adjust(
        &self,
        sku: VariationType,
        delta: i64,
        notes: String,
        actor: String,
    ) -> Result<InventoryTransaction, AppError> {
        if self.would_go_negative(sku, delta)? {
            let current = self
                .repo
                .get_item(sku)?
                .map(|item| item.quantity)
                .unwrap_or(0);
            return Err(AppError::NegativeInventory {
                sku: sku.as_str().to_string(),
                current,
                delta,
            });
        }

        self.post(TransactionDraft {
            variation_type: sku,
            quantity: delta,
            transaction_type: TransactionType::Adjustment,
            order_id: None,
            notes,
            created_by: actor,
            cost_per_unit: None,
        })
    }

    /// Debita o estoque consumido por uma venda: um lançamento SALE
    /// negativo por SKU com quantidade > 0 na composição da oferta.
    ///
    /// Oferta que não resolve mais (renomeada/removida depois da venda) é
    /// um problema de qualidade de dados históricos: registra warning e
    /// não lança nada. Venda NÃO passa pelo guarda de saldo: a venda já
    /// aconteceu; estoque negativo aparece nos indicadores.
    pub fn process_sale_for_order(&self, order: &Order) -> Result<(), AppError> {
        let resolved = match self.catalog.resolve_offer(&order.offer_ref) {
            Ok(resolved) => resolved,
            Err(AppError::NotFound(_)) => {
                tracing::warn!(
                    "Pedido {} referencia oferta desconhecida '{}'; estoque não debitado",
                    order.id,
                    order.offer_ref
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let consumption = [
            (VariationType::Gel, resolved.offer.gel_quantity),
            (VariationType::Capsulas, resolved.offer.capsulas_quantity),
        ];

        for (sku, count) in consumption {
            if count == 0 {
                continue;
            }
            let delta = -i64::from(count);
            if self.would_go_negative(sku, delta)? {
                tracing::warn!(
                    "Venda {} deixa o estoque de {} negativo",
                    order.id,
                    sku
                );
            }
            self.post(TransactionDraft {
                variation_type: sku,
                quantity: delta,
                transaction_type: TransactionType::Sale,
                order_id: Some(order.id.clone()),
                notes: format!("Pedido #{}: {}", order.id, resolved.display_name),
                created_by: "system".to_string(),
                cost_per_unit: None,
            })?;
        }

        Ok(())
    }

    pub fn levels(&self) -> Result<InventoryLevels, AppError> {
        let mut levels = InventoryLevels {
            gel: 0,
            capsulas: 0,
        };
        for item in self.repo.list_items()? {
            match item.variation_type {
                VariationType::Gel => levels.gel = item.quantity,
                VariationType::Capsulas => levels.capsulas = item.quantity,
            }
        }
        Ok(levels)
    }

    pub fn stats(&self) -> Result<InventoryStats, AppError> {
        let items = self.repo.list_items()?;
        let transactions = self.repo.list_transactions()?;

        let mut total_items = 0i64;
        let mut total_value = Decimal::ZERO;
        let mut low_stock_items = 0usize;

        for item in &items {
            total_items += item.quantity;
            total_value += Decimal::from(item.quantity) * item.cost_per_unit;
            if item.quantity <= item.minimum_level {
                low_stock_items += 1;
            }
        }

        // SKU mais vendido pela soma absoluta dos lançamentos de venda.
        let mut gel_sold = 0i64;
        let mut capsulas_sold = 0i64;
        for tx in &transactions {
            if tx.transaction_type == TransactionType::Sale {
                match tx.variation_type {
                    VariationType::Gel => gel_sold += tx.quantity.abs(),
                    VariationType::Capsulas => capsulas_sold += tx.quantity.abs(),
                }
            }
        }
        let most_sold_variation = if gel_sold == 0 && capsulas_sold == 0 {
            None
        } else if gel_sold >= capsulas_sold {
            Some(VariationType::Gel)
        } else {
            Some(VariationType::Capsulas)
        };

        Ok(InventoryStats {
            total_items,
            low_stock_items,
            total_value,
            most_sold_variation,
        })
    }

    /// Extrato filtrado, mais recente primeiro.
    pub fn list_transactions(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<InventoryTransaction>, AppError> {
        let mut txs = self.repo.list_transactions()?;
        txs.retain(|tx| {
            if let Some(kind) = filter.transaction_type {
                if tx.transaction_type != kind {
                    return false;
                }
            }
            if let Some(sku) = filter.variation_type {
                if tx.variation_type != sku {
                    return false;
                }
            }
            if let Some(from) = filter.from {
                if tx.date.date_naive() < from {
                    return false;
                }
            }
            if let Some(to) = filter.to {
                if tx.date.date_naive() > to {
                    return false;
                }
            }
            true
        });
        txs.reverse();
        Ok(txs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{OrdersRepo, ProductsRepo, Store};
    use crate::models::order::OrderStatus;
    use std::str::FromStr;

    fn setup() -> (InventoryService, CatalogService) {
        let store = Store::open_in_memory().unwrap();
        let catalog = CatalogService::new(
            ProductsRepo::new(store.clone()),
            OrdersRepo::new(store.clone()),
        );
        let service = InventoryService::new(InventoryRepo::new(store), catalog.clone());
        (service, catalog)
    }

    fn pedido(id: &str, offer_ref: &str) -> Order {
        Order {
            id: id.to_string(),
            seq: 0,
            sale_date: "01/03/2024".to_string(),
            customer_name: "Cliente".to_string(),
            customer_phone: "11988887777".to_string(),
            customer_document: String::new(),
            customer_address: String::new(),
            zap: String::new(),
            offer_ref: offer_ref.to_string(),
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
            last_updated_at: String::new(),
            billing_history: Vec::new(),
        }
    }

    fn oferta_gel_2(catalog: &CatalogService) {
        let product = catalog.create_product("Potencia Azul", None, true).unwrap();
        catalog
            .add_offer(
                &product.id,
                "Kit 2 Gel",
                None,
                Decimal::from_str("197.00").unwrap(),
                true,
                2,
                0,
            )
            .unwrap();
    }

    #[test]
    fn venda_debita_um_lancamento_por_sku_consumido() {
        let (service, catalog) = setup();
        oferta_gel_2(&catalog);

        service
            .process_sale_for_order(&pedido("V1", "Potencia Azul - Kit 2 Gel"))
            .unwrap();

        let txs = service.list_transactions(TransactionFilter::default()).unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].variation_type, VariationType::Gel);
        assert_eq!(txs[0].quantity, -2);
        assert_eq!(txs[0].transaction_type, TransactionType::Sale);
        assert_eq!(txs[0].order_id.as_deref(), Some("V1"));

        let levels = service.levels().unwrap();
        assert_eq!(levels.gel, -2);
        assert_eq!(levels.capsulas, 0);
    }

    #[test]
    fn oferta_desconhecida_nao_lanca_nada_nem_falha() {
        let (service, _) = setup();
        service
            .process_sale_for_order(&pedido("V9", "Oferta Removida - Kit"))
            .unwrap();
        assert!(service
            .list_transactions(TransactionFilter::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn saldo_do_item_e_sempre_a_soma_dos_lancamentos() {
        let (service, _) = setup();
        let lancamentos = [60i64, -15, 10, -5];
        for (i, qty) in lancamentos.iter().enumerate() {
            service
                .post(TransactionDraft {
                    variation_type: VariationType::Capsulas,
                    quantity: *qty,
                    transaction_type: if *qty > 0 {
                        TransactionType::Purchase
                    } else {
                        TransactionType::Sale
                    },
                    order_id: None,
                    notes: format!("lançamento {i}"),
                    created_by: "teste".to_string(),
                    cost_per_unit: None,
                })
                .unwrap();
        }

        let soma: i64 = service
            .list_transactions(TransactionFilter::default())
            .unwrap()
            .iter()
            .map(|t| t.quantity)
            .sum();
        assert_eq!(soma, 50);
        assert_eq!(service.levels().unwrap().capsulas, 50);
    }

    #[test]
    fn ajuste_negativo_e_recusado_antes_de_qualquer_mutacao() {
        let (service, _) = setup();
        service
            .post(TransactionDraft {
                variation_type: VariationType::Gel,
                quantity: 10,
                transaction_type: TransactionType::Purchase,
                order_id: None,
                notes: "compra".to_string(),
                created_by: "teste".to_string(),
                cost_per_unit: Some(Decimal::from_str("25.50").unwrap()),
            })
            .unwrap();

        let err = service
            .adjust(VariationType::Gel, -11, "quebra".to_string(), "teste".to_string())
            .unwrap_err();
        assert!(matches!(err, AppError::NegativeInventory { .. }));

        // Nada foi lançado e o saldo ficou intacto.
        assert_eq!(service.levels().unwrap().gel, 10);
        assert_eq!(
            service
                .list_transactions(TransactionFilter::default())
                .unwrap()
                .len(),
            1
        );

        // Ajuste dentro do saldo passa.
        service
            .adjust(VariationType::Gel, -10, "quebra".to_string(), "teste".to_string())
            .unwrap();
        assert_eq!(service.levels().unwrap().gel, 0);
    }

    #[test]
    fn venda_pode_estourar_o_saldo() {
        let (service, catalog) = setup();
        oferta_gel_2(&catalog);

        // Sem estoque nenhum: a venda ainda é registrada.
        service
            .process_sale_for_order(&pedido("V1", "Potencia Azul - Kit 2 Gel"))
            .unwrap();
        assert_eq!(service.levels().unwrap().gel, -2);
    }

    #[test]
    fn estatisticas_contam_estoque_baixo_e_mais_vendido() {
        let (service, catalog) = setup();
        oferta_gel_2(&catalog);

        service
            .post(TransactionDraft {
                variation_type: VariationType::Gel,
                quantity: 30,
                transaction_type: TransactionType::Purchase,
                order_id: None,
                notes: "compra".to_string(),
                created_by: "teste".to_string(),
                cost_per_unit: Some(Decimal::from_str("10.00").unwrap()),
            })
            .unwrap();
        service
            .post(TransactionDraft {
                variation_type: VariationType::Capsulas,
                quantity: 200,
                transaction_type: TransactionType::Purchase,
                order_id: None,
                notes: "compra".to_string(),
                created_by: "teste".to_string(),
                cost_per_unit: Some(Decimal::from_str("5.00").unwrap()),
            })
            .unwrap();
        service
            .process_sale_for_order(&pedido("V1", "Potencia Azul - Kit 2 Gel"))
            .unwrap();

        let stats = service.stats().unwrap();
        // gel: 30 - 2 = 28 (abaixo do mínimo padrão 50); capsulas: 200.
        assert_eq!(stats.total_items, 228);
        assert_eq!(stats.low_stock_items, 1);
        assert_eq!(stats.total_value, Decimal::from_str("1280.00").unwrap());
        assert_eq!(stats.most_sold_variation, Some(VariationType::Gel));
    }

    #[test]
    fn extrato_filtra_por_tipo_e_sku() {
        let (service, _) = setup();
        service
            .post(TransactionDraft {
                variation_type: VariationType::Gel,
                quantity: 10,
                transaction_type: TransactionType::Purchase,
                order_id: None,
                notes: "compra".to_string(),
                created_by: "teste".to_string(),
                cost_per_unit: None,
            })
            .unwrap();
        service
            .adjust(VariationType::Gel, -1, "quebra".to_string(), "teste".to_string())
            .unwrap();

        let compras = service
            .list_transactions(TransactionFilter {
                transaction_type: Some(TransactionType::Purchase),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(compras.len(), 1);

        let capsulas = service
            .list_transactions(TransactionFilter {
                variation_type: Some(VariationType::Capsulas),
                ..Default::default()
            })
            .unwrap();
        assert!(capsulas.is_empty());
    }
}
