// src/services/catalog_service.rs

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{OrdersRepo, ProductsRepo},
    models::product::{Offer, Product, ResolvedOffer},
};

/// Resultado da remoção de oferta: em uso ela é apenas inativada.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfferDeletion {
    pub removed: bool,
    pub inactivated: bool,
}

#[derive(Clone)]
pub struct CatalogService {
    products: ProductsRepo,
    orders: OrdersRepo,
}

impl CatalogService {
    pub fn new(products: ProductsRepo, orders: OrdersRepo) -> Self {
        Self { products, orders }
    }

    pub fn list_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.products.list()?)
    }

    pub fn create_product(
        &self,
        name: &str,
        description: Option<String>,
        active: bool,
    ) -> Result<Product, AppError> {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description,
            active,
            offers: Vec::new(),
        };
        self.products.save(&product)?;
        Ok(product)
    }

    /// Atualiza o produto. Renomear o produto muda o nome de exibição de
    /// todas as suas ofertas, então os pedidos existentes são reescritos
    /// para a nova referência.
    pub fn update_product(
        &self,
        product_id: &str,
        name: Option<String>,
        description: Option<String>,
        active: Option<bool>,
    ) -> Result<Product, AppError> {
        let mut product = self.get_product(product_id)?;
        let old_name = product.name.clone();

        if let Some(new_name) = name {
            product.name = new_name;
        }
        if let Some(desc) = description {
            product.description = Some(desc);
        }
        if let Some(flag) = active {
            product.active = flag;
        }

        self.products.save(&product)?;

        if product.name != old_name {
            for offer in &product.offers {
                let old_display = format!("{} - {}", old_name, offer.name);
                let new_display = product.display_name(offer);
                let rewritten = self.orders.rewrite_offer_refs(&old_display, &new_display)?;
                if rewritten > 0 {
                    tracing::info!(
                        "Referências de oferta atualizadas: '{}' -> '{}' ({} pedido(s))",
                        old_display,
                        new_display,
                        rewritten
                    );
                }
            }
        }

        Ok(product)
    }

    /// Soft delete: o produto some das listagens ativas mas o histórico
    /// dos pedidos continua resolvendo o nome.
    pub fn soft_delete_product(&self, product_id: &str) -> Result<Product, AppError> {
        let mut product = self.get_product(product_id)?;
        product.active = false;
        self.products.save(&product)?;
        Ok(product)
    }

    pub fn add_offer(
        &self,
        product_id: &str,
        name: &str,
        description: Option<String>,
        price: rust_decimal::Decimal,
        active: bool,
        gel_quantity: u32,
        capsulas_quantity: u32,
    ) -> Result<Offer, AppError> {
        let mut product = self.get_product(product_id)?;
        let offer = Offer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description,
            price,
            active,
            gel_quantity,
            capsulas_quantity,
            in_use: false,
        };
        product.offers.push(offer.clone());
        self.products.save(&product)?;
        Ok(offer)
    }

    /// Atualiza uma oferta. Se o nome mudou, os pedidos que usavam o nome
    /// de exibição antigo são reescritos para o novo.
    pub fn update_offer(
        &self,
        product_id: &str,
        offer_id: &str,
        name: Option<String>,
        description: Option<String>,
        price: Option<rust_decimal::Decimal>,
        active: Option<bool>,
        gel_quantity: Option<u32>,
        capsulas_quantity: Option<u32>,
    ) -> Result<Offer, AppError> {
        let mut product = self.get_product(product_id)?;
        let product_name = product.name.clone();

        let offer = product
            .offers
            .iter_mut()
            .find(|o| o.id == offer_id)
            .ok_or_else(|| AppError::NotFound(format!("Oferta '{offer_id}'")))?;

        let old_display = format!("{} - {}", product_name, offer.name);

        if let Some(new_name) = name {
            offer.name = new_name;
        }
        if let Some(desc) = description {
            offer.description = Some(desc);
        }
        if let Some(new_price) = price {
            offer.price = new_price;
        }
        if let Some(flag) = active {
            offer.active = flag;
        }
        if let Some(qty) = gel_quantity {
            offer.gel_quantity = qty;
        }
        if let Some(qty) = capsulas_quantity {
            offer.capsulas_quantity = qty;
        }

        let new_display = format!("{} - {}", product_name, offer.name);
        let updated = offer.clone();

        self.products.save(&product)?;

        if new_display != old_display {
            let rewritten = self.orders.rewrite_offer_refs(&old_display, &new_display)?;
            if rewritten > 0 {
                tracing::info!(
                    "Referências de oferta atualizadas: '{}' -> '{}' ({} pedido(s))",
                    old_display,
                    new_display,
                    rewritten
                );
            }
        }

        Ok(updated)
    }

    /// Remove uma oferta sem uso; oferta referenciada por algum pedido é
    /// apenas inativada (e marcada `in_use`). Repetir a operação numa
    /// oferta em uso continua deixando um único registro inativo.
    pub fn delete_offer(
        &self,
        product_id: &str,
        offer_id: &str,
    ) -> Result<OfferDeletion, AppError> {
        let mut product = self.get_product(product_id)?;
        let orders = self.orders.list()?;

        let position = product
            .offers
            .iter()
            .position(|o| o.id == offer_id)
            .ok_or_else(|| AppError::NotFound(format!("Oferta '{offer_id}'")))?;

        let display = product.display_name(&product.offers[position]);
        let in_use = orders.iter().any(|o| o.offer_ref == display);

        let outcome = if in_use {
            let offer = &mut product.offers[position];
            offer.active = false;
            offer.in_use = true;
            OfferDeletion {
                removed: false,
                inactivated: true,
            }
        } else {
            product.offers.remove(position);
            OfferDeletion {
                removed: true,
                inactivated: false,
            }
        };

        self.products.save(&product)?;
        Ok(outcome)
    }

    /// Recalcula `in_use` de todas as ofertas contra a coleção de pedidos.
    pub fn recompute_in_use_flags(&self) -> Result<(), AppError> {
        let orders = self.orders.list()?;
        for mut product in self.products.list()? {
            let mut changed = false;
            let product_name = product.name.clone();
            for offer in &mut product.offers {
                let display = format!("{} - {}", product_name, offer.name);
                let in_use = orders.iter().any(|o| o.offer_ref == display);
                if offer.in_use != in_use {
                    offer.in_use = in_use;
                    changed = true;
                }
            }
            if changed {
                self.products.save(&product)?;
            }
        }
        Ok(())
    }

    /// Ofertas vendáveis: produto ativo E oferta ativa.
    pub fn list_active_offers(&self) -> Result<Vec<ResolvedOffer>, AppError> {
        self.recompute_in_use_flags()?;
        let mut out = Vec::new();
        for product in self.products.list()? {
            if !product.active {
                continue;
            }
            for offer in &product.offers {
                if offer.active {
                    out.push(ResolvedOffer {
                        product_id: product.id.clone(),
                        product_name: product.name.clone(),
                        display_name: product.display_name(offer),
                        offer: offer.clone(),
                    });
                }
            }
        }
        Ok(out)
    }

    /// Resolve uma referência de oferta (id ou nome de exibição
    /// "Produto - Oferta") para a oferta e seu contexto.
    pub fn resolve_offer(&self, reference: &str) -> Result<ResolvedOffer, AppError> {
        for product in self.products.list()? {
            for offer in &product.offers {
                if offer.id == reference || product.display_name(offer) == reference {
                    return Ok(ResolvedOffer {
                        product_id: product.id.clone(),
                        product_name: product.name.clone(),
                        display_name: product.display_name(offer),
                        offer: offer.clone(),
                    });
                }
            }
        }
        Err(AppError::NotFound(format!("Oferta '{reference}'")))
    }

    fn get_product(&self, product_id: &str) -> Result<Product, AppError> {
        self.products
            .get(product_id)?
            .ok_or_else(|| AppError::NotFound(format!("Produto '{product_id}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::models::order::{Order, OrderStatus};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn setup() -> (CatalogService, OrdersRepo) {
        let store = Store::open_in_memory().unwrap();
        let products = ProductsRepo::new(store.clone());
        let orders = OrdersRepo::new(store);
        (CatalogService::new(products, orders.clone()), orders)
    }

    fn pedido_com_oferta(id: &str, offer_ref: &str) -> Order {
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

    #[test]
    fn resolve_por_id_e_por_nome_de_exibicao() {
        let (catalog, _) = setup();
        let product = catalog
            .create_product("Potencia Azul", None, true)
            .unwrap();
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

        let por_id = catalog.resolve_offer(&offer.id).unwrap();
        assert_eq!(por_id.display_name, "Potencia Azul - Kit 3 Gel");

        let por_nome = catalog.resolve_offer("Potencia Azul - Kit 3 Gel").unwrap();
        assert_eq!(por_nome.offer.id, offer.id);

        assert!(matches!(
            catalog.resolve_offer("Inexistente"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn renomear_oferta_reescreve_pedidos() {
        let (catalog, orders) = setup();
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

        let mut pedido = pedido_com_oferta("V1", "Potencia Azul - Kit 3 Gel");
        orders.insert_new(&mut pedido).unwrap();

        catalog
            .update_offer(
                &product.id,
                &offer.id,
                Some("Kit Trio Gel".to_string()),
                None,
                None,
                None,
                None,
                None,
            )
            .unwrap();

        let relido = orders.get("V1").unwrap().unwrap();
        assert_eq!(relido.offer_ref, "Potencia Azul - Kit Trio Gel");
    }

    #[test]
    fn renomear_produto_reescreve_pedidos() {
        let (catalog, orders) = setup();
        let product = catalog.create_product("Potencia Azul", None, true).unwrap();
        catalog
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

        let mut pedido = pedido_com_oferta("V1", "Potencia Azul - Kit 3 Gel");
        orders.insert_new(&mut pedido).unwrap();

        catalog
            .update_product(&product.id, Some("Potencia Max".to_string()), None, None)
            .unwrap();

        let relido = orders.get("V1").unwrap().unwrap();
        assert_eq!(relido.offer_ref, "Potencia Max - Kit 3 Gel");
    }

    #[test]
    fn deletar_oferta_em_uso_e_idempotente() {
        let (catalog, orders) = setup();
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

        let mut pedido = pedido_com_oferta("V1", "Potencia Azul - Kit 3 Gel");
        orders.insert_new(&mut pedido).unwrap();

        let primeira = catalog.delete_offer(&product.id, &offer.id).unwrap();
        assert!(primeira.inactivated && !primeira.removed);

        let segunda = catalog.delete_offer(&product.id, &offer.id).unwrap();
        assert!(segunda.inactivated && !segunda.removed);

        // Continua existindo exatamente um registro, inativo e em uso.
        let relido = catalog.list_products().unwrap();
        let ofertas: Vec<_> = relido
            .iter()
            .flat_map(|p| p.offers.iter())
            .filter(|o| o.id == offer.id)
            .collect();
        assert_eq!(ofertas.len(), 1);
        assert!(!ofertas[0].active);
        assert!(ofertas[0].in_use);
    }

    #[test]
    fn oferta_sem_uso_e_removida_de_verdade() {
        let (catalog, _) = setup();
        let product = catalog.create_product("Potencia Azul", None, true).unwrap();
        let offer = catalog
            .add_offer(
                &product.id,
                "Kit 1 Gel",
                None,
                Decimal::from_str("97.00").unwrap(),
                true,
                1,
                0,
            )
            .unwrap();

        let outcome = catalog.delete_offer(&product.id, &offer.id).unwrap();
        assert!(outcome.removed && !outcome.inactivated);
        assert!(matches!(
            catalog.resolve_offer(&offer.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn ofertas_ativas_exigem_produto_e_oferta_ativos() {
        let (catalog, _) = setup();
        let ativo = catalog.create_product("Potencia Azul", None, true).unwrap();
        catalog
            .add_offer(
                &ativo.id,
                "Kit 3 Gel",
                None,
                Decimal::from_str("297.00").unwrap(),
                true,
                3,
                0,
            )
            .unwrap();
        catalog
            .add_offer(
                &ativo.id,
                "Kit Antigo",
                None,
                Decimal::from_str("150.00").unwrap(),
                false,
                1,
                0,
            )
            .unwrap();

        let inativo = catalog.create_product("Linha Velha", None, true).unwrap();
        catalog
            .add_offer(
                &inativo.id,
                "Kit X",
                None,
                Decimal::from_str("50.00").unwrap(),
                true,
                0,
                1,
            )
            .unwrap();
        catalog.soft_delete_product(&inativo.id).unwrap();

        let ativos = catalog.list_active_offers().unwrap();
        assert_eq!(ativos.len(), 1);
        assert_eq!(ativos[0].display_name, "Potencia Azul - Kit 3 Gel");
    }
}
