// src/config.rs

use std::{env, fs, path::Path};

use crate::{
    common::events::EventBus,
    db::{InventoryRepo, OrdersRepo, ProductsRepo, Store, ZapRepo},
    services::{
        catalog_service::CatalogService, import_service::ImportService,
        inventory_service::InventoryService, order_service::OrderService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub zap_repo: ZapRepo,
    pub catalog_service: CatalogService,
    pub inventory_service: InventoryService,
    pub order_service: OrderService,
    pub import_service: ImportService,
    pub events: EventBus,
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
        fs::create_dir_all(&data_dir)?;
        let store = Store::open(Path::new(&data_dir).join("vendas.redb"))?;

        tracing::info!("✅ Banco de dados aberto em {}/vendas.redb", data_dir);

        Ok(Self::build(store))
    }

    // Monta o grafo de dependências dos serviços.
    fn build(store: Store) -> Self {
        let events = EventBus::new();

        let orders_repo = OrdersRepo::new(store.clone());
        let products_repo = ProductsRepo::new(store.clone());
        let inventory_repo = InventoryRepo::new(store.clone());
        let zap_repo = ZapRepo::new(store);

        let catalog_service = CatalogService::new(products_repo, orders_repo.clone());
        let inventory_service = InventoryService::new(inventory_repo, catalog_service.clone());
        let order_service = OrderService::new(
            orders_repo.clone(),
            catalog_service.clone(),
            inventory_service.clone(),
            events.clone(),
        );
        let import_service = ImportService::new(orders_repo, events.clone());

        Self {
            zap_repo,
            catalog_service,
            inventory_service,
            order_service,
            import_service,
            events,
        }
    }

    /// Estado sobre um banco em memória, para os testes de API.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let store = Store::open_in_memory().expect("banco em memória");
        Self::build(store)
    }
}
