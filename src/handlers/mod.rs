// src/handlers/mod.rs

pub mod events;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod zap;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::config::AppState;
use crate::docs;

/// Monta o router completo da API.
pub fn router(app_state: AppState) -> Router {
    let orders_routes = Router::new()
        .route("/", post(orders::create_order).get(orders::list_orders))
        .route("/duplicates", get(orders::list_duplicates))
        .route("/stats", get(orders::get_order_stats))
        .route("/import", post(orders::import_orders))
        .route("/{id}", get(orders::get_order))
        .route("/{id}/status", put(orders::update_status))
        .route("/{id}/approve", post(orders::approve_order))
        .route("/{id}/reject", post(orders::reject_order))
        .route("/{id}/tracking", put(orders::attach_tracking))
        .route("/{id}/carrier-status", put(orders::update_carrier_status));

    let products_routes = Router::new()
        .route(
            "/",
            post(products::create_product).get(products::list_products),
        )
        .route("/offers/active", get(products::list_active_offers))
        .route(
            "/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route("/{id}/offers", post(products::add_offer))
        .route(
            "/{id}/offers/{offer_id}",
            put(products::update_offer).delete(products::delete_offer),
        );

    let inventory_routes = Router::new()
        .route("/items", get(inventory::list_items))
        .route("/levels", get(inventory::get_levels))
        .route("/stats", get(inventory::get_stats))
        .route(
            "/transactions",
            post(inventory::post_transaction).get(inventory::list_transactions),
        )
        .route("/adjust", post(inventory::adjust_inventory));

    let zap_routes = Router::new()
        .route("/", post(zap::create_config).get(zap::list_configs))
        .route("/{id}", put(zap::update_config).delete(zap::delete_config));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/docs/openapi.json", get(docs::openapi_json))
        .route("/api/events", get(events::change_feed))
        .nest("/api/orders", orders_routes)
        .nest("/api/products", products_routes)
        .nest("/api/inventory", inventory_routes)
        .nest("/api/zap-configs", zap_routes)
        .with_state(app_state)
}
