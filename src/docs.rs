// src/docs.rs

use axum::Json;
use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::list_duplicates,
        handlers::orders::get_order_stats,
        handlers::orders::get_order,
        handlers::orders::update_status,
        handlers::orders::approve_order,
        handlers::orders::reject_order,
        handlers::orders::attach_tracking,
        handlers::orders::update_carrier_status,
        handlers::orders::import_orders,

        // --- Catalog ---
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::add_offer,
        handlers::products::update_offer,
        handlers::products::delete_offer,
        handlers::products::list_active_offers,

        // --- Inventory ---
        handlers::inventory::list_items,
        handlers::inventory::get_levels,
        handlers::inventory::get_stats,
        handlers::inventory::list_transactions,
        handlers::inventory::post_transaction,
        handlers::inventory::adjust_inventory,

        // --- Zap ---
        handlers::zap::list_configs,
        handlers::zap::create_config,
        handlers::zap::update_config,
        handlers::zap::delete_config,
    ),
    components(
        schemas(
            // --- Orders ---
            models::order::Order,
            models::order::OrderStatus,
            models::order::BillingEntry,
            handlers::orders::CreateOrderPayload,
            handlers::orders::CreateOrderResponse,
            handlers::orders::TransitionPayload,
            handlers::orders::RejectPayload,
            handlers::orders::TrackingPayload,
            handlers::orders::CarrierStatusPayload,
            handlers::orders::ImportPayload,
            services::import_service::ImportReport,
            services::order_service::OrderStats,

            // --- Catalog ---
            models::product::Product,
            models::product::Offer,
            models::product::ResolvedOffer,
            handlers::products::CreateProductPayload,
            handlers::products::UpdateProductPayload,
            handlers::products::CreateOfferPayload,
            handlers::products::UpdateOfferPayload,
            services::catalog_service::OfferDeletion,

            // --- Inventory ---
            models::inventory::VariationType,
            models::inventory::TransactionType,
            models::inventory::InventoryItem,
            models::inventory::InventoryTransaction,
            models::inventory::InventoryLevels,
            models::inventory::InventoryStats,
            handlers::inventory::PostTransactionPayload,
            handlers::inventory::AdjustPayload,

            // --- Zap ---
            models::zap::ZapConfig,
            handlers::zap::ZapConfigPayload,
        )
    ),
    tags(
        (name = "Orders", description = "Ciclo de vida dos pedidos, duplicidade e importação"),
        (name = "Catalog", description = "Produtos e ofertas"),
        (name = "Inventory", description = "Razão de estoque por SKU"),
        (name = "Zap", description = "Configurações de canal de mensagens")
    )
)]
pub struct ApiDoc;

// GET /api/docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
