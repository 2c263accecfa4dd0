pub mod inventory_repo;
pub mod orders_repo;
pub mod products_repo;
pub mod store;
pub mod zap_repo;

pub use inventory_repo::InventoryRepo;
pub use orders_repo::OrdersRepo;
pub use products_repo::ProductsRepo;
pub use store::Store;
pub use zap_repo::ZapRepo;
