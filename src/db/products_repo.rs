// src/db/products_repo.rs

use crate::db::store::{Store, StoreError, PRODUCTS};
use crate::models::product::Product;

#[derive(Clone)]
pub struct ProductsRepo {
    store: Store,
}

impl ProductsRepo {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get(&self, id: &str) -> Result<Option<Product>, StoreError> {
        self.store.get(PRODUCTS, id)
    }

    pub fn save(&self, product: &Product) -> Result<(), StoreError> {
        self.store.put(PRODUCTS, &product.id, product)
    }

    pub fn list(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.store.list(PRODUCTS)?;
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}
