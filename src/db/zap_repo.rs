// src/db/zap_repo.rs

use crate::db::store::{Store, StoreError, ZAP_CONFIGS};
use crate::models::zap::ZapConfig;

#[derive(Clone)]
pub struct ZapRepo {
    store: Store,
}

impl ZapRepo {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get(&self, id: &str) -> Result<Option<ZapConfig>, StoreError> {
        self.store.get(ZAP_CONFIGS, id)
    }

    pub fn save(&self, config: &ZapConfig) -> Result<(), StoreError> {
        self.store.put(ZAP_CONFIGS, &config.id, config)
    }

    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        self.store.remove(ZAP_CONFIGS, id)
    }

    pub fn list(&self) -> Result<Vec<ZapConfig>, StoreError> {
        let mut configs: Vec<ZapConfig> = self.store.list(ZAP_CONFIGS)?;
        configs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(configs)
    }
}
