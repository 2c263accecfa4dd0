// src/db/inventory_repo.rs

use chrono::Utc;
use redb::ReadableTable;
use rust_decimal::Decimal;

use crate::db::store::{Store, StoreError, INVENTORY_ITEMS, INVENTORY_TRANSACTIONS};
use crate::models::inventory::{
    InventoryItem, InventoryTransaction, VariationType, DEFAULT_MINIMUM_LEVEL,
};

#[derive(Clone)]
pub struct InventoryRepo {
    store: Store,
}

impl InventoryRepo {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get_item(&self, sku: VariationType) -> Result<Option<InventoryItem>, StoreError> {
        self.store.get(INVENTORY_ITEMS, sku.as_str())
    }

    pub fn list_items(&self) -> Result<Vec<InventoryItem>, StoreError> {
        self.store.list(INVENTORY_ITEMS)
    }

    pub fn save_item(&self, item: &InventoryItem) -> Result<(), StoreError> {
        self.store
            .put(INVENTORY_ITEMS, item.variation_type.as_str(), item)
    }

    /// Lançamentos em ordem de geração (o id embute o instante).
    pub fn list_transactions(&self) -> Result<Vec<InventoryTransaction>, StoreError> {
        let mut txs: Vec<InventoryTransaction> = self.store.list(INVENTORY_TRANSACTIONS)?;
        txs.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(txs)
    }

    /// Grava o lançamento e aplica a quantidade ao saldo do SKU na mesma
    /// transação, assim o razão e o saldo derivado nunca divergem. O item é
    /// criado com nível mínimo padrão se ainda não existir.
    pub fn post(&self, tx: &InventoryTransaction) -> Result<InventoryItem, StoreError> {
        let txn = self.store.begin_write()?;
        let updated_item;
        {
            let mut tx_table = txn.open_table(INVENTORY_TRANSACTIONS)?;
            let bytes = serde_json::to_vec(tx)?;
            tx_table.insert(tx.id.as_str(), bytes.as_slice())?;

            let mut items_table = txn.open_table(INVENTORY_ITEMS)?;
            let sku_key = tx.variation_type.as_str();
            let existing = items_table
                .get(sku_key)?
                .map(|guard| serde_json::from_slice::<InventoryItem>(guard.value()))
                .transpose()?;

            let mut item = existing.unwrap_or_else(|| InventoryItem {
                id: uuid::Uuid::new_v4().to_string(),
                variation_type: tx.variation_type,
                quantity: 0,
                minimum_level: DEFAULT_MINIMUM_LEVEL,
                cost_per_unit: Decimal::ZERO,
                last_updated_at: tx.date,
            });
            item.quantity += tx.quantity;
            item.last_updated_at = Utc::now();

            let item_bytes = serde_json::to_vec(&item)?;
            items_table.insert(sku_key, item_bytes.as_slice())?;
            updated_item = item;
        }
        txn.commit()?;
        Ok(updated_item)
    }
}
