// src/db/orders_repo.rs

use redb::ReadableTable;

use crate::common::error::AppError;
use crate::db::store::{Store, StoreError, ORDERS};
use crate::models::order::Order;

const SEQ_COUNTER: &str = "orders_seq";

#[derive(Clone)]
pub struct OrdersRepo {
    store: Store,
}

impl OrdersRepo {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get(&self, id: &str) -> Result<Option<Order>, StoreError> {
        self.store.get(ORDERS, id)
    }

    /// Insere um pedido novo, atribuindo sua posição na ordem de criação.
    pub fn insert_new(&self, order: &mut Order) -> Result<(), StoreError> {
        order.seq = self.store.next_counter(SEQ_COUNTER)?;
        self.store.put(ORDERS, &order.id.clone(), order)
    }

    /// Upsert usado pela importação: um pedido reimportado mantém sua
    /// posição original na coleção.
    pub fn upsert(&self, order: &mut Order) -> Result<(), StoreError> {
        match self.store.get::<Order>(ORDERS, &order.id)? {
            Some(existing) => order.seq = existing.seq,
            None => order.seq = self.store.next_counter(SEQ_COUNTER)?,
        }
        self.store.put(ORDERS, &order.id.clone(), order)
    }

    /// Coleção completa na ordem de criação.
    pub fn list(&self) -> Result<Vec<Order>, StoreError> {
        let mut orders: Vec<Order> = self.store.list(ORDERS)?;
        orders.sort_by_key(|o| o.seq);
        Ok(orders)
    }

    /// Lê-modifica-grava um único pedido dentro de uma transação de
    /// escrita: a mudança de situação e seus efeitos colaterais chegam ao
    /// disco juntos ou não chegam.
    pub fn update_with<F>(&self, id: &str, apply: F) -> Result<Order, AppError>
    where
        F: FnOnce(&mut Order) -> Result<(), AppError>,
    {
        let txn = self.store.begin_write()?;
        let updated;
        {
            let mut table = txn.open_table(ORDERS).map_err(StoreError::from)?;
            let current = table
                .get(id)
                .map_err(StoreError::from)?
                .map(|guard| serde_json::from_slice::<Order>(guard.value()))
                .transpose()
                .map_err(StoreError::from)?;

            let mut order =
                current.ok_or_else(|| AppError::NotFound(format!("Pedido '{id}'")))?;
            apply(&mut order)?;

            let bytes = serde_json::to_vec(&order).map_err(StoreError::from)?;
            table
                .insert(id, bytes.as_slice())
                .map_err(StoreError::from)?;
            updated = order;
        }
        txn.commit().map_err(StoreError::from)?;
        Ok(updated)
    }

    /// Reescreve a referência de oferta de todos os pedidos que apontavam
    /// para o nome antigo: renomear uma oferta não pode deixar órfão o
    /// histórico. Tudo em uma única transação.
    pub fn rewrite_offer_refs(&self, old_name: &str, new_name: &str) -> Result<usize, StoreError> {
        let txn = self.store.begin_write()?;
        let mut rewritten = 0;
        {
            let mut table = txn.open_table(ORDERS)?;

            let mut matching: Vec<Order> = Vec::new();
            for entry in table.iter()? {
                let (_, value) = entry?;
                let order: Order = serde_json::from_slice(value.value())?;
                if order.offer_ref == old_name {
                    matching.push(order);
                }
            }

            for mut order in matching {
                order.offer_ref = new_name.to_string();
                let bytes = serde_json::to_vec(&order)?;
                table.insert(order.id.as_str(), bytes.as_slice())?;
                rewritten += 1;
            }
        }
        txn.commit()?;
        Ok(rewritten)
    }
}
