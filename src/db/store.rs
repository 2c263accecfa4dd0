// src/db/store.rs
//
// Armazenamento embutido (redb): uma tabela por coleção lógica, chave =
// id da entidade, valor = documento JSON. Cada escrita é uma transação
// atômica sobre registros endereçáveis. Substitui o antigo blob único
// por coleção, que obrigava ler/regravar a coleção inteira a cada
// mutação e perdia a última escrita em caso de corrida.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub const ORDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");
pub const PRODUCTS: TableDefinition<&str, &[u8]> = TableDefinition::new("products");
pub const INVENTORY_ITEMS: TableDefinition<&str, &[u8]> = TableDefinition::new("inventory_items");
pub const INVENTORY_TRANSACTIONS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("inventory_transactions");
pub const ZAP_CONFIGS: TableDefinition<&str, &[u8]> = TableDefinition::new("zap_configs");

/// Contadores monotônicos (ordem de criação dos pedidos).
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Erro ao abrir o banco: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Erro de transação: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Erro de tabela: {0}")]
    Table(#[from] redb::TableError),

    #[error("Erro de armazenamento: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Erro ao gravar transação: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Erro de serialização: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Abre (ou cria) o arquivo de dados e garante que todas as tabelas
    /// existem; uma tabela nunca lida antes da primeira escrita deixaria
    /// a leitura falhar.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Banco em memória para testes.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, StoreError> {
        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(ORDERS)?;
            let _ = txn.open_table(PRODUCTS)?;
            let _ = txn.open_table(INVENTORY_ITEMS)?;
            let _ = txn.open_table(INVENTORY_TRANSACTIONS)?;
            let _ = txn.open_table(ZAP_CONFIGS)?;
            let _ = txn.open_table(COUNTERS)?;
        }
        txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&'static str, &'static [u8]>,
        id: &str,
    ) -> Result<Option<T>, StoreError> {
        let txn = self.db.begin_read()?;
        let t = txn.open_table(table)?;
        match t.get(id)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize>(
        &self,
        table: TableDefinition<&'static str, &'static [u8]>,
        id: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        let txn = self.db.begin_write()?;
        {
            let mut t = txn.open_table(table)?;
            t.insert(id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Remove um registro; retorna se ele existia.
    pub fn remove(
        &self,
        table: TableDefinition<&'static str, &'static [u8]>,
        id: &str,
    ) -> Result<bool, StoreError> {
        let txn = self.db.begin_write()?;
        let existed;
        {
            let mut t = txn.open_table(table)?;
            existed = t.remove(id)?.is_some();
        }
        txn.commit()?;
        Ok(existed)
    }

    /// Varre a tabela inteira (ordem de chave).
    pub fn list<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&'static str, &'static [u8]>,
    ) -> Result<Vec<T>, StoreError> {
        let txn = self.db.begin_read()?;
        let t = txn.open_table(table)?;
        let mut out = Vec::new();
        for entry in t.iter()? {
            let (_, value) = entry?;
            out.push(serde_json::from_slice(value.value())?);
        }
        Ok(out)
    }

    /// Incrementa e retorna o contador nomeado (começa em 1).
    pub fn next_counter(&self, name: &str) -> Result<u64, StoreError> {
        let txn = self.db.begin_write()?;
        let next;
        {
            let mut t = txn.open_table(COUNTERS)?;
            let current = t.get(name)?.map(|g| g.value()).unwrap_or(0);
            next = current + 1;
            t.insert(name, next)?;
        }
        txn.commit()?;
        Ok(next)
    }

    /// Transação de escrita crua, para operações que tocam mais de um
    /// registro (ou mais de uma tabela) atomicamente.
    pub(crate) fn begin_write(&self) -> Result<WriteTransaction, StoreError> {
        Ok(self.db.begin_write()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        id: String,
        value: i64,
    }

    #[test]
    fn grava_le_e_remove_um_registro() {
        let store = Store::open_in_memory().unwrap();
        let doc = Doc {
            id: "a".to_string(),
            value: 42,
        };
        store.put(ORDERS, "a", &doc).unwrap();
        assert_eq!(store.get::<Doc>(ORDERS, "a").unwrap(), Some(doc));
        assert!(store.remove(ORDERS, "a").unwrap());
        assert!(!store.remove(ORDERS, "a").unwrap());
        assert_eq!(store.get::<Doc>(ORDERS, "a").unwrap(), None);
    }

    #[test]
    fn contador_e_monotonico() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.next_counter("orders_seq").unwrap(), 1);
        assert_eq!(store.next_counter("orders_seq").unwrap(), 2);
        assert_eq!(store.next_counter("outro").unwrap(), 1);
    }

    #[test]
    fn abre_arquivo_em_disco() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados.redb");
        {
            let store = Store::open(&path).unwrap();
            store
                .put(
                    PRODUCTS,
                    "p1",
                    &Doc {
                        id: "p1".to_string(),
                        value: 7,
                    },
                )
                .unwrap();
        }
        let reaberto = Store::open(&path).unwrap();
        assert_eq!(
            reaberto.get::<Doc>(PRODUCTS, "p1").unwrap(),
            Some(Doc {
                id: "p1".to_string(),
                value: 7
            })
        );
    }
}
