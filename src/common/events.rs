// src/common/events.rs
//
// Canal de notificação "algo mudou, recarregue" entre o núcleo e o painel.
// O envio é fire-and-forget: assinantes ausentes ou atrasados são ignorados,
// e quem escuta deve reconciliar relendo o estado autoritativo. O payload
// serve apenas como dica.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::order::OrderStatus;

/// Qual coleção lógica mudou.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeEntity {
    Orders,
    Products,
    Inventory,
    ZapConfigs,
}

/// Payload tipado da notificação. `status` acompanha mudanças de situação
/// de pedido, quando houver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub entity: ChangeEntity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Publica sem garantia de entrega.
    pub fn publish(&self, event: ChangeEvent) {
        // send falha quando não há assinantes; isso não é um erro aqui.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
