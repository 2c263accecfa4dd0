// src/services/visibility.rs
//
// Projeção da coleção de pedidos para quem consulta: recorte por papel,
// regra dos deletados, filtros de situação/data e ordenação por datas
// brasileiras. O casamento de nomes é um predicado isolado de propósito:
// é um paliativo de compatibilidade até existir um vínculo por id de
// vendedor, e deve poder ser trocado num lugar só.

use std::cmp::Ordering;

use crate::common::br::{parse_br_date, today_br};
use crate::models::auth::{Role, Viewer};
use crate::models::order::{Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    SaleDate,
    LastUpdated,
    NegotiationDate,
    CarrierUpdate,
}

impl SortKey {
    /// Nomes de campo que o painel usa nos parâmetros de consulta.
    pub fn parse(raw: &str) -> Option<SortKey> {
        match raw {
            "dataVenda" => Some(SortKey::SaleDate),
            "ultimaAtualizacao" => Some(SortKey::LastUpdated),
            "dataNegociacao" => Some(SortKey::NegotiationDate),
            "atualizacaoCorreios" => Some(SortKey::CarrierUpdate),
            _ => None,
        }
    }

    fn field<'a>(self, order: &'a Order) -> &'a str {
        match self {
            SortKey::SaleDate => &order.sale_date,
            SortKey::LastUpdated => &order.last_updated_at,
            SortKey::NegotiationDate => &order.negotiation_date,
            SortKey::CarrierUpdate => &order.carrier_status_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Filtros e ordenação pedidos por quem chama.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// Filtro especial do painel: recebidos hoje.
    pub received_today: bool,
    pub sort: Option<SortKey>,
    pub direction: SortDirection,
}

/// Predicado frouxo de posse: casa se um contém o outro, depois de
/// aparar e baixar caixa. Tolerante a variações de nome de propósito.
fn fuzzy_contains(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// O dono registrado no pedido casa com o nome OU o e-mail de quem vê?
pub fn owner_matches(owner: &str, viewer: &Viewer) -> bool {
    fuzzy_contains(owner, &viewer.name) || fuzzy_contains(owner, &viewer.email)
}

/// Recorte por papel: admin e supervisor veem tudo; vendedor vê os seus;
/// operador vê os atribuídos a ele.
pub fn can_view(order: &Order, viewer: &Viewer) -> bool {
    match viewer.role {
        Role::Admin | Role::Supervisor => true,
        Role::Vendedor => owner_matches(&order.seller_name, viewer),
        Role::Operador => owner_matches(&order.operator_name, viewer),
    }
}

/// Projeta a coleção para quem consulta, nesta ordem: recorte por papel,
/// regra dos deletados (só admin, a menos que o filtro "Deletado" tenha
/// sido pedido explicitamente), filtro de situação/data, ordenação.
pub fn project(orders: Vec<Order>, viewer: &Viewer, query: &OrderQuery) -> Vec<Order> {
    let deleted_requested = query.status == Some(OrderStatus::Deletado);
    let today = today_br();

    let mut visible: Vec<Order> = orders
        .into_iter()
        .filter(|order| can_view(order, viewer))
        .filter(|order| {
            order.sale_status != OrderStatus::Deletado || viewer.is_admin() || deleted_requested
        })
        .filter(|order| match query.status {
            Some(status) => order.sale_status == status,
            None => true,
        })
        .filter(|order| !query.received_today || order.receipt_date == today)
        .collect();

    if let Some(key) = query.sort {
        // sort_by é estável: empates preservam a ordem de criação.
        visible.sort_by(|a, b| compare_by_date(a, b, key, query.direction));
    }

    visible
}

/// Datas "DD/MM/YYYY"; valor vazio (ou fora do formato) vai para o fim
/// independente da direção.
fn compare_by_date(a: &Order, b: &Order, key: SortKey, direction: SortDirection) -> Ordering {
    let date_a = parse_br_date(key.field(a));
    let date_b = parse_br_date(key.field(b));

    match (date_a, date_b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ordering = x.cmp(&y);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}
