// src/services/import_service.rs
//
// Fronteira de importação de planilhas (CSV/TSV). A primeira linha não
// vazia é o cabeçalho; o separador é detectado linha a linha (tabulação
// tem preferência quando presente e não há vírgula). Linha ruim é
// rejeitada individualmente e reportada pelo número (1-based); um lote
// nunca aborta inteiro por causa de uma linha.

use serde::Serialize;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::br::parse_brl,
    common::error::AppError,
    common::events::{ChangeEntity, ChangeEvent, EventBus},
    db::OrdersRepo,
    models::order::{BillingEntry, Order, OrderStatus},
};

/// Cabeçalhos exigidos na planilha exportada pelo painel.
const REQUIRED_HEADERS: [&str; 36] = [
    "Data Venda",
    "ID Venda",
    "Cliente",
    "Telefone",
    "Oferta",
    "Valor Venda",
    "Status",
    "Situação Venda",
    "Valor Recebido",
    "Historico",
    "Ultima Atualização",
    "Código de Rastreio",
    "Status Correios",
    "Vendedor",
    "Operador",
    "Zap",
    "ESTADO DO DESTINATÁRIO",
    "CIDADE DO DESTINATÁRIO",
    "RUA DO DESTINATÁRIO",
    "CEP DO DESTINATÁRIO",
    "COMPLEMENTO DO DESTINATÁRIO",
    "BAIRRO DO DESTINATÁRIO",
    "NÚMERO DO ENDEREÇO DO DESTINATÁRIO",
    "DATA ESTIMADA DE CHEGADA",
    "CÓDIGO DO AFILIADO",
    "NOME DO AFILIADO",
    "E-MAIL DO AFILIADO",
    "DOCUMENTO DO AFILIADO",
    "DATA DE RECEBIMENTO",
    "Data_Negociacao",
    "FormaPagamento",
    "DOCUMENTO CLIENTE",
    "Parcial",
    "Pagamento_Parcial",
    "FormaPagamentoParcial",
    "DataPagamentoParcial",
];

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    /// Números de linha (1-based, contando o cabeçalho) rejeitados.
    pub problem_lines: Vec<usize>,
}

#[derive(Clone)]
pub struct ImportService {
    orders: OrdersRepo,
    events: EventBus,
}

impl ImportService {
    pub fn new(orders: OrdersRepo, events: EventBus) -> Self {
        Self { orders, events }
    }

    pub fn import(&self, content: &str) -> Result<ImportReport, AppError> {
        let lines: Vec<(usize, &str)> = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line))
            .filter(|(_, line)| !line.trim().is_empty())
            .collect();

        let Some((&(_, header_line), rows)) = lines.split_first() else {
            return Err(header_error("A planilha está vazia.".to_string()));
        };

        let headers = parse_line(header_line);
        validate_headers(&headers)?;

        // Índice por cabeçalho, sem diferenciar caixa.
        let index: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let col = |fields: &[String], name: &str| -> String {
            index
                .iter()
                .position(|h| h == &name.to_lowercase())
                .and_then(|i| fields.get(i))
                .cloned()
                .unwrap_or_default()
        };

        let mut imported = 0usize;
        let mut problem_lines = Vec::new();

        for &(line_number, raw) in rows {
            let fields = parse_line(raw);
            match row_to_order(&fields, &col) {
                Some(mut order) => {
                    self.orders.upsert(&mut order)?;
                    imported += 1;
                }
                None => problem_lines.push(line_number),
            }
        }

        if imported > 0 {
            self.events.publish(ChangeEvent {
                entity: ChangeEntity::Orders,
                status: None,
            });
        }

        tracing::info!(
            "Importação concluída: {} pedido(s), {} linha(s) rejeitada(s)",
            imported,
            problem_lines.len()
        );

        Ok(ImportReport {
            imported,
            skipped: problem_lines.len(),
            problem_lines,
        })
    }
}

/// Separa uma linha respeitando aspas. TSV tem preferência quando a linha
/// tem tabulação e nenhuma vírgula.
fn parse_line(line: &str) -> Vec<String> {
    let is_tsv = line.contains('\t') && !line.contains(',');
    let separator = if is_tsv { '\t' } else { ',' };

    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == separator && !in_quotes {
            result.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    result.push(current.trim().to_string());
    result
}

fn validate_headers(headers: &[String]) -> Result<(), AppError> {
    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .filter(|required| {
            !headers
                .iter()
                .any(|h| h.to_lowercase() == required.to_lowercase())
        })
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(header_error(format!(
            "Cabeçalhos obrigatórios ausentes: {}",
            missing.join(", ")
        )))
    }
}

fn header_error(message: String) -> AppError {
    let mut error = ValidationError::new("headers");
    error.message = Some(message.into());
    let mut errors = ValidationErrors::new();
    errors.add("headers".into(), error);
    AppError::ValidationError(errors)
}

/// Converte uma linha em pedido. `None` rejeita a linha: falta de campo
/// obrigatório (data da venda, id, cliente, valor), valor não numérico ou
/// situação desconhecida.
fn row_to_order(fields: &[String], col: &dyn Fn(&[String], &str) -> String) -> Option<Order> {
    let sale_date = col(fields, "Data Venda");
    let id = col(fields, "ID Venda");
    let customer_name = col(fields, "Cliente");
    let raw_sale_value = col(fields, "Valor Venda");

    if sale_date.is_empty() || id.is_empty() || customer_name.is_empty() || raw_sale_value.is_empty()
    {
        return None;
    }

    let sale_value = parse_brl(&raw_sale_value)?;
    let received_value = parse_brl(&col(fields, "Valor Recebido")).unwrap_or_default();

    // Enum fechado: situação desconhecida rejeita a linha; vazio entra
    // como estado inicial.
    let raw_status = col(fields, "Situação Venda");
    let status = if raw_status.trim().is_empty() {
        OrderStatus::Liberacao
    } else {
        OrderStatus::parse(&raw_status)?
    };

    let last_updated_at = col(fields, "Ultima Atualização");

    // O histórico legado vem como texto corrido; vira a primeira entrada
    // estruturada do histórico de cobrança.
    let legacy_history = col(fields, "Historico");
    let billing_history = if legacy_history.trim().is_empty() {
        Vec::new()
    } else {
        vec![BillingEntry {
            date: if last_updated_at.is_empty() {
                sale_date.clone()
            } else {
                last_updated_at.clone()
            },
            note: legacy_history,
            status_at_time: status,
        }]
    };

    let street = col(fields, "RUA DO DESTINATÁRIO");
    let number = col(fields, "NÚMERO DO ENDEREÇO DO DESTINATÁRIO");
    let neighborhood = col(fields, "BAIRRO DO DESTINATÁRIO");
    let city = col(fields, "CIDADE DO DESTINATÁRIO");
    let state = col(fields, "ESTADO DO DESTINATÁRIO");
    let cep = col(fields, "CEP DO DESTINATÁRIO");
    let complement = col(fields, "COMPLEMENTO DO DESTINATÁRIO");
    let customer_address = if [&street, &number, &neighborhood, &city, &state, &cep]
        .iter()
        .all(|part| part.is_empty())
    {
        String::new()
    } else {
        let mut address = format!("{street}, {number}, {neighborhood}, {city}, {state}, {cep}");
        if !complement.is_empty() {
            address.push_str(", ");
            address.push_str(&complement);
        }
        address
    };

    Some(Order {
        id,
        seq: 0,
        sale_date,
        customer_name,
        customer_phone: col(fields, "Telefone"),
        customer_document: col(fields, "DOCUMENTO CLIENTE"),
        customer_address,
        zap: col(fields, "Zap"),
        offer_ref: col(fields, "Oferta"),
        sale_value,
        received_value,
        sale_status: status,
        legacy_status: status,
        seller_name: col(fields, "Vendedor"),
        operator_name: col(fields, "Operador"),
        tracking_code: col(fields, "Código de Rastreio"),
        carrier_status: col(fields, "Status Correios"),
        carrier_status_at: col(fields, "Atualizacao Correios"),
        negotiation_date: col(fields, "Data_Negociacao"),
        receipt_date: col(fields, "DATA DE RECEBIMENTO"),
        payment_method: col(fields, "FormaPagamento"),
        last_updated_at,
        billing_history,
    })
}
