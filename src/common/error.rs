// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::store::StoreError;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// A taxonomia segue as regras de negócio: erros de validação nunca são
// fatais para um lote, referências históricas podem estar desatualizadas
// (NotFound vira no-op em quem chama), e transições ilegais são rejeitadas.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0} não encontrado(a)")]
    NotFound(String),

    #[error("Já existe um pedido com o ID {0}")]
    DuplicateId(String),

    #[error("Transição inválida: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Ajuste deixaria o estoque de {sku} negativo ({current} {delta:+})")]
    NegativeInventory {
        sku: String,
        current: i64,
        delta: i64,
    },

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Erro de armazenamento")]
    Storage(#[from] StoreError),

    // Variante genérica para qualquer outro erro inesperado.
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::NotFound(ref what) => {
                (StatusCode::NOT_FOUND, format!("{what} não encontrado(a)."))
            }
            AppError::DuplicateId(ref id) => (
                StatusCode::CONFLICT,
                format!("Já existe um pedido com o ID '{id}'."),
            ),
            AppError::InvalidTransition { ref from, ref to } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Transição de situação inválida: '{from}' -> '{to}'."),
            ),
            AppError::NegativeInventory {
                ref sku,
                current,
                delta,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("O ajuste deixaria o estoque de '{sku}' negativo (atual {current}, ajuste {delta:+})."),
            ),
            AppError::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone()),

            // Todos os outros erros (Storage, InternalServerError) viram 500.
            // O `tracing` vai logar a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
