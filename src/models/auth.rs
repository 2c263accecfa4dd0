// src/models/auth.rs
//
// A autenticação em si acontece fora deste serviço; quem chama já chega
// com o papel resolvido e o encaminha nos cabeçalhos X-User-*. Aqui só
// modelamos a identidade necessária para a projeção de visibilidade.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Supervisor,
    /// Vê apenas pedidos cujo vendedor combina com seu nome/e-mail.
    Vendedor,
    /// Operador de cobrança; vê apenas pedidos atribuídos a ele.
    Operador,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "supervisor" => Some(Role::Supervisor),
            "vendedor" | "seller" => Some(Role::Vendedor),
            "operador" | "collector" => Some(Role::Operador),
            _ => None,
        }
    }
}

/// Identidade de quem consulta, vinda dos cabeçalhos da requisição.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub role: Role,
    pub name: String,
    pub email: String,
}

impl Viewer {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
