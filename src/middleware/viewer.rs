// src/middleware/viewer.rs
//
// A autenticação acontece na borda (fora deste serviço); a identidade já
// resolvida chega nos cabeçalhos X-User-Role / X-User-Name / X-User-Email.
// Este extrator só valida e monta o `Viewer` usado pela projeção de
// visibilidade.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::auth::{Role, Viewer};

const ROLE_HEADER: &str = "x-user-role";
const NAME_HEADER: &str = "x-user-name";
const EMAIL_HEADER: &str = "x-user-email";

pub struct ViewerRejection(String);

impl IntoResponse for ViewerRejection {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.0 }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

fn header_string(parts: &Parts, name: &str) -> Result<String, ViewerRejection> {
    match parts.headers.get(name) {
        Some(value) => value
            .to_str()
            .map(|s| s.trim().to_string())
            .map_err(|_| {
                ViewerRejection(format!("Cabeçalho {name} contém caracteres inválidos."))
            }),
        None => Ok(String::new()),
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = ViewerRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_role = header_string(parts, ROLE_HEADER)?;
        if raw_role.is_empty() {
            return Err(ViewerRejection(
                "O cabeçalho X-User-Role é obrigatório.".to_string(),
            ));
        }

        let role = Role::parse(&raw_role).ok_or_else(|| {
            ViewerRejection(format!("Papel de usuário desconhecido: '{raw_role}'."))
        })?;

        Ok(Viewer {
            role,
            name: header_string(parts, NAME_HEADER)?,
            email: header_string(parts, EMAIL_HEADER)?,
        })
    }
}
