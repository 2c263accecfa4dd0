// src/common/br.rs
//
// Formatos brasileiros compartilhados: moeda ("R$ 1.234,56") e datas
// "DD/MM/YYYY", opcionalmente com hora ("DD/MM/YYYY HH:MM"). Os dados
// históricos importados carregam esses campos como texto livre, então a
// conversão fica centralizada aqui em vez de espalhada pelos serviços.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Normaliza um valor monetário brasileiro para `Decimal`.
/// Aceita "R$ 1.234,56", "1234,56" e também "1234.56" (planilhas exportadas
/// sem formatação). Retorna `None` para texto não numérico.
pub fn parse_brl(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().trim_start_matches("R$").trim();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') {
        // Formato brasileiro: '.' é separador de milhar, ',' é decimal.
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned.to_string()
    };

    Decimal::from_str(&normalized).ok()
}

/// Interpreta uma data "DD/MM/YYYY", tolerando sufixo de hora.
/// Campos vazios ou fora do formato retornam `None`.
pub fn parse_br_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split_whitespace().next()?;
    let mut parts = date_part.split('/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Data de hoje no formato de exibição "DD/MM/YYYY".
pub fn today_br() -> String {
    Utc::now().format("%d/%m/%Y").to_string()
}

/// Agora no formato de exibição "DD/MM/YYYY HH:MM".
pub fn now_br() -> String {
    Utc::now().format("%d/%m/%Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normaliza_moeda_brasileira() {
        assert_eq!(
            parse_brl("R$ 1.234,56"),
            Some(Decimal::from_str("1234.56").unwrap())
        );
        assert_eq!(parse_brl("150,00"), Some(Decimal::from_str("150.00").unwrap()));
        assert_eq!(parse_brl("1234.56"), Some(Decimal::from_str("1234.56").unwrap()));
        assert_eq!(parse_brl(""), None);
        assert_eq!(parse_brl("abc"), None);
    }

    #[test]
    fn interpreta_datas_com_e_sem_hora() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(parse_br_date("07/03/2024"), Some(d));
        assert_eq!(parse_br_date("07/03/2024 14:32"), Some(d));
        assert_eq!(parse_br_date(""), None);
        assert_eq!(parse_br_date("2024-03-07"), None);
        assert_eq!(parse_br_date("32/13/2024"), None);
    }
}
