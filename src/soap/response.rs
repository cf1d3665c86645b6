//! Parsers for GNRE service responses.
//!
//! Each parser classifies a single response snapshot. Polling is the
//! caller's job: a lot that is still processing surfaces as
//! [`GnreError::Service`] from [`parse_guide_result`] with a `400`/`401`
//! code (see [`GnreError::is_pending`]).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cell::Cell;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::core::*;
use crate::xml_utils::scan_nested;

/// `situacaoRecepcao` code of an accepted batch.
pub const CODIGO_LOTE_RECEBIDO: &str = "100";

/// `situacaoGuia` of a successfully issued guide.
const SITUACAO_GUIA_OK: &str = "0";

/// Escaped payloads only come back in the operation wrapper directly under
/// the SOAP `Body`, or in its return element.
fn in_body_wrapper(path: &[String]) -> bool {
    path.iter()
        .position(|p| p == "Body")
        .is_some_and(|i| matches!(path.len() - i - 1, 1 | 2))
}

#[derive(Default)]
struct Scanned {
    /// `(path, text, guia ordinal)`; ordinal 0 is outside any `guia`.
    texts: Vec<(Vec<String>, String, usize)>,
}

impl Scanned {
    fn read(response: &str) -> Result<Self, GnreError> {
        let guias = Cell::new(0usize);
        let mut texts = Vec::new();
        scan_nested(
            response,
            in_body_wrapper,
            &mut |path: &[String], _: &[(String, String)]| {
                if path.last().map(String::as_str) == Some("guia") {
                    guias.set(guias.get() + 1);
                }
            },
            &mut |path: &[String], text: &str| {
                let ordinal = if path.iter().any(|p| p == "guia") {
                    guias.get()
                } else {
                    0
                };
                texts.push((path.to_vec(), text.to_string(), ordinal));
            },
        )?;
        Ok(Self { texts })
    }

    /// First text whose path ends with `parent/leaf`.
    fn find(&self, parent: &str, leaf: &str) -> Option<&str> {
        self.texts.iter().find_map(|(path, text, _)| {
            let n = path.len();
            (n >= 2 && path[n - 1] == leaf && path[n - 2] == parent).then_some(text.as_str())
        })
    }

    /// First text with element name `leaf` outside any guide.
    fn find_leaf(&self, leaf: &str) -> Option<&str> {
        self.texts.iter().find_map(|(path, text, ordinal)| {
            (*ordinal == 0 && path.last().map(String::as_str) == Some(leaf))
                .then_some(text.as_str())
        })
    }

    /// First text with element name `leaf` inside the first guide.
    fn find_in_first_guia(&self, leaf: &str) -> Option<&str> {
        self.texts.iter().find_map(|(path, text, ordinal)| {
            (*ordinal == 1 && path.last().map(String::as_str) == Some(leaf))
                .then_some(text.as_str())
        })
    }

    /// `(code, description)` of a SOAP 1.1 or 1.2 fault.
    fn fault(&self) -> Option<(String, String)> {
        let mut in_fault = self
            .texts
            .iter()
            .filter(|(path, _, _)| path.iter().any(|p| p == "Fault"))
            .peekable();
        in_fault.peek()?;

        let mut codigo = None;
        let mut descricao = None;
        for (path, text, _) in in_fault {
            let n = path.len();
            let leaf = path[n - 1].as_str();
            let parent = if n >= 2 { path[n - 2].as_str() } else { "" };
            match (parent, leaf) {
                (_, "faultcode") | ("Code", "Value") if codigo.is_none() => {
                    codigo = Some(text.clone());
                }
                (_, "faultstring") | ("Reason", "Text") if descricao.is_none() => {
                    descricao = Some(text.clone());
                }
                _ => {}
            }
        }
        Some((
            codigo.unwrap_or_else(|| "soap:Fault".into()),
            descricao.unwrap_or_default(),
        ))
    }

    fn status(&self) -> Result<ResultStatus, GnreError> {
        if let Some((codigo, descricao)) = self.fault() {
            return Ok(ResultStatus {
                numero_recibo: None,
                codigo,
                descricao,
            });
        }
        let codigo = self
            .find("situacaoProcess", "codigo")
            .ok_or_else(|| GnreError::Parse("response has no situacaoProcess/codigo".into()))?;
        Ok(ResultStatus {
            numero_recibo: self.find_leaf("numeroRecibo").map(str::to_string),
            codigo: codigo.to_string(),
            descricao: self
                .find("situacaoProcess", "descricao")
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// Whether `body` is a SOAP fault (used to keep non-2xx fault bodies).
pub fn is_soap_fault(body: &str) -> bool {
    Scanned::read(body)
        .map(|s| s.texts.iter().any(|(p, _, _)| p.iter().any(|e| e == "Fault")))
        .unwrap_or(false)
}

/// Receipt number of a `GnreLoteRecepcao` answer.
///
/// # Errors
///
/// `GnreError::Service` when the batch was rejected (or a SOAP fault came
/// back), `GnreError::Parse` when the response is not a recognizable
/// receipt.
pub fn parse_receipt(response: &str) -> Result<Receipt, GnreError> {
    let s = Scanned::read(response)?;
    if let Some((codigo, descricao)) = s.fault() {
        warn!(%codigo, %descricao, "batch submission answered with SOAP fault");
        return Err(GnreError::service(codigo, descricao, None));
    }

    let codigo = s
        .find("situacaoRecepcao", "codigo")
        .ok_or_else(|| GnreError::Parse("response has no situacaoRecepcao/codigo".into()))?;
    let descricao = s.find("situacaoRecepcao", "descricao").unwrap_or_default();
    if codigo != CODIGO_LOTE_RECEBIDO {
        warn!(%codigo, %descricao, "batch rejected");
        return Err(GnreError::service(codigo, descricao, None));
    }

    let numero = s
        .find("recibo", "numero")
        .ok_or_else(|| GnreError::Parse("accepted batch without recibo/numero".into()))?;
    info!(recibo = %numero, "batch accepted");
    Ok(Receipt::new(numero))
}

/// Processing status of a lot. Never fails for a business state.
///
/// A SOAP fault is reported as a status carrying the fault code and text.
///
/// # Errors
///
/// `GnreError::Parse` only for input that is not XML or has neither a
/// status nor a fault.
pub fn parse_status(response: &str) -> Result<ResultStatus, GnreError> {
    let status = Scanned::read(response)?.status()?;
    debug!(codigo = %status.codigo, stage = ?status.stage(), "lot status");
    Ok(status)
}

/// Final guide data of a processed lot.
///
/// # Errors
///
/// - `GnreError::Service` when the lot is not completed (still processing,
///   or failed), or when its first guide was rejected. This is the signal to
///   poll again or give up; check [`GnreError::is_pending`].
/// - `GnreError::Parse` when a completed lot lacks any guide field.
pub fn parse_guide_result(response: &str) -> Result<GuideResult, GnreError> {
    let s = Scanned::read(response)?;
    let status = s.status()?;

    if status.stage() != LoteStage::Completed {
        debug!(codigo = %status.codigo, "lot not completed");
        return Err(GnreError::service(
            status.codigo,
            status.descricao,
            status.numero_recibo,
        ));
    }

    let numero_recibo = status
        .numero_recibo
        .clone()
        .ok_or_else(|| missing("numeroRecibo"))?;

    let situacao = s.find_in_first_guia("situacaoGuia");
    let motivo = s.find("motivo", "codigo").filter(|_| {
        s.texts
            .iter()
            .any(|(p, _, o)| *o == 1 && p.iter().any(|e| e == "motivosRejeicao"))
    });
    if situacao.is_some_and(|c| c != SITUACAO_GUIA_OK) || motivo.is_some() {
        let codigo = motivo.or(situacao).unwrap_or_default();
        let descricao = s
            .find("motivo", "descricao")
            .unwrap_or("guia rejeitada");
        warn!(%codigo, %descricao, recibo = %numero_recibo, "guide rejected");
        return Err(GnreError::service(codigo, descricao, Some(numero_recibo)));
    }

    let linha_digitavel = s
        .find_in_first_guia("linhaDigitavel")
        .ok_or_else(|| missing("linhaDigitavel"))?;
    let valor_raw = s
        .find_in_first_guia("valorGNRE")
        .ok_or_else(|| missing("valorGNRE"))?;
    let vencimento_raw = s
        .find_in_first_guia("dataVencimento")
        .ok_or_else(|| missing("dataVencimento"))?;
    let pdf_base64 = s.find_leaf("pdfGuias").ok_or_else(|| missing("pdfGuias"))?;

    let valor = Decimal::from_str(valor_raw)
        .map_err(|e| GnreError::Parse(format!("invalid valorGNRE '{valor_raw}': {e}")))?;
    let data_vencimento = NaiveDate::parse_from_str(vencimento_raw, "%Y-%m-%d")
        .map_err(|e| GnreError::Parse(format!("invalid dataVencimento '{vencimento_raw}': {e}")))?;

    info!(recibo = %numero_recibo, %valor, "guide issued");
    Ok(GuideResult {
        linha_digitavel: linha_digitavel.to_string(),
        valor,
        data_vencimento,
        pdf_base64: pdf_base64.to_string(),
        numero_recibo,
    })
}

fn missing(field: &str) -> GnreError {
    GnreError::Parse(format!("completed lot without {field}"))
}
