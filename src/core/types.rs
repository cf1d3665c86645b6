use base64::Engine;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{CODIGOS_EM_PROCESSAMENTO, GnreError};
use super::ufs::Uf;

/// Party identifier: company (CNPJ) or individual (CPF).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Documento {
    /// 14-digit company registry number.
    Cnpj(String),
    /// 11-digit individual taxpayer number.
    Cpf(String),
}

impl Documento {
    /// XML element name used by both NF-e and GNRE layouts.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Cnpj(_) => "CNPJ",
            Self::Cpf(_) => "CPF",
        }
    }

    pub fn numero(&self) -> &str {
        match self {
            Self::Cnpj(n) | Self::Cpf(n) => n,
        }
    }
}

/// Tax-relevant fields of one NF-e, as needed to issue its GNRE.
///
/// Produced by [`crate::nfe::extract_nfe`]; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInvoiceData {
    /// 44-digit access key (chave de acesso).
    pub chave_nfe: String,
    /// Invoice number (`ide/nNF`).
    pub numero_nf: String,
    /// Issue date (`ide/dhEmi` or `ide/dEmi`).
    pub data_emissao: NaiveDate,
    /// Issuer state (`emit/enderEmit/UF`).
    pub uf_emitente: Uf,
    /// Destination state (`dest/enderDest/UF`), `EX` for exports.
    pub uf_destinatario: Uf,
    /// Issuer CNPJ or CPF.
    pub emitente_documento: Documento,
    pub emitente_ie: Option<String>,
    pub emitente_nome: Option<String>,
    /// Street + number, joined with a comma.
    pub emitente_endereco: Option<String>,
    /// 7-digit IBGE municipality code.
    pub emitente_cod_mun: Option<String>,
    pub emitente_cep: Option<String>,
    pub emitente_telefone: Option<String>,
    pub destinatario_documento: Option<Documento>,
    pub destinatario_nome: Option<String>,
    pub destinatario_cod_mun: Option<String>,
    /// ICMS-ST withheld (`ICMSTot/vST`).
    pub valor_vst: Decimal,
    /// DIFAL owed to the destination state (`ICMSTot/vICMSUFDest`).
    pub valor_vicms_uf_dest: Decimal,
    /// FCP owed to the destination state (`ICMSTot/vFCPUFDest`).
    pub valor_vfcp_uf_dest: Decimal,
    /// FCP withheld by substitution (`ICMSTot/vFCPST`).
    pub valor_vfcpst: Decimal,
}

/// Deployment environment of the GNRE web service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Producao,
    Teste,
}

impl Environment {
    /// `ambiente` code used inside query payloads.
    pub fn ambiente(self) -> &'static str {
        match self {
            Self::Producao => "1",
            Self::Teste => "2",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Producao => "producao",
            Self::Teste => "teste",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = GnreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "producao" => Ok(Self::Producao),
            "teste" => Ok(Self::Teste),
            other => Err(GnreError::Config(format!(
                "unknown environment '{other}' (expected 'producao' or 'teste')"
            ))),
        }
    }
}

/// Opaque token identifying a submitted lot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Receipt(String);

impl Receipt {
    pub fn new(numero: impl Into<String>) -> Self {
        Self(numero.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for Receipt {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Processing stage of a lot, derived from its status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoteStage {
    /// Received or being processed (`400`, `401`); poll again later.
    Processing,
    /// Processed (`402`, or `403` with some guides pending).
    Completed,
    /// Any other code.
    Failed,
}

/// Snapshot of a lot's processing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultStatus {
    pub numero_recibo: Option<String>,
    pub codigo: String,
    pub descricao: String,
}

impl ResultStatus {
    pub fn stage(&self) -> LoteStage {
        match self.codigo.as_str() {
            c if CODIGOS_EM_PROCESSAMENTO.contains(&c) => LoteStage::Processing,
            "402" | "403" => LoteStage::Completed,
            _ => LoteStage::Failed,
        }
    }
}

/// Final data of an issued guide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideResult {
    /// Typeable payment barcode line.
    pub linha_digitavel: String,
    pub valor: Decimal,
    pub data_vencimento: NaiveDate,
    /// Base64-encoded PDF of the guide.
    pub pdf_base64: String,
    pub numero_recibo: String,
}

impl GuideResult {
    /// Decode the guide PDF.
    pub fn pdf_bytes(&self) -> Result<Vec<u8>, GnreError> {
        let compact: String = self
            .pdf_base64
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| GnreError::Parse(format!("pdfGuias is not valid base64: {e}")))
    }
}
