use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use crate::core::*;
use crate::xml_utils::{digits, scan};

/// Extract the GNRE-relevant fields of an NF-e from raw XML bytes.
///
/// Accepts a bare `<NFe>` or a `<nfeProc>` wrapper, layout 3.10 or 4.00.
pub fn extract_nfe(xml: &[u8]) -> Result<ExtractedInvoiceData, GnreError> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| GnreError::Parse(format!("NF-e is not valid UTF-8: {e}")))?;
    from_nfe_xml(text)
}

/// Parse an NF-e XML string into [`ExtractedInvoiceData`].
pub fn from_nfe_xml(xml: &str) -> Result<ExtractedInvoiceData, GnreError> {
    let mut p = NfeParsed::default();
    let mut root: Option<String> = None;
    let mut texts: Vec<(Vec<String>, String)> = Vec::new();

    scan(
        xml,
        &mut |path: &[String], attrs: &[(String, String)]| {
            if root.is_none() {
                root = path.first().cloned();
            }
            if p.inf_nfe_id.is_none() {
                p.inf_nfe_id = inf_nfe_id(path, attrs);
            }
        },
        &mut |path: &[String], text: &str| texts.push((path.to_vec(), text.to_string())),
    )?;

    match root.as_deref() {
        Some("NFe" | "nfeProc") => {}
        Some(other) => {
            return Err(GnreError::Parse(format!(
                "unrecognized NF-e root element '{other}'"
            )));
        }
        None => return Err(GnreError::Parse("empty NF-e document".into())),
    }

    for (path, text) in &texts {
        p.handle_text(path, text);
    }
    p.into_data()
}

/// `infNFe/@Id` is the only attribute we need.
fn inf_nfe_id(path: &[String], attrs: &[(String, String)]) -> Option<String> {
    if path.last().map(String::as_str) != Some("infNFe") {
        return None;
    }
    attrs
        .iter()
        .find(|(k, _)| k == "Id")
        .map(|(_, v)| v.clone())
}

#[derive(Default)]
struct NfeParsed {
    inf_nfe_id: Option<String>,
    ch_nfe_prot: Option<String>,
    numero_nf: Option<String>,
    dh_emi: Option<String>,
    d_emi: Option<String>,

    emit_cnpj: Option<String>,
    emit_cpf: Option<String>,
    emit_ie: Option<String>,
    emit_nome: Option<String>,
    emit_lgr: Option<String>,
    emit_nro: Option<String>,
    emit_cmun: Option<String>,
    emit_uf: Option<String>,
    emit_cep: Option<String>,
    emit_fone: Option<String>,

    dest_cnpj: Option<String>,
    dest_cpf: Option<String>,
    dest_nome: Option<String>,
    dest_cmun: Option<String>,
    dest_uf: Option<String>,

    v_st: Option<String>,
    v_icms_uf_dest: Option<String>,
    v_fcp_uf_dest: Option<String>,
    v_fcp_st: Option<String>,
}

impl NfeParsed {
    fn handle_text(&mut self, path: &[String], text: &str) {
        let leaf = path.last().map(|s| s.as_str()).unwrap_or("");
        let parent = if path.len() >= 2 {
            path[path.len() - 2].as_str()
        } else {
            ""
        };
        let value = Some(text.to_string());

        match (parent, leaf) {
            ("ide", "nNF") => self.numero_nf = value,
            ("ide", "dhEmi") => self.dh_emi = value,
            ("ide", "dEmi") => self.d_emi = value,
            ("infProt", "chNFe") => self.ch_nfe_prot = value,

            ("emit", "CNPJ") => self.emit_cnpj = value,
            ("emit", "CPF") => self.emit_cpf = value,
            ("emit", "IE") => self.emit_ie = value,
            ("emit", "xNome") => self.emit_nome = value,
            ("enderEmit", "xLgr") => self.emit_lgr = value,
            ("enderEmit", "nro") => self.emit_nro = value,
            ("enderEmit", "cMun") => self.emit_cmun = value,
            ("enderEmit", "UF") => self.emit_uf = value,
            ("enderEmit", "CEP") => self.emit_cep = value,
            ("enderEmit", "fone") => self.emit_fone = value,

            ("dest", "CNPJ") => self.dest_cnpj = value,
            ("dest", "CPF") => self.dest_cpf = value,
            ("dest", "xNome") => self.dest_nome = value,
            ("enderDest", "cMun") => self.dest_cmun = value,
            ("enderDest", "UF") => self.dest_uf = value,

            ("ICMSTot", "vST") => self.v_st = value,
            ("ICMSTot", "vICMSUFDest") => self.v_icms_uf_dest = value,
            ("ICMSTot", "vFCPUFDest") => self.v_fcp_uf_dest = value,
            ("ICMSTot", "vFCPST") => self.v_fcp_st = value,
            _ => {}
        }
    }

    fn into_data(self) -> Result<ExtractedInvoiceData, GnreError> {
        let chave_nfe = self.chave()?;
        let numero_nf = self.numero_nf.ok_or_else(|| missing("ide/nNF"))?;
        let data_emissao = match (self.dh_emi, self.d_emi) {
            (Some(dh), _) => parse_date_time(&dh)?,
            (None, Some(d)) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                .map_err(|e| GnreError::Parse(format!("invalid ide/dEmi '{d}': {e}")))?,
            (None, None) => return Err(missing("ide/dhEmi")),
        };

        let uf_emitente =
            Uf::parse(&self.emit_uf.ok_or_else(|| missing("emit/enderEmit/UF"))?)?;
        let uf_destinatario =
            Uf::parse(&self.dest_uf.ok_or_else(|| missing("dest/enderDest/UF"))?)?;

        let emitente_documento = match (self.emit_cnpj, self.emit_cpf) {
            (Some(cnpj), _) => Documento::Cnpj(cnpj),
            (None, Some(cpf)) => Documento::Cpf(cpf),
            (None, None) => return Err(missing("emit/CNPJ")),
        };
        let destinatario_documento = match (self.dest_cnpj, self.dest_cpf) {
            (Some(cnpj), _) => Some(Documento::Cnpj(cnpj)),
            (None, Some(cpf)) => Some(Documento::Cpf(cpf)),
            (None, None) => None,
        };

        let emitente_endereco = match (self.emit_lgr, self.emit_nro) {
            (Some(lgr), Some(nro)) => Some(format!("{lgr}, {nro}")),
            (lgr, None) => lgr,
            (None, nro) => nro,
        };

        let data = ExtractedInvoiceData {
            chave_nfe,
            numero_nf,
            data_emissao,
            uf_emitente,
            uf_destinatario,
            emitente_documento,
            emitente_ie: self.emit_ie.filter(|ie| !ie.eq_ignore_ascii_case("ISENTO")),
            emitente_nome: self.emit_nome,
            emitente_endereco,
            emitente_cod_mun: self.emit_cmun,
            emitente_cep: self.emit_cep,
            emitente_telefone: self.emit_fone,
            destinatario_documento,
            destinatario_nome: self.dest_nome,
            destinatario_cod_mun: self.dest_cmun,
            valor_vst: parse_valor("ICMSTot/vST", self.v_st)?,
            valor_vicms_uf_dest: parse_valor("ICMSTot/vICMSUFDest", self.v_icms_uf_dest)?,
            valor_vfcp_uf_dest: parse_valor("ICMSTot/vFCPUFDest", self.v_fcp_uf_dest)?,
            valor_vfcpst: parse_valor("ICMSTot/vFCPST", self.v_fcp_st)?,
        };

        debug!(
            chave = %data.chave_nfe,
            uf_emitente = %data.uf_emitente,
            uf_destinatario = %data.uf_destinatario,
            "extracted NF-e"
        );
        Ok(data)
    }

    fn chave(&self) -> Result<String, GnreError> {
        let from_id = self
            .inf_nfe_id
            .as_deref()
            .map(|id| digits(id.trim_start_matches("NFe")));
        let chave = from_id
            .filter(|c| !c.is_empty())
            .or_else(|| self.ch_nfe_prot.as_deref().map(digits))
            .ok_or_else(|| missing("infNFe/@Id"))?;
        if chave.len() != 44 {
            return Err(GnreError::Parse(format!(
                "access key must have 44 digits, got {}",
                chave.len()
            )));
        }
        Ok(chave)
    }
}

fn missing(field: &str) -> GnreError {
    GnreError::Parse(format!("missing mandatory NF-e field {field}"))
}

fn parse_date_time(s: &str) -> Result<NaiveDate, GnreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d"))
        .map_err(|e| GnreError::Parse(format!("invalid ide/dhEmi '{s}': {e}")))
}

fn parse_valor(field: &str, value: Option<String>) -> Result<Decimal, GnreError> {
    match value {
        None => Ok(Decimal::ZERO),
        Some(v) => Decimal::from_str(v.trim())
            .map_err(|e| GnreError::Parse(format!("invalid {field} '{v}': {e}"))),
    }
}
