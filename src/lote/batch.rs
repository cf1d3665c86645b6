use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{GNRE_NS, VERSAO_LAYOUT};
use crate::core::need::{compute_amounts, derive_receita, is_receita_code};
use crate::core::*;
use crate::xml_utils::{XmlWriter, digits, format_valor};

/// `documentoOrigem tipo` for an NF-e number.
pub const DOC_ORIGEM_NFE: &str = "10";

/// `camposExtras` code carrying the NF-e access key.
const CAMPO_EXTRA_CHAVE: &str = "107";

/// A rendered `TLote_GNRE` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPayload {
    pub xml: String,
    pub uf_favorecida: Uf,
    pub receita: String,
    pub valor_total: Decimal,
}

impl BatchPayload {
    pub fn as_str(&self) -> &str {
        &self.xml
    }
}

/// Render a one-guide GNRE lot.
///
/// `uf_favorecida` defaults to the destination state and `receita` to the
/// code implied by the invoice values. Dates are the caller's choice.
pub fn build_lote_xml(
    data: &ExtractedInvoiceData,
    uf_favorecida: Option<&str>,
    receita: Option<&str>,
    data_vencimento: NaiveDate,
    data_pagamento: Option<NaiveDate>,
) -> Result<BatchPayload, GnreError> {
    let mut builder = LoteBuilder::new(data, data_vencimento);
    if let Some(uf) = uf_favorecida {
        builder = builder.uf_favorecida(uf);
    }
    if let Some(r) = receita {
        builder = builder.receita(r);
    }
    if let Some(d) = data_pagamento {
        builder = builder.data_pagamento(d);
    }
    builder.build()
}

/// Builder for a `TLote_GNRE` with one guide.
///
/// ```
/// use chrono::NaiveDate;
/// use gnre::lote::LoteBuilder;
/// # fn demo(data: &gnre::ExtractedInvoiceData) -> Result<(), gnre::GnreError> {
/// let vencimento = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
/// let lote = LoteBuilder::new(data, vencimento)
///     .uf_favorecida("RJ")
///     .detalhamento_receita("000055")
///     .build()?;
/// println!("{}", lote.xml);
/// # Ok(())
/// # }
/// ```
pub struct LoteBuilder<'a> {
    data: &'a ExtractedInvoiceData,
    uf_favorecida: Option<String>,
    receita: Option<String>,
    detalhamento_receita: Option<String>,
    produto: Option<String>,
    doc_origem_tipo: String,
    incluir_campo_107: bool,
    valor_principal: Option<Decimal>,
    razao_social_emitente: Option<String>,
    data_vencimento: NaiveDate,
    data_pagamento: Option<NaiveDate>,
}

impl<'a> LoteBuilder<'a> {
    pub fn new(data: &'a ExtractedInvoiceData, data_vencimento: NaiveDate) -> Self {
        Self {
            data,
            uf_favorecida: None,
            receita: None,
            detalhamento_receita: None,
            produto: None,
            doc_origem_tipo: DOC_ORIGEM_NFE.to_string(),
            incluir_campo_107: true,
            valor_principal: None,
            razao_social_emitente: None,
            data_vencimento,
            data_pagamento: None,
        }
    }

    /// Builder seeded with the favored state and revenue code of `decision`.
    ///
    /// Fails unless the decision says a guide is required.
    pub fn from_decision(
        data: &'a ExtractedInvoiceData,
        decision: &NeedDecision,
        data_vencimento: NaiveDate,
    ) -> Result<Self, GnreError> {
        if !decision.is_required() {
            return Err(GnreError::Build(format!(
                "no GNRE to build: decision is {:?}",
                decision.status
            )));
        }
        let mut builder = Self::new(data, data_vencimento)
            .uf_favorecida(decision.uf_favorecida.as_str());
        if let Some(r) = &decision.receita {
            builder = builder.receita(r);
        }
        Ok(builder)
    }

    pub fn uf_favorecida(mut self, uf: &str) -> Self {
        self.uf_favorecida = Some(uf.to_string());
        self
    }

    pub fn receita(mut self, receita: &str) -> Self {
        self.receita = Some(receita.to_string());
        self
    }

    pub fn detalhamento_receita(mut self, detalhamento: &str) -> Self {
        self.detalhamento_receita = Some(detalhamento.to_string());
        self
    }

    pub fn produto(mut self, produto: &str) -> Self {
        self.produto = Some(produto.to_string());
        self
    }

    /// `documentoOrigem tipo` (default `10`, NF-e number).
    pub fn doc_origem_tipo(mut self, tipo: &str) -> Self {
        self.doc_origem_tipo = tipo.trim().to_string();
        self
    }

    /// Whether to send the access key as extra field 107 (default `true`).
    pub fn incluir_campo_107(mut self, incluir: bool) -> Self {
        self.incluir_campo_107 = incluir;
        self
    }

    /// Replace the principal computed from the invoice values.
    pub fn valor_principal(mut self, valor: Decimal) -> Self {
        self.valor_principal = Some(valor);
        self
    }

    /// Replace the issuer name taken from the invoice.
    pub fn razao_social_emitente(mut self, razao: &str) -> Self {
        self.razao_social_emitente = Some(razao.to_string());
        self
    }

    pub fn data_pagamento(mut self, data: NaiveDate) -> Self {
        self.data_pagamento = Some(data);
        self
    }

    pub fn build(self) -> Result<BatchPayload, GnreError> {
        let data = self.data;

        let uf_raw = self
            .uf_favorecida
            .as_deref()
            .unwrap_or(data.uf_destinatario.as_str())
            .trim()
            .to_uppercase();
        if !is_known_uf(&uf_raw) {
            return Err(GnreError::Build(format!(
                "ufFavorecida '{uf_raw}' is not a Brazilian state"
            )));
        }
        let uf = Uf::parse(&uf_raw).map_err(|e| GnreError::Build(e.to_string()))?;

        let receita = match self.receita.as_deref().map(str::trim) {
            Some(r) if is_receita_code(r) => r.to_string(),
            Some(r) => {
                return Err(GnreError::Build(format!(
                    "receita must have 6 digits, got '{r}'"
                )));
            }
            None => derive_receita(data)
                .ok_or_else(|| {
                    GnreError::Build(
                        "receita not given and not derivable from the NF-e values".into(),
                    )
                })?
                .to_string(),
        };

        let chave = data.chave_nfe.trim();
        if chave.is_empty() || chave.len() > 44 || !chave.chars().all(|c| c.is_ascii_digit()) {
            return Err(GnreError::Build(format!("invalid documentoOrigem key '{chave}'")));
        }
        if data.emitente_documento.numero().trim().is_empty() {
            return Err(GnreError::Build("issuer must have a CNPJ or CPF".into()));
        }

        let mut valores = compute_amounts(data, Some(&receita));
        if let Some(principal) = self.valor_principal {
            valores.principal = principal;
            valores.total = principal + valores.fcp;
        }
        if valores.principal < Decimal::ZERO {
            return Err(GnreError::Build(format!(
                "invalid principal value {}",
                valores.principal
            )));
        }

        let doc_origem = {
            let numero = digits(&data.numero_nf);
            if numero.is_empty() { digits(chave) } else { numero }
        };
        let mes = format!("{:02}", self.data_vencimento.month());
        let ano = format!("{:04}", self.data_vencimento.year());
        let vencimento = self.data_vencimento.format("%Y-%m-%d").to_string();

        let mut w = XmlWriter::new();
        w.start_element_with_attrs(
            "TLote_GNRE",
            &[("xmlns", GNRE_NS), ("versao", VERSAO_LAYOUT)],
        )?;
        w.start_element("guias")?;
        w.start_element_with_attrs("TDadosGNRE", &[("versao", VERSAO_LAYOUT)])?;
        w.text_element("ufFavorecida", uf.as_str())?;
        w.text_element("tipoGnre", "0")?;

        // --- contribuinteEmitente ---
        w.start_element("contribuinteEmitente")?;
        w.start_element("identificacao")?;
        w.text_element(data.emitente_documento.tag(), data.emitente_documento.numero())?;
        if data.uf_emitente == uf {
            w.opt_text_element("IE", data.emitente_ie.as_deref())?;
        }
        w.end_element("identificacao")?;
        w.opt_text_element(
            "razaoSocial",
            self.razao_social_emitente
                .as_deref()
                .or(data.emitente_nome.as_deref()),
        )?;
        w.opt_text_element("endereco", data.emitente_endereco.as_deref())?;
        w.opt_text_element(
            "municipio",
            data.emitente_cod_mun.as_deref().and_then(municipio5).as_deref(),
        )?;
        w.text_element("uf", data.uf_emitente.as_str())?;
        w.opt_text_element("cep", data.emitente_cep.as_deref())?;
        w.opt_text_element("telefone", data.emitente_telefone.as_deref())?;
        w.end_element("contribuinteEmitente")?;

        // --- itensGNRE ---
        w.start_element("itensGNRE")?;
        w.start_element("item")?;
        w.text_element("receita", &receita)?;
        w.opt_text_element("detalhamentoReceita", self.detalhamento_receita.as_deref())?;
        w.text_element_with_attrs(
            "documentoOrigem",
            &doc_origem,
            &[("tipo", self.doc_origem_tipo.as_str())],
        )?;
        w.opt_text_element("produto", self.produto.as_deref())?;
        w.start_element("referencia")?;
        w.text_element("periodo", "0")?;
        w.text_element("mes", &mes)?;
        w.text_element("ano", &ano)?;
        w.end_element("referencia")?;
        w.text_element("dataVencimento", &vencimento)?;
        w.text_element_with_attrs("valor", &format_valor(valores.principal), &[("tipo", "11")])?;
        w.text_element_with_attrs("valor", &format_valor(valores.total), &[("tipo", "21")])?;
        if valores.fcp > Decimal::ZERO {
            w.text_element_with_attrs("valor", &format_valor(valores.fcp), &[("tipo", "27")])?;
        }
        if let Some(doc) = &data.destinatario_documento {
            w.start_element("contribuinteDestinatario")?;
            w.start_element("identificacao")?;
            w.text_element(doc.tag(), doc.numero())?;
            w.end_element("identificacao")?;
            w.opt_text_element("razaoSocial", data.destinatario_nome.as_deref())?;
            w.opt_text_element(
                "municipio",
                data.destinatario_cod_mun.as_deref().and_then(municipio5).as_deref(),
            )?;
            w.end_element("contribuinteDestinatario")?;
        }
        if self.incluir_campo_107 && chave.len() == 44 {
            w.start_element("camposExtras")?;
            w.start_element("campoExtra")?;
            w.text_element("codigo", CAMPO_EXTRA_CHAVE)?;
            w.text_element("valor", chave)?;
            w.end_element("campoExtra")?;
            w.end_element("camposExtras")?;
        }
        w.end_element("item")?;
        w.end_element("itensGNRE")?;

        w.text_element("valorGNRE", &format_valor(valores.total))?;
        if let Some(pagamento) = self.data_pagamento {
            w.text_element("dataPagamento", &pagamento.format("%Y-%m-%d").to_string())?;
        }
        w.end_element("TDadosGNRE")?;
        w.end_element("guias")?;
        w.end_element("TLote_GNRE")?;

        Ok(BatchPayload {
            xml: w.into_string()?,
            uf_favorecida: uf,
            receita,
            valor_total: valores.total,
        })
    }
}

/// GNRE wants the 5-digit municipality code (IBGE code without the UF prefix).
fn municipio5(cmun: &str) -> Option<String> {
    let d = digits(cmun);
    match d.len() {
        7 => Some(d[2..].to_string()),
        5 => Some(d),
        n if n > 5 => Some(d[n - 5..].to_string()),
        _ => None,
    }
}
