//! Query payloads: lot result, guide lookup and per-state configuration.

use super::{GNRE_NS, VERSAO_LAYOUT};
use crate::core::*;
use crate::xml_utils::XmlWriter;

/// Flags of a `TConsLote_GNRE` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsultaResultadoOptions {
    pub incluir_pdf: bool,
    pub incluir_arquivo_pagamento: bool,
    pub incluir_noticias: bool,
}

impl Default for ConsultaResultadoOptions {
    fn default() -> Self {
        Self {
            incluir_pdf: true,
            incluir_arquivo_pagamento: false,
            incluir_noticias: false,
        }
    }
}

/// `TConsLote_GNRE`: ask for the result of a submitted lot.
pub fn build_consulta_resultado_xml(
    env: Environment,
    recibo: &Receipt,
    options: ConsultaResultadoOptions,
) -> GnreResult<String> {
    if recibo.as_str().trim().is_empty() {
        return Err(GnreError::Build("numeroRecibo is empty".into()));
    }
    let mut w = XmlWriter::new();
    w.start_element_with_attrs("TConsLote_GNRE", &[("xmlns", GNRE_NS)])?;
    w.text_element("ambiente", env.ambiente())?;
    w.text_element("numeroRecibo", recibo.as_str())?;
    if options.incluir_pdf {
        w.text_element("incluirPDFGuias", "S")?;
    }
    if options.incluir_arquivo_pagamento {
        w.text_element("incluirArquivoPagamento", "S")?;
    }
    if options.incluir_noticias {
        w.text_element("incluirNoticias", "S")?;
    }
    w.end_element("TConsLote_GNRE")?;
    w.into_string()
}

/// Lookup key types accepted by `tipoConsulta`.
const TIPOS_CONSULTA: &[&str] = &["C", "N", "D", "CD", "ND", "CR", "NR"];

/// Parameters of a guide lookup (`TLote_ConsultaGNRE`).
#[derive(Debug, Clone, Default)]
pub struct ConsultaGuia {
    pub uf: String,
    /// `C` barcode, `N` control number, `D` origin document, and their
    /// combinations.
    pub tipo_consulta: String,
    pub emitente: Option<Documento>,
    pub emitente_ie: Option<String>,
    pub cod_barras: Option<String>,
    pub num_controle: Option<String>,
    /// `(tipo, numero)` of the origin document.
    pub doc_origem: Option<(String, String)>,
}

/// `TLote_ConsultaGNRE`: look up previously issued guides.
pub fn build_lote_consulta_xml(consulta: &ConsultaGuia) -> GnreResult<String> {
    if !is_known_uf(&consulta.uf) {
        return Err(GnreError::Build(format!("unknown uf '{}'", consulta.uf)));
    }
    if !TIPOS_CONSULTA.contains(&consulta.tipo_consulta.as_str()) {
        return Err(GnreError::Build(format!(
            "invalid tipoConsulta '{}'",
            consulta.tipo_consulta
        )));
    }

    let mut w = XmlWriter::new();
    w.start_element_with_attrs(
        "TLote_ConsultaGNRE",
        &[("xmlns", GNRE_NS), ("versao", VERSAO_LAYOUT)],
    )?;
    w.start_element("consulta")?;
    w.text_element("uf", &consulta.uf)?;
    if consulta.emitente.is_some() || consulta.emitente_ie.is_some() {
        w.start_element("emitenteId")?;
        if let Some(doc) = &consulta.emitente {
            w.text_element(doc.tag(), doc.numero())?;
        }
        w.opt_text_element("IE", consulta.emitente_ie.as_deref())?;
        w.end_element("emitenteId")?;
    }
    w.opt_text_element("codBarras", consulta.cod_barras.as_deref())?;
    w.opt_text_element("numControle", consulta.num_controle.as_deref())?;
    if let Some((tipo, numero)) = &consulta.doc_origem {
        w.text_element_with_attrs("docOrigem", numero, &[("tipo", tipo.as_str())])?;
    }
    w.text_element("tipoConsulta", &consulta.tipo_consulta)?;
    w.end_element("consulta")?;
    w.end_element("TLote_ConsultaGNRE")?;
    w.into_string()
}

/// `TConsultaConfigUf`: ask which revenues/fields a state requires.
///
/// `tipos_gnre` is only sent when it is `S` or `N`.
pub fn build_consulta_config_uf_xml(
    env: Environment,
    uf: &str,
    receita: Option<&str>,
    tipos_gnre: Option<&str>,
) -> GnreResult<String> {
    if !is_known_uf(uf) {
        return Err(GnreError::Build(format!("unknown uf '{uf}'")));
    }
    let mut w = XmlWriter::new();
    w.start_element_with_attrs("TConsultaConfigUf", &[("xmlns", GNRE_NS)])?;
    w.text_element("ambiente", env.ambiente())?;
    w.text_element("uf", uf)?;
    w.opt_text_element("receita", receita)?;
    w.opt_text_element("tiposGnre", tipos_gnre.filter(|t| matches!(*t, "S" | "N")))?;
    w.end_element("TConsultaConfigUf")?;
    w.into_string()
}
