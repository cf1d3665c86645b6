//! GNRE payloads (layout 2.00).
//!
//! - [`build_lote_xml`] / [`LoteBuilder`]: the `TLote_GNRE` batch submitted
//!   to `GnreLoteRecepcao`;
//! - [`build_consulta_resultado_xml`]: the `TConsLote_GNRE` result query;
//! - [`build_lote_consulta_xml`] and [`build_consulta_config_uf_xml`]: guide
//!   lookup and per-state configuration queries.
//!
//! The service validates element order against its schema, so every builder
//! writes elements in schema order.

mod batch;
mod consulta;

pub use batch::{BatchPayload, DOC_ORIGEM_NFE, LoteBuilder, build_lote_xml};
pub use consulta::{
    ConsultaGuia, ConsultaResultadoOptions, build_consulta_config_uf_xml,
    build_consulta_resultado_xml, build_lote_consulta_xml,
};

/// Namespace of GNRE payloads.
pub const GNRE_NS: &str = "http://www.gnre.pe.gov.br";

/// Layout version written in `versao` attributes.
pub const VERSAO_LAYOUT: &str = "2.00";
