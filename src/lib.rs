//! # gnre
//!
//! Issue a GNRE (Guia Nacional de Recolhimento de Tributos Estaduais) for an
//! interstate NF-e: decide whether a guide is owed, build the `TLote_GNRE`
//! batch, submit it to the GNRE web services over client-certificate TLS and
//! read back the bar-code line and PDF.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use gnre::lote::LoteBuilder;
//! use gnre::nfe::from_nfe_xml;
//! use gnre::{NeedStatus, evaluate};
//!
//! # fn main() -> gnre::GnreResult<()> {
//! # let xml = r#"<NFe><infNFe Id="NFe31240611222333000181550010000045671000045678">
//! #   <ide><nNF>4567</nNF><dhEmi>2024-06-20T14:05:00-03:00</dhEmi></ide>
//! #   <emit><CNPJ>11222333000181</CNPJ><enderEmit><UF>MG</UF></enderEmit></emit>
//! #   <dest><CPF>12345678909</CPF><enderDest><UF>RJ</UF></enderDest></dest>
//! #   <total><ICMSTot><vICMSUFDest>22.83</vICMSUFDest><vFCPUFDest>7.61</vFCPUFDest></ICMSTot></total>
//! # </infNFe></NFe>"#;
//! let nota = from_nfe_xml(xml)?;
//! let decision = evaluate(&nota, None);
//!
//! if decision.status == NeedStatus::Required {
//!     let vencimento = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
//!     let lote = LoteBuilder::from_decision(&nota, &decision, vencimento)?.build()?;
//!     assert!(lote.as_str().contains("<receita>100102</receita>"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `transport` (default) | `HttpTransport` (blocking `reqwest`, rustls) and PFX decoding |
//!
//! Without `transport` the crate still builds payloads and envelopes and
//! parses responses; bring your own [`soap::Transport`].

pub mod core;
pub mod lote;
pub mod nfe;
pub mod soap;

pub(crate) mod xml_utils;

pub use crate::core::*;
