//! SOAP plumbing for the GNRE web services.
//!
//! Building an envelope, delivering it over mutual TLS and reading the answer
//! are separate steps so each can be used (and tested) on its own:
//!
//! 1. [`wrap_batch_submission`] / [`wrap_operation`] build an [`Envelope`];
//! 2. a [`Transport`] posts it to the URL from [`EndpointSet`];
//! 3. [`parse_receipt`], [`parse_status`] and [`parse_guide_result`] read the
//!    response.
//!
//! [`GnreClient`] strings the three together.

pub mod certificate;
mod client;
mod endpoints;
mod envelope;
mod response;
mod transport;

#[cfg(feature = "transport")]
pub use certificate::CertificateSession;
pub use certificate::{CertificateBundle, SecretBytes};
pub use client::GnreClient;
pub use endpoints::{EndpointSet, Operation, get_endpoints};
pub use envelope::{Envelope, GNRE_WS_NS, SOAP_ENV_NS, wrap_batch_submission, wrap_operation};
pub use response::{
    CODIGO_LOTE_RECEBIDO, is_soap_fault, parse_guide_result, parse_receipt, parse_status,
};
#[cfg(feature = "transport")]
pub use transport::HttpTransport;
pub use transport::{Transport, TransportConfig};
