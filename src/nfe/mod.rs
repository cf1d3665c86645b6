//! NF-e field extraction.
//!
//! Reads the parts of an NF-e (layouts 3.10 and 4.00, with or without the
//! `nfeProc` authorization wrapper) that a GNRE needs: states, parties,
//! access key and the ICMS totals.
//!
//! ```no_run
//! let bytes = std::fs::read("nota.xml").unwrap();
//! let data = gnre::nfe::extract_nfe(&bytes).unwrap();
//! println!("{} -> {}", data.uf_emitente, data.uf_destinatario);
//! ```

mod extract;

pub use extract::{extract_nfe, from_nfe_xml};
