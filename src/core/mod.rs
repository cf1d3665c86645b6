//! Core GNRE types, errors and the need decision.
//!
//! Everything here is pure: no I/O, no XML, no network.

mod error;
pub mod need;
mod types;
pub mod ufs;

pub use error::*;
pub use need::{GuideAmounts, NeedDecision, NeedStatus, evaluate};
pub use types::*;
pub use ufs::{Uf, is_known_uf};
