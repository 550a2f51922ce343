//! `subrecon-extract` — Turns a raw, loosely-structured table of payment
//! rows into the canonical 6-column schedule, and checks its internal
//! total-row consistency.
//!
//! Input is a 2-D grid of trimmed cell strings; where the grid came from
//! (xlsx, portal export) is the caller's concern.

pub mod error;
pub mod extractor;
pub mod grid;
pub mod validator;

pub use error::ExtractError;
pub use extractor::extract;
pub use validator::validate;
