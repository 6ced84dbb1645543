//! Core definitions shared by all volio-* crates: the closed error vocabulary
//! and the `Result` alias.

pub mod error;
pub mod result;

pub use error::{Error, ErrorCode, ErrorKind};
pub use result::Result;
