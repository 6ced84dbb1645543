//! Command implementations for volio-cmd

pub mod df;
pub mod du;
pub mod lock;
pub mod ls;
pub mod ops;
pub mod put;
#[cfg(unix)]
pub mod which;
