//! Input parsing (TPTP clausal fragment).

pub mod tptp;

pub use tptp::parse_tptp;
