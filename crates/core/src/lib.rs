//! Domain logic shared by the Stock API crates.
//!
//! Nothing in this crate performs I/O: the admission gate keeps its windows in
//! memory and the asset rules only inspect names and bytes.

pub mod assets;
pub mod error;
pub mod rate_gate;
pub mod types;
