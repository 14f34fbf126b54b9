//! Request gates.
//!
//! - [`rate_limit`] -- fixed-window admission, applied as route layers.
//! - [`auth::AuthUser`] -- extracts the authenticated user from a Bearer token.

pub mod auth;
pub mod rate_limit;
