//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access-token issuing and validation.
//! - [`identity`] -- resolving a token to the user it names.

pub mod identity;
pub mod jwt;
pub mod password;
