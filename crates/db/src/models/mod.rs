//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - `Serialize` response projections handed to API clients
//! - `Deserialize` create/update DTOs

pub mod category;
pub mod product;
pub mod user;
