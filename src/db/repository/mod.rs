//! Repository layer: entity-scoped database operations.
//!
//! Free functions taking a `&Connection`; `db::store` wraps them behind the
//! collaborator traits.

mod reading;
mod reminder;

pub use reading::*;
pub use reminder::*;
