//! Domain layer: entities and business rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod value;

pub use entities::*;
pub use error::DomainError;
pub use value::{coerce_value, display_value};
