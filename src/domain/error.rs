//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the annotation workflow's rules.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("unknown action '{0}': please specify action as one of 'post', 'update', or 'delete'")]
    UnknownAction(String),

    #[error("missing required column '{column}' in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("please specify annotation value to update or post (missing for {obj_id})")]
    MissingValue { obj_id: String },

    #[error("invalid annotation listing for {obj_id}: {message}")]
    InvalidAnnotation { obj_id: String, message: String },
}
