//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, ApiClient)
//! but are themselves concrete structs, not traits.

mod annotation;

pub use annotation::{AnnotationRequest, AnnotationService, BatchReport, FailedStep, Outcome};
