//! Manage annotations on Fritz/SkyPortal sources.
//!
//! Layers, from the inside out:
//! - [`domain`]: actions, targets, annotations, value coercion
//! - [`application`]: the annotation manager and tabular input reader
//! - [`infrastructure`]: filesystem and HTTP boundaries, service wiring
//! - [`cli`]: argument parsing, dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
