//! Core crate entry point.
//!
//! This crate holds the vocabulary shared by the goscope workspace: the
//! diagnostics collector, nominal type names, and front-end configuration.

pub mod config;
pub mod diag;
pub mod types;

pub use config::{ConfigError, FrontendConfig};
pub use diag::{Diagnostic, DiagnosticKind, Diagnostics, Echo, Line, LineCounter};
pub use types::TypeId;
