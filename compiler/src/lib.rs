//! Scope-resolving symbol table and activation-record allocator for a
//! Go-like front end.

pub mod semantics;

pub use goscope_core::{Diagnostics, FrontendConfig, TypeId};
pub use semantics::{LookupMode, ScopeEvent, ScopeId, ScopeKind, ScopeManager, Walker};
