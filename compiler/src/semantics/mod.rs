//! Semantic analysis facade.
//!
//! This module ties together the scope-aware symbol tables and the
//! event-driven walker that feeds them from a syntax-tree traversal.

pub mod ids;
pub mod symbols;
pub mod walker;

pub use ids::ScopeId;
pub use symbols::{
    ActivationRecord, CallError, DeclarationResult, LookupMode, ScopeError, ScopeKind,
    ScopeManager, ScopeTable,
};
pub use walker::{ScopeEvent, Slot, WalkReport, Walker};
