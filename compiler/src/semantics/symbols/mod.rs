//! Symbol tables and scope management.
//!
//! Scope tables hold bindings and type names for one lexical region; the
//! scope manager strings them into a tree, tracks which are active, and
//! lays out activation records as declarations arrive.

pub mod arena;
pub mod binding;
pub mod display;
pub mod error;
pub mod manager;
pub mod scope;

pub use arena::{OffsetStack, ScopeArena, ScopeIdStack};
pub use binding::{Binding, BindingAttr, FieldLayout, Resolved, TypeDef};
pub use display::{ScopeFormatter, format_scopes};
pub use error::{CallError, ScopeError};
pub use manager::{DeclarationResult, LookupMode, ScopeManager};
pub use scope::{ActivationRecord, ScopeKind, ScopeTable};
