//! Error types for the symbol layer.
//!
//! [`ScopeError`] values are contract violations by the traversal driver,
//! such as attaching a signature to a block scope. Drivers propagate them
//! and abort the pass; they are never turned into user diagnostics.
//! [`CallError`] describes a call site that disagrees with its callee and
//! is meant to be reported to the user.

use thiserror::Error;

use goscope_core::types::TypeId;

use crate::semantics::ids::ScopeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("scope {scope} is not an activation record")]
    NotActivationRecord { scope: ScopeId },
    #[error("no scope with index {scope}")]
    UnknownScope { scope: ScopeId },
    #[error("`{name}` is not bound in scope {scope}")]
    Unbound { name: String, scope: ScopeId },
    #[error("type `{name}` is not defined in scope {scope}")]
    UnknownTypeDef { name: String, scope: ScopeId },
    #[error("scope exit without a matching entry")]
    UnbalancedExit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("function {name} not declared")]
    NotDeclared { name: String },
    #[error("number of arguments do not match the function signature: {name} expects {expected}, given {given}")]
    ArgumentCount {
        name: String,
        expected: usize,
        given: usize,
    },
    #[error("Argument {position} is expected to be {expected} but given {given}")]
    ArgumentType {
        /// 1-based position of the first mismatching argument.
        position: usize,
        expected: TypeId,
        given: TypeId,
    },
}
