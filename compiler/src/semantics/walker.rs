//! Event-driven traversal over the scope manager.
//!
//! A parser reports what it sees as a stream of [`ScopeEvent`]s: scope
//! entry and exit, declarations, function headers, calls and references.
//! The walker applies each event to a [`ScopeManager`], records
//! user-facing problems in a [`Diagnostics`] collector tagged with the
//! current source line, and keeps going. Contract violations by the event
//! producer come back as [`ScopeError`] and stop the walk.

use goscope_core::config::FrontendConfig;
use goscope_core::diag::{DiagnosticKind, Diagnostics, Echo, LineCounter};
use goscope_core::types::TypeId;

use crate::semantics::ids::ScopeId;
use crate::semantics::symbols::error::ScopeError;
use crate::semantics::symbols::manager::{DeclarationResult, LookupMode, ScopeManager};
use crate::semantics::symbols::scope::ScopeKind;

/// Primitive types visible from the global scope, with their sizes.
pub const BUILTIN_TYPES: &[(&str, usize)] = &[
    ("int", 4),
    ("float", 8),
    ("string", 8),
    ("bool", 1),
    ("rune", 4),
];

/// A declared parameter or struct member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    pub ty: TypeId,
    pub size: usize,
}

impl Slot {
    pub fn new(name: impl Into<String>, ty: TypeId, size: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            size,
        }
    }
}

/// Things a syntax-tree traversal tells the symbol layer about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeEvent {
    /// Newlines consumed since the previous event.
    Newlines(u32),
    /// Enter a block-like scope continuing the current frame.
    Enter(ScopeKind),
    /// Enter a scope with its own activation record.
    EnterFrame(ScopeKind),
    Exit,
    Declare(Slot),
    DeclareType {
        name: String,
        ty: TypeId,
        size: usize,
        fields: Vec<Slot>,
    },
    /// Function header: opens the function's frame, which a later `Exit`
    /// closes.
    Function {
        name: String,
        params: Vec<Slot>,
        returns: Vec<(TypeId, usize)>,
        return_slot: Option<String>,
    },
    Call {
        name: String,
        args: Vec<TypeId>,
    },
    Reference(String),
    TypeReference(String),
    Temporary {
        ty: TypeId,
        size: usize,
    },
    Label,
    LexicalError(String),
}

/// Summary of a completed walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
    pub temporaries: Vec<String>,
    pub labels: Vec<String>,
    /// Function frames in the order they were closed.
    pub functions: Vec<(String, ScopeId)>,
    pub diagnostics: usize,
}

/// Drives a [`ScopeManager`] from a stream of traversal events.
#[derive(Debug)]
pub struct Walker {
    scopes: ScopeManager,
    diagnostics: Diagnostics,
    lines: LineCounter,
    open_functions: Vec<(String, ScopeId)>,
}

impl Walker {
    pub fn new() -> Self {
        Self::with_config(FrontendConfig::default())
    }

    /// Build a walker whose diagnostics follow `config.echo_diagnostics`.
    pub fn with_config(config: FrontendConfig) -> Self {
        let echo = if config.echo_diagnostics {
            Echo::Stderr
        } else {
            Echo::Silent
        };
        Self::with_parts(ScopeManager::with_config(config), Diagnostics::with_echo(echo))
    }

    /// Build a walker around existing state. Builtin types are defined in
    /// the global scope.
    pub fn with_parts(mut scopes: ScopeManager, diagnostics: Diagnostics) -> Self {
        for (name, size) in BUILTIN_TYPES {
            scopes.declare_global_type(*name, TypeId::new(*name), *size);
        }
        Self {
            scopes,
            diagnostics,
            lines: LineCounter::new(),
            open_functions: Vec::new(),
        }
    }

    pub fn scopes(&self) -> &ScopeManager {
        &self.scopes
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (ScopeManager, Diagnostics) {
        (self.scopes, self.diagnostics)
    }

    /// Apply every event in order.
    pub fn run<I>(&mut self, events: I) -> Result<WalkReport, ScopeError>
    where
        I: IntoIterator<Item = ScopeEvent>,
    {
        let mut report = WalkReport::default();
        for event in events {
            self.apply(event, &mut report)?;
        }
        report.diagnostics = self.diagnostics.count();
        tracing::debug!(
            diagnostics = report.diagnostics,
            temporaries = report.temporaries.len(),
            "walk finished"
        );
        Ok(report)
    }

    fn apply(&mut self, event: ScopeEvent, report: &mut WalkReport) -> Result<(), ScopeError> {
        match event {
            ScopeEvent::Newlines(count) => self.lines.add(count),
            ScopeEvent::Enter(kind) => {
                self.scopes.open_scope(kind);
            }
            ScopeEvent::EnterFrame(kind) => {
                self.scopes.open_frame(kind);
            }
            ScopeEvent::Exit => {
                let closed = self.scopes.close_scope().ok_or(ScopeError::UnbalancedExit)?;
                if let Some(position) = self
                    .open_functions
                    .iter()
                    .rposition(|(_, scope)| *scope == closed)
                {
                    report.functions.push(self.open_functions.remove(position));
                }
            }
            ScopeEvent::Declare(slot) => self.declare(slot),
            ScopeEvent::DeclareType {
                name,
                ty,
                size,
                fields,
            } => {
                self.scopes.declare_type(name.as_str(), ty, size);
                for field in fields {
                    self.scopes
                        .current_table_mut()
                        .add_field(&name, field.name, field.ty, field.size)?;
                }
            }
            ScopeEvent::Function {
                name,
                params,
                returns,
                return_slot,
            } => self.function_header(name, params, returns, return_slot)?,
            ScopeEvent::Call { name, args } => {
                if let Err(err) = self.scopes.check_call(&name, &args) {
                    self.report(DiagnosticKind::CallMismatch, err.to_string());
                }
            }
            ScopeEvent::Reference(name) => {
                if !self.scopes.resolve_identifier(&name, LookupMode::Default) {
                    self.report(
                        DiagnosticKind::UndeclaredIdentifier,
                        format!("identifier `{}` not declared", name),
                    );
                }
            }
            ScopeEvent::TypeReference(name) => {
                if !self.scopes.resolve_type(&name, LookupMode::Default) {
                    self.report(
                        DiagnosticKind::UndeclaredType,
                        format!("type `{}` not declared", name),
                    );
                }
            }
            ScopeEvent::Temporary { ty, size } => {
                report.temporaries.push(self.scopes.declare_temporary(ty, size));
            }
            ScopeEvent::Label => report.labels.push(self.scopes.new_label()),
            ScopeEvent::LexicalError(message) => {
                self.report(DiagnosticKind::LexicalError, message);
            }
        }
        Ok(())
    }

    fn declare(&mut self, slot: Slot) {
        let name = slot.name.clone();
        let outcome = self.scopes.declare(slot.name, slot.ty, slot.size);
        if let DeclarationResult::Duplicate { existing, scope } = outcome {
            if self.scopes.config().report_redeclarations {
                self.report(
                    DiagnosticKind::Redeclaration,
                    format!(
                        "`{}` already declared as {} in scope {}",
                        name, existing, scope
                    ),
                );
            }
        }
    }

    fn function_header(
        &mut self,
        name: String,
        params: Vec<Slot>,
        returns: Vec<(TypeId, usize)>,
        return_slot: Option<String>,
    ) -> Result<(), ScopeError> {
        let scope = self.scopes.open_frame(ScopeKind::Function);
        self.scopes.register_function(name.as_str());
        self.scopes.mark_activation_record();
        self.scopes
            .set_signature(params.iter().map(|param| param.ty.clone()).collect())?;
        self.scopes
            .set_param_sizes(params.iter().map(|param| param.size).collect())?;

        let (return_types, return_sizes): (Vec<_>, Vec<_>) = returns.into_iter().unzip();
        self.scopes.set_return_type(return_types)?;
        self.scopes.set_return_size(return_sizes)?;
        if let Some(slot) = return_slot {
            self.scopes.set_return_slot(slot)?;
        }

        for param in params {
            self.declare(param);
        }

        self.open_functions.push((name, scope));
        Ok(())
    }

    fn report(&mut self, kind: DiagnosticKind, message: String) {
        let line = self.lines.current().get();
        self.diagnostics.record(kind, line, message);
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> Walker {
        Walker::with_parts(ScopeManager::new(), Diagnostics::silent())
    }

    fn reference(name: &str) -> ScopeEvent {
        ScopeEvent::Reference(name.to_string())
    }

    #[test]
    fn builtin_types_resolve_globally() {
        let walker = quiet();
        for (name, _) in BUILTIN_TYPES {
            assert!(walker.scopes().resolve_type(name, LookupMode::Global));
        }
    }

    #[test]
    fn undeclared_references_are_reported_with_their_line() {
        let mut walker = quiet();
        let report = walker
            .run(vec![
                ScopeEvent::Declare(Slot::new("x", TypeId::int(), 4)),
                ScopeEvent::Newlines(2),
                reference("x"),
                reference("y"),
                ScopeEvent::Newlines(1),
                ScopeEvent::TypeReference("Point".into()),
            ])
            .unwrap();

        assert_eq!(report.diagnostics, 2);
        assert_eq!(
            walker.diagnostics().rendered(),
            vec![
                "[UndeclaredIdentifier]: identifier `y` not declared (line: 2)".to_string(),
                "[UndeclaredType]: type `Point` not declared (line: 3)".to_string(),
            ]
        );
    }

    #[test]
    fn unbalanced_exit_stops_the_walk() {
        let mut walker = quiet();
        let err = walker
            .run(vec![
                ScopeEvent::Enter(ScopeKind::Block),
                ScopeEvent::Exit,
                ScopeEvent::Exit,
            ])
            .unwrap_err();
        assert_eq!(err, ScopeError::UnbalancedExit);
    }

    #[test]
    fn redeclarations_are_silent_by_default() {
        let mut walker = quiet();
        walker
            .run(vec![
                ScopeEvent::Declare(Slot::new("x", TypeId::int(), 4)),
                ScopeEvent::Declare(Slot::new("x", TypeId::string(), 8)),
            ])
            .unwrap();
        assert!(walker.diagnostics().is_empty());
    }

    #[test]
    fn redeclarations_can_be_reported() {
        let config = FrontendConfig {
            report_redeclarations: true,
            ..FrontendConfig::default()
        };
        let mut walker =
            Walker::with_parts(ScopeManager::with_config(config), Diagnostics::silent());
        walker
            .run(vec![
                ScopeEvent::Declare(Slot::new("x", TypeId::int(), 4)),
                ScopeEvent::Declare(Slot::new("x", TypeId::string(), 8)),
            ])
            .unwrap();

        assert_eq!(walker.diagnostics().count(), 1);
        assert!(walker.diagnostics().has_kind(&DiagnosticKind::Redeclaration));
        let first = walker.diagnostics().iter().next().unwrap();
        assert_eq!(first.message, "`x` already declared as int in scope 0");
    }

    #[test]
    fn struct_types_carry_their_fields() {
        let mut walker = quiet();
        walker
            .run(vec![ScopeEvent::DeclareType {
                name: "Point".into(),
                ty: TypeId::new("Point"),
                size: 8,
                fields: vec![
                    Slot::new("x", TypeId::int(), 4),
                    Slot::new("y", TypeId::int(), 4),
                ],
            }])
            .unwrap();

        let def = walker
            .scopes()
            .scope(ScopeId::GLOBAL)
            .and_then(|scope| scope.type_def("Point"))
            .unwrap();
        assert_eq!(def.field_offset("y"), Some(4));
    }
}
