//! Scope management for one compilation unit.
//!
//! The [`ScopeManager`] is driven by the syntax-tree traversal: it opens and
//! closes scopes, hands out storage offsets as declarations stream in,
//! answers resolution queries across the active scopes, and keeps function
//! signatures around so call sites can be checked. Closed scopes stay in the
//! registry, so a function's return layout can still be read after its body
//! has been left.

use rustc_hash::FxHashMap;

use goscope_core::config::FrontendConfig;
use goscope_core::types::TypeId;

use crate::semantics::ids::ScopeId;
use crate::semantics::symbols::arena::{OffsetStack, ScopeArena, ScopeIdStack};
use crate::semantics::symbols::binding::{BindingAttr, Resolved};
use crate::semantics::symbols::error::{CallError, ScopeError};
use crate::semantics::symbols::scope::{ActivationRecord, ScopeKind, ScopeTable};

/// Which active scopes a resolution query inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// Every active scope, innermost first.
    #[default]
    Default,
    /// Only the innermost active scope.
    Current,
    /// Only the global scope.
    Global,
}

/// Outcome of declaring a value in the current scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationResult {
    /// Newly bound at `offset`.
    Ok { offset: usize },
    /// Already bound in this scope; the first declaration is kept.
    Duplicate { existing: TypeId, scope: ScopeId },
}

impl DeclarationResult {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DeclarationResult::Duplicate { .. })
    }
}

/// Symbol table and activation-record allocator for one compilation pass.
#[derive(Debug)]
pub struct ScopeManager {
    config: FrontendConfig,
    scopes: ScopeArena,
    scope_stack: ScopeIdStack,
    offsets: OffsetStack,
    functions: FxHashMap<String, ScopeId>,
    temp_count: usize,
    label_count: usize,
    last_closed: Option<ScopeId>,
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeManager {
    /// Create a manager with the global scope open.
    pub fn new() -> Self {
        Self::with_config(FrontendConfig::default())
    }

    pub fn with_config(config: FrontendConfig) -> Self {
        let mut scopes = ScopeArena::new();
        let global = scopes.alloc(None, ScopeKind::Global, 0);
        let mut scope_stack = ScopeIdStack::new();
        scope_stack.push(global);
        let mut offsets = OffsetStack::new();
        offsets.push_fresh();

        Self {
            config,
            scopes,
            scope_stack,
            offsets,
            functions: FxHashMap::default(),
            temp_count: 0,
            label_count: 0,
            last_closed: None,
        }
    }

    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    /// Enter a nested scope whose storage continues the enclosing frame.
    pub fn open_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let parent = self.current_scope();
        let start = self.offsets.current();
        let id = self.scopes.alloc(Some(parent), kind, start);
        self.scope_stack.push(id);
        self.offsets.push_nested();
        tracing::debug!(scope = %id, parent = %parent, kind = %self.scopes[id].kind(), start, "open scope");
        id
    }

    /// Enter a scope that starts a fresh activation record at offset zero.
    pub fn open_frame(&mut self, kind: ScopeKind) -> ScopeId {
        let parent = self.current_scope();
        let id = self.scopes.alloc(Some(parent), kind, 0);
        self.scopes[id].mark_activation_record();
        self.scope_stack.push(id);
        self.offsets.push_fresh();
        tracing::debug!(scope = %id, parent = %parent, kind = %self.scopes[id].kind(), "open frame");
        id
    }

    /// Leave the innermost scope. The global scope is never popped.
    ///
    /// The closed scope's end offset is the highest offset it or its nested
    /// blocks reached. A block that continued its parent's frame raises the
    /// parent's high-water mark but leaves its cursor where it was.
    pub fn close_scope(&mut self) -> Option<ScopeId> {
        if self.current_scope().is_global() {
            tracing::debug!("refusing to close the global scope");
            return None;
        }

        let id = self.scope_stack.pop()?;
        let end = self.offsets.pop().unwrap_or(0);
        self.scopes[id].seal(end);
        self.last_closed = Some(id);
        tracing::debug!(scope = %id, end, "close scope");
        Some(id)
    }

    /// Retrieve the active scope identifier.
    pub fn current_scope(&self) -> ScopeId {
        self.scope_stack.current().unwrap_or(ScopeId::GLOBAL)
    }

    /// Most recently closed scope, for reading back its final layout.
    pub fn last_closed(&self) -> Option<ScopeId> {
        self.last_closed
    }

    /// Number of active scopes, including the global scope.
    pub fn depth(&self) -> usize {
        self.scope_stack.len()
    }

    /// Active scopes, outermost first.
    pub fn active_scopes(&self) -> &[ScopeId] {
        self.scope_stack.as_slice()
    }

    /// Next free offset of each active scope, outermost first.
    pub fn offset_cursors(&self) -> Vec<usize> {
        self.offsets.offsets()
    }

    /// Retrieve a scope by identifier, open or closed.
    pub fn scope(&self, id: ScopeId) -> Option<&ScopeTable> {
        self.scopes.get(id)
    }

    pub fn scopes(&self) -> impl Iterator<Item = &ScopeTable> {
        self.scopes.iter()
    }

    /// Number of scopes ever opened, including the global scope.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn current_table(&self) -> &ScopeTable {
        &self.scopes[self.current_scope()]
    }

    pub fn current_table_mut(&mut self) -> &mut ScopeTable {
        let id = self.current_scope();
        &mut self.scopes[id]
    }

    /// Retag the innermost scope.
    pub fn set_scope_kind(&mut self, kind: ScopeKind) {
        self.current_table_mut().set_kind(kind);
    }

    pub fn current_offset(&self) -> usize {
        self.offsets.current()
    }

    /// Reserve `size` bytes in the current frame, returning their offset.
    pub fn advance_offset(&mut self, size: usize) -> usize {
        self.offsets.advance(size)
    }

    /// Bind `name` in the current scope without reserving storage.
    pub fn bind(&mut self, name: impl Into<String>, ty: TypeId) -> bool {
        self.current_table_mut().bind(name, ty)
    }

    /// Update an attribute of a binding in the current scope.
    pub fn set_attr(&mut self, name: &str, attr: BindingAttr) -> Result<(), ScopeError> {
        self.current_table_mut().set_attr(name, attr)
    }

    /// Declare a value in the current scope and reserve `size` bytes for it.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        ty: TypeId,
        size: usize,
    ) -> DeclarationResult {
        let name = name.into();
        let scope = self.current_scope();

        if let Some(existing) = self.scopes[scope].binding(&name) {
            tracing::trace!(%name, %scope, "duplicate declaration ignored");
            return DeclarationResult::Duplicate {
                existing: existing.ty.clone(),
                scope,
            };
        }

        let offset = self.offsets.current();
        self.scopes[scope].bind_with_layout(name.as_str(), ty, size, offset);
        self.offsets.advance(size);
        tracing::trace!(%name, %scope, offset, size, "declare");
        DeclarationResult::Ok { offset }
    }

    /// Define a type name in the current scope.
    pub fn declare_type(&mut self, name: impl Into<String>, ty: TypeId, size: usize) -> bool {
        self.current_table_mut().define_type(name, ty, size)
    }

    /// Define a type name in the global scope regardless of which scope is
    /// active.
    pub fn declare_global_type(
        &mut self,
        name: impl Into<String>,
        ty: TypeId,
        size: usize,
    ) -> bool {
        self.scopes[ScopeId::GLOBAL].define_type(name, ty, size)
    }

    /// Allocate a fresh temporary in the current scope and return its name.
    /// Names already visible from the current scope are skipped.
    pub fn declare_temporary(&mut self, ty: TypeId, size: usize) -> String {
        let name = loop {
            let candidate = format!("{}{}", self.config.temp_prefix, self.temp_count);
            self.temp_count += 1;
            if !self.resolve_identifier(&candidate, LookupMode::Default) {
                break candidate;
            }
            tracing::trace!(name = %candidate, "temporary name taken");
        };

        let scope = self.current_scope();
        let offset = self.offsets.current();
        self.scopes[scope].bind_with_layout(name.as_str(), ty, size, offset);
        self.offsets.advance(size);
        tracing::trace!(%name, %scope, offset, size, "temporary");
        name
    }

    /// Allocate the next label. The first label is the program start sentinel.
    pub fn new_label(&mut self) -> String {
        let label = if self.label_count == 0 {
            self.config.start_label.clone()
        } else {
            format!("{}{}", self.config.label_prefix, self.label_count)
        };
        self.label_count += 1;
        label
    }

    pub fn temp_count(&self) -> usize {
        self.temp_count
    }

    pub fn label_count(&self) -> usize {
        self.label_count
    }

    /// Whether `name` is visible as a value. Registered functions resolve in
    /// every mode.
    pub fn resolve_identifier(&self, name: &str, mode: LookupMode) -> bool {
        if self.functions.contains_key(name) {
            return true;
        }
        let found = self
            .scopes_for(mode)
            .any(|scope| self.scopes[scope].has_binding(name));
        tracing::trace!(name, ?mode, found, "resolve identifier");
        found
    }

    /// Whether `name` is visible as a type name.
    pub fn resolve_type(&self, name: &str, mode: LookupMode) -> bool {
        let found = self
            .scopes_for(mode)
            .any(|scope| self.scopes[scope].has_type(name));
        tracing::trace!(name, ?mode, found, "resolve type");
        found
    }

    /// Innermost value binding for `name`, falling back to the innermost type
    /// definition when no value is bound.
    pub fn find_binding(&self, name: &str) -> Option<Resolved<'_>> {
        self.scope_stack
            .innermost_first()
            .find_map(|scope| self.scopes[scope].binding(name).map(Resolved::Value))
            .or_else(|| {
                self.scope_stack
                    .innermost_first()
                    .find_map(|scope| self.scopes[scope].type_def(name).map(Resolved::Type))
            })
    }

    /// Active scope owning the innermost value binding for `name`.
    pub fn find_defining_scope(&self, name: &str) -> Option<ScopeId> {
        self.scope_stack
            .innermost_first()
            .find(|scope| self.scopes[*scope].has_binding(name))
    }

    /// Nearest active scope tagged with `kind`.
    pub fn nearest_scope_of_kind(&self, kind: &ScopeKind) -> Option<ScopeId> {
        self.scope_stack
            .innermost_first()
            .find(|scope| self.scopes[*scope].kind() == kind)
    }

    /// Record `name` as defined by the current scope. Returns the scope
    /// previously registered under the same name, if any.
    pub fn register_function(&mut self, name: impl Into<String>) -> Option<ScopeId> {
        let name = name.into();
        let scope = self.current_scope();
        tracing::debug!(%name, %scope, "register function");
        self.functions.insert(name, scope)
    }

    pub fn lookup_function(&self, name: &str) -> Option<ScopeId> {
        self.functions.get(name).copied()
    }

    /// Registered functions sorted by name.
    pub fn functions(&self) -> Vec<(&str, ScopeId)> {
        let mut entries: Vec<_> = self
            .functions
            .iter()
            .map(|(name, scope)| (name.as_str(), *scope))
            .collect();
        entries.sort_unstable();
        entries
    }

    /// Tag the current scope as a function frame.
    pub fn mark_activation_record(&mut self) {
        self.current_table_mut().mark_activation_record();
    }

    pub fn set_signature(&mut self, param_types: Vec<TypeId>) -> Result<(), ScopeError> {
        self.current_frame_mut()?.param_types = param_types;
        Ok(())
    }

    pub fn set_param_sizes(&mut self, sizes: Vec<usize>) -> Result<(), ScopeError> {
        self.current_frame_mut()?.param_sizes = sizes;
        Ok(())
    }

    pub fn set_return_type(&mut self, types: Vec<TypeId>) -> Result<(), ScopeError> {
        self.current_frame_mut()?.return_types = types;
        Ok(())
    }

    pub fn set_return_size(&mut self, sizes: Vec<usize>) -> Result<(), ScopeError> {
        self.current_frame_mut()?.return_sizes = sizes;
        Ok(())
    }

    pub fn set_return_slot(&mut self, place: impl Into<String>) -> Result<(), ScopeError> {
        self.current_frame_mut()?.return_slot = Some(place.into());
        Ok(())
    }

    /// Activation record of any scope, open or closed.
    pub fn frame(&self, scope: ScopeId) -> Result<&ActivationRecord, ScopeError> {
        self.scopes
            .get(scope)
            .ok_or(ScopeError::UnknownScope { scope })?
            .activation_record()
            .ok_or(ScopeError::NotActivationRecord { scope })
    }

    pub fn signature(&self, scope: ScopeId) -> Result<&[TypeId], ScopeError> {
        Ok(self.frame(scope)?.signature())
    }

    pub fn return_type(&self, scope: ScopeId) -> Result<&[TypeId], ScopeError> {
        Ok(&self.frame(scope)?.return_types)
    }

    pub fn return_size(&self, scope: ScopeId) -> Result<&[usize], ScopeError> {
        Ok(&self.frame(scope)?.return_sizes)
    }

    /// Check a call against the callee's registered signature, reporting the
    /// earliest problem found.
    pub fn check_call(&self, name: &str, arg_types: &[TypeId]) -> Result<(), CallError> {
        let scope = self
            .lookup_function(name)
            .ok_or_else(|| CallError::NotDeclared {
                name: name.to_string(),
            })?;

        let expected = self
            .scopes
            .get(scope)
            .and_then(ScopeTable::activation_record)
            .map(ActivationRecord::signature)
            .unwrap_or(&[]);

        if expected.len() != arg_types.len() {
            return Err(CallError::ArgumentCount {
                name: name.to_string(),
                expected: expected.len(),
                given: arg_types.len(),
            });
        }

        for (index, (want, got)) in expected.iter().zip(arg_types).enumerate() {
            if want != got {
                return Err(CallError::ArgumentType {
                    position: index + 1,
                    expected: want.clone(),
                    given: got.clone(),
                });
            }
        }

        Ok(())
    }

    fn current_frame_mut(&mut self) -> Result<&mut ActivationRecord, ScopeError> {
        let scope = self.current_scope();
        self.scopes[scope]
            .activation_record_mut()
            .ok_or(ScopeError::NotActivationRecord { scope })
    }

    fn scopes_for(&self, mode: LookupMode) -> Box<dyn Iterator<Item = ScopeId> + '_> {
        match mode {
            LookupMode::Default => Box::new(self.scope_stack.innermost_first()),
            LookupMode::Current => Box::new(std::iter::once(self.current_scope())),
            LookupMode::Global => Box::new(std::iter::once(ScopeId::GLOBAL)),
        }
    }
}
