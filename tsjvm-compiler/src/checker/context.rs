//! Compilation context and local-variable scope
//!
//! One context exists per compiled unit. It owns the single method scope:
//! locals are declared in order and receive target slots, with `long`
//! and `double` locals taking two.

use crate::error::{CompileError, CompileResult};
use crate::options::CompilerOptions;
use crate::typed_ast::LocalRef;
use crate::types::TypeKind;
use indexmap::IndexMap;
use tsjvm_ast::Span;

/// Variable information in the method scope
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariable {
    pub name: String,
    pub slot: u16,
    pub declared_type: TypeKind,
    pub span: Span,
}

impl LocalVariable {
    pub fn to_ref(&self) -> LocalRef {
        LocalRef {
            name: self.name.clone(),
            slot: self.slot,
            declared_type: self.declared_type.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilationContext<'a> {
    pub options: &'a CompilerOptions,
    locals: IndexMap<String, LocalVariable>,
    next_slot: u16,
}

impl<'a> CompilationContext<'a> {
    pub fn new(options: &'a CompilerOptions) -> Self {
        Self {
            options,
            locals: IndexMap::new(),
            next_slot: 0,
        }
    }

    /// Declare a local, assigning the next free slot
    pub fn declare(&mut self, name: &str, declared_type: TypeKind, span: Span) -> CompileResult<LocalRef> {
        if self.locals.contains_key(name) {
            return Err(CompileError::DuplicateDeclaration {
                name: name.to_string(),
                span: span.into(),
            });
        }
        let slot = self.next_slot;
        self.next_slot += declared_type.stack_kind().size();
        let variable = LocalVariable {
            name: name.to_string(),
            slot,
            declared_type,
            span,
        };
        log::trace!("declared {} : {} in slot {}", name, variable.declared_type, slot);
        let local = variable.to_ref();
        self.locals.insert(name.to_string(), variable);
        Ok(local)
    }

    pub fn lookup(&self, name: &str, span: Span) -> CompileResult<&LocalVariable> {
        self.locals
            .get(name)
            .ok_or_else(|| CompileError::undefined_variable(name, span))
    }

    /// First slot not used by a declared local
    pub fn next_free_slot(&self) -> u16 {
        self.next_slot
    }

    pub fn locals(&self) -> impl Iterator<Item = &LocalVariable> {
        self.locals.values()
    }
}
