//! Compile-and-run sessions
//!
//! A session compiles units with fixed options and executes the resulting
//! sequences against one library instance. Compile failures and runtime
//! failures come back as distinct variants so tests can tell them apart.

use crate::error::RuntimeError;
use crate::library::Library;
use crate::machine::{Execution, Machine};
use crate::value::Value;
use miette::Diagnostic;
use thiserror::Error;
use tsjvm_ast::CompilationUnit;
use tsjvm_compiler::{compile_unit, compile_units, CompileError, CompiledUnit, CompilerOptions};

#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum HarnessError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Runtime(#[from] RuntimeError),
}

pub struct Session {
    options: CompilerOptions,
    library: Library,
}

impl Session {
    pub fn new() -> Self {
        Self::with_options(CompilerOptions::default())
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self {
            options,
            library: Library::new(),
        }
    }

    pub fn compile(&self, unit: &CompilationUnit) -> Result<CompiledUnit, HarnessError> {
        Ok(compile_unit(unit, &self.options)?)
    }

    pub fn execute(&self, compiled: &CompiledUnit) -> Result<Execution, HarnessError> {
        log::debug!("running unit {}", compiled.name);
        Ok(Machine::new(&compiled.code, &self.library)?.run()?)
    }

    pub fn run(&self, unit: &CompilationUnit) -> Result<Execution, HarnessError> {
        let compiled = self.compile(unit)?;
        self.execute(&compiled)
    }

    /// Compile every unit in parallel, then run the ones that compiled.
    /// Results stay in input order.
    pub fn run_all(&self, units: &[CompilationUnit]) -> Vec<Result<Execution, HarnessError>> {
        compile_units(units, &self.options)
            .into_iter()
            .map(|compiled| self.execute(&compiled?))
            .collect()
    }

    /// Run a unit and return only its value
    pub fn evaluate(&self, unit: &CompilationUnit) -> Result<Value, HarnessError> {
        self.run(unit).map(|execution| execution.result)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile and run one unit with default options
pub fn run_unit(unit: &CompilationUnit) -> Result<Execution, HarnessError> {
    Session::new().run(unit)
}
