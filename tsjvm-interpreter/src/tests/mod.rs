//! Runtime tests: compile units, execute them, check what they compute

mod test_runtime_records;
mod test_runtime_updates;

use crate::error::RuntimeError;
use crate::machine::Execution;
use crate::test_harness::{HarnessError, Session};
use crate::value::{Key, Value};
use std::sync::Once;
use tsjvm_ast::CompilationUnit;

static LOGGER: Once = Once::new();

/// Route `log` output to stderr; `TSJVM_LOG=trace` shows every instruction
pub fn init_logging() {
    LOGGER.call_once(|| {
        let level = std::env::var("TSJVM_LOG")
            .ok()
            .and_then(|level| level.parse().ok())
            .unwrap_or(log::LevelFilter::Warn);
        let _ = fern::Dispatch::new()
            .level(level)
            .chain(std::io::stderr())
            .apply();
    });
}

pub fn run(unit: &CompilationUnit) -> Execution {
    init_logging();
    match Session::new().run(unit) {
        Ok(execution) => execution,
        Err(error) => panic!("expected {} to run, got {}", unit.body, error),
    }
}

pub fn result(unit: &CompilationUnit) -> Value {
    run(unit).result
}

pub fn run_err(unit: &CompilationUnit) -> RuntimeError {
    init_logging();
    match Session::new().run(unit) {
        Ok(execution) => panic!("expected {} to fail, got {}", unit.body, execution.result),
        Err(HarnessError::Runtime(error)) => error,
        Err(HarnessError::Compile(error)) => panic!("expected a runtime failure, got {}", error),
    }
}

/// Entries of a map result, in iteration order
pub fn entries(value: &Value) -> Vec<(Key, Value)> {
    match value.map_entries() {
        Some(entries) => entries,
        None => panic!("expected a map, got {}", value),
    }
}

pub fn str_key(name: &str) -> Key {
    Key::Str(name.to_string())
}
