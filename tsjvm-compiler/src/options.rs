//! Compiler configuration

/// Options shared read-only by every unit compiled with them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Internal name of the ordered map object literals construct
    pub container_class: String,
    /// Internal name of the list array literals construct
    pub list_class: String,
    /// Run the operand-stack verifier over every emitted sequence
    pub verify_stack: bool,
    /// Upper bound on worker threads used by `compile_units`
    pub worker_threads: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            container_class: "java/util/LinkedHashMap".to_string(),
            list_class: "java/util/ArrayList".to_string(),
            verify_stack: true,
            worker_threads: 4,
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container_class(mut self, class: impl Into<String>) -> Self {
        self.container_class = class.into();
        self
    }

    pub fn with_list_class(mut self, class: impl Into<String>) -> Self {
        self.list_class = class.into();
        self
    }

    pub fn with_verify_stack(mut self, verify: bool) -> Self {
        self.verify_stack = verify;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }
}
