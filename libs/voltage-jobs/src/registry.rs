//! Callable Registry
//!
//! Maps job names to their functions, display labels and kinds. Owned by
//! the engine; entries are registered at startup and never removed.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, RuleError};
use crate::function::JobFunction;
use crate::types::JobKind;

/// A function registered under a job name
#[derive(Debug, Clone)]
pub struct RegisteredCallable {
    /// Registration key
    pub name: String,
    /// Human-readable label (defaults to the name)
    pub label: String,
    pub kind: JobKind,
    pub function: JobFunction,
}

/// Registration descriptor used by bulk imports
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    pub label: Option<String>,
    pub kind: JobKind,
    pub callable: JobFunction,
}

impl JobDescriptor {
    pub fn new(callable: JobFunction, kind: JobKind) -> Self {
        Self {
            label: None,
            kind,
            callable,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// External source of job functions (application module)
pub trait JobSource {
    /// Every top-level function the source exposes
    fn functions(&self) -> Vec<JobFunction>;

    /// Explicit registration list, preferred over scanning when present
    fn jobs_list(&self) -> Option<Vec<(String, JobDescriptor)>> {
        None
    }
}

/// Registry of job callables in registration order
#[derive(Debug, Clone, Default)]
pub struct Registry {
    callables: IndexMap<String, RegisteredCallable>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under its declared name
    ///
    /// Re-registering a name replaces the previous entry in place.
    pub fn register(&mut self, function: JobFunction, label: Option<&str>, kind: JobKind) {
        let name = function.name().to_string();
        self.insert(name, label.map(str::to_string), kind, function);
    }

    pub fn condition(&mut self, function: JobFunction, label: Option<&str>) {
        self.register(function, label, JobKind::Condition);
    }

    pub fn action(&mut self, function: JobFunction, label: Option<&str>) {
        self.register(function, label, JobKind::Action);
    }

    pub fn job(&mut self, function: JobFunction, label: Option<&str>) {
        self.register(function, label, JobKind::Job);
    }

    /// Import every job from an external source
    ///
    /// Priority: `overrides` > the source's own `jobs_list` > scanning its
    /// functions (registered as generic jobs labelled by name).
    pub fn bulk_import(
        &mut self,
        source: &dyn JobSource,
        overrides: Option<Vec<(String, JobDescriptor)>>,
    ) {
        match overrides.or_else(|| source.jobs_list()) {
            Some(list) => {
                debug!("Importing {} listed jobs", list.len());
                for (name, descriptor) in list {
                    self.insert(
                        name,
                        descriptor.label,
                        descriptor.kind,
                        descriptor.callable,
                    );
                }
            },
            None => {
                let functions = source.functions();
                debug!("Importing {} scanned jobs", functions.len());
                for function in functions {
                    self.job(function, None);
                }
            },
        }
    }

    /// Look up a job by name
    pub fn resolve(&self, name: &str) -> Result<&RegisteredCallable> {
        self.callables
            .get(name)
            .ok_or_else(|| RuleError::job_not_found(name))
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredCallable> {
        self.callables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.callables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.callables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }

    /// Registered callables in registration order
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredCallable> {
        self.callables.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.callables.keys().map(String::as_str)
    }

    fn insert(
        &mut self,
        name: String,
        label: Option<String>,
        kind: JobKind,
        function: JobFunction,
    ) {
        let label = label.unwrap_or_else(|| name.clone());
        if self.callables.contains_key(&name) {
            debug!("Job {} re-registered as {}", name, kind);
        }
        self.callables.insert(
            name.clone(),
            RegisteredCallable {
                name,
                label,
                kind,
                function,
            },
        );
    }
}
