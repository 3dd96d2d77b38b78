//! Job rule type definitions
//!
//! Core types for rule parsing and execution:
//! - JobKind: condition / action / generic job tag
//! - JobSpec: one rule step (name, kind, arguments)
//! - RuleSpec: grouped conditions + actions
//! - RuleInput: everything the parser accepts
//! - ParsedRule: normalized job sequence plus the shape it came from

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::RuleError;

// ============================================================================
// Job Model
// ============================================================================

/// Kind of a registered callable or rule step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Gates the actions that follow it
    Condition,
    /// Invoked for its side effect once all conditions pass
    Action,
    /// Untagged unit of work
    #[default]
    #[serde(alias = "generic")]
    Job,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Condition => "condition",
            JobKind::Action => "action",
            JobKind::Job => "job",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "condition" => Ok(JobKind::Condition),
            "action" => Ok(JobKind::Action),
            "job" | "generic" => Ok(JobKind::Job),
            other => Err(RuleError::invalid_input(format!(
                "unknown job kind '{}'. Expected condition, action or job",
                other
            ))),
        }
    }
}

/// JobSpec - a single rule step as produced by the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Registered callable name
    pub name: String,

    /// Step kind
    #[serde(default, alias = "job_type")]
    pub kind: JobKind,

    /// Declared call arguments
    #[serde(default, alias = "arguments", skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
}

impl JobSpec {
    pub fn new(name: impl Into<String>, kind: JobKind) -> Self {
        Self {
            name: name.into(),
            kind,
            args: Map::new(),
        }
    }

    pub fn condition(name: impl Into<String>) -> Self {
        Self::new(name, JobKind::Condition)
    }

    pub fn action(name: impl Into<String>) -> Self {
        Self::new(name, JobKind::Action)
    }

    pub fn job(name: impl Into<String>) -> Self {
        Self::new(name, JobKind::Job)
    }

    /// Add a call argument (builder style)
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }
}

// ============================================================================
// Rule Structures
// ============================================================================

/// RuleSpec - conditions and actions held apart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(default)]
    pub conditions: Vec<JobSpec>,

    #[serde(default)]
    pub actions: Vec<JobSpec>,
}

impl RuleSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, job: JobSpec) -> Self {
        self.conditions.push(job);
        self
    }

    pub fn action(mut self, job: JobSpec) -> Self {
        self.actions.push(job);
        self
    }
}

/// Shape of the rule document a job sequence was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleShape {
    /// A single list of jobs tagged by kind
    Flat,
    /// An object with `conditions` and `actions` lists
    Grouped,
}

/// Normalized rule: ordered jobs plus the input shape
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRule {
    pub jobs: Vec<JobSpec>,
    pub shape: RuleShape,
}

impl ParsedRule {
    pub fn into_jobs(self) -> Vec<JobSpec> {
        self.jobs
    }
}

/// Raw rule input accepted by the parser
#[derive(Debug, Clone)]
pub enum RuleInput {
    /// JSON or YAML document
    Text(String),
    /// Already-decoded list or mapping
    Value(Value),
    /// Native flat job list
    Jobs(Vec<JobSpec>),
    /// Native grouped rule
    Rule(RuleSpec),
}

impl From<&str> for RuleInput {
    fn from(text: &str) -> Self {
        RuleInput::Text(text.to_string())
    }
}

impl From<String> for RuleInput {
    fn from(text: String) -> Self {
        RuleInput::Text(text)
    }
}

impl From<&String> for RuleInput {
    fn from(text: &String) -> Self {
        RuleInput::Text(text.clone())
    }
}

impl From<Value> for RuleInput {
    fn from(value: Value) -> Self {
        RuleInput::Value(value)
    }
}

impl From<Vec<JobSpec>> for RuleInput {
    fn from(jobs: Vec<JobSpec>) -> Self {
        RuleInput::Jobs(jobs)
    }
}

impl From<RuleSpec> for RuleInput {
    fn from(rule: RuleSpec) -> Self {
        RuleInput::Rule(rule)
    }
}

/// Python-style truthiness of a job return value
///
/// `null`, `false`, zero, `""`, `[]` and `{}` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
