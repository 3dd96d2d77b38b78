//! Job functions and parameter descriptors
//!
//! A [`JobFunction`] pairs a handler with explicit parameter descriptors.
//! The descriptors drive argument binding (declared defaults) and the
//! metadata exporter, so no runtime signature inspection is needed.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, RuleError};
use crate::session::Session;
use crate::types::JobSpec;

/// Handler invoked for a job: session plus bound arguments
pub type JobHandler = dyn Fn(&mut Session, &Arguments) -> anyhow::Result<Value> + Send + Sync;

// ============================================================================
// Parameter Descriptors
// ============================================================================

/// Declared parameter type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Integer,
    Number,
    Boolean,
    String,
    Array,
    Object,
    Any,
    /// Caller-defined type reported by name only
    Named(String),
    /// Enumeration with ordered member names
    Enum { name: String, choices: Vec<String> },
}

impl ParamType {
    /// Enumeration type from a [`ParamEnum`] implementor
    pub fn of_enum<E: ParamEnum>() -> Self {
        ParamType::Enum {
            name: E::TYPE_NAME.to_string(),
            choices: E::variants().iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Type name as exported in metadata
    pub fn type_name(&self) -> &str {
        match self {
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::String => "string",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Any => "any",
            ParamType::Named(name) => name,
            ParamType::Enum { name, .. } => name,
        }
    }

    /// Ordered member names for enumerations
    pub fn choices(&self) -> Option<&[String]> {
        match self {
            ParamType::Enum { choices, .. } => Some(choices),
            _ => None,
        }
    }
}

/// Enumeration usable as a job parameter type
///
/// ```
/// use voltage_jobs::ParamEnum;
///
/// enum Color { Red, Green, Blue }
///
/// impl ParamEnum for Color {
///     const TYPE_NAME: &'static str = "Color";
///     fn variants() -> &'static [&'static str] {
///         &["red", "green", "blue"]
///     }
/// }
/// ```
pub trait ParamEnum {
    const TYPE_NAME: &'static str;

    fn variants() -> &'static [&'static str];
}

/// Parameter descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    /// `None` marks a required parameter
    pub default: Option<Value>,
}

impl ParamSpec {
    /// Required parameter
    pub fn required(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            default: None,
        }
    }

    /// Optional parameter with a default value
    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        default: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            default: Some(default.into()),
        }
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

// ============================================================================
// Job Function
// ============================================================================

/// Callable bound to its declared name, parameters and documentation
#[derive(Clone)]
pub struct JobFunction {
    name: String,
    params: Vec<ParamSpec>,
    doc: Option<String>,
    handler: Arc<JobHandler>,
}

impl JobFunction {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Session, &Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            doc: None,
            handler: Arc::new(handler),
        }
    }

    /// Declare a parameter (builder style)
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Attach documentation (builder style)
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn docstring(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// Bind a job's arguments against the declared parameters
    ///
    /// Declared defaults fill omitted parameters; an omitted required
    /// parameter is an error and the handler is never called. Arguments the
    /// function does not declare are rejected, unless it declares no
    /// parameters at all.
    pub fn bind(&self, job: &JobSpec) -> Result<Arguments> {
        if !self.params.is_empty() {
            if let Some(unknown) = job
                .args
                .keys()
                .find(|arg| !self.params.iter().any(|p| &p.name == *arg))
            {
                return Err(RuleError::InvalidArgument {
                    job: job.name.clone(),
                    arg: unknown.clone(),
                    reason: "unexpected argument".to_string(),
                });
            }
        }

        let mut values = job.args.clone();
        for param in &self.params {
            if values.contains_key(&param.name) {
                continue;
            }
            match &param.default {
                Some(default) => {
                    values.insert(param.name.clone(), default.clone());
                },
                None => {
                    return Err(RuleError::MissingArgument {
                        job: job.name.clone(),
                        arg: param.name.clone(),
                    })
                },
            }
        }

        Ok(Arguments {
            job: job.name.clone(),
            values,
        })
    }

    /// Invoke the handler
    pub fn call(&self, session: &mut Session, arguments: &Arguments) -> anyhow::Result<Value> {
        (self.handler)(session, arguments)
    }
}

impl fmt::Debug for JobFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("doc", &self.doc)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Bound Arguments
// ============================================================================

/// Arguments handed to a job handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    job: String,
    values: Map<String, Value>,
}

impl Arguments {
    pub fn new(job: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            job: job.into(),
            values,
        }
    }

    /// Typed required argument
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        match self.values.get(name) {
            Some(value) => self.decode(name, value),
            None => Err(RuleError::MissingArgument {
                job: self.job.clone(),
                arg: name.to_string(),
            }),
        }
    }

    /// Typed optional argument (`null` counts as absent)
    pub fn opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.decode(name, value).map(Some),
        }
    }

    /// Typed argument with a fallback
    pub fn get_or<T: DeserializeOwned>(&self, name: &str, fallback: T) -> Result<T> {
        Ok(self.opt(name)?.unwrap_or(fallback))
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    fn decode<T: DeserializeOwned>(&self, name: &str, value: &Value) -> Result<T> {
        T::deserialize(value).map_err(|e| RuleError::InvalidArgument {
            job: self.job.clone(),
            arg: name.to_string(),
            reason: e.to_string(),
        })
    }
}
