//! Metadata Exporter
//!
//! Describes the registered callables for external consumers (UI forms,
//! docs endpoints). Pure reflection over parameter descriptors: no job is
//! ever invoked.
//!
//! Shape of one entry:
//!
//! ```text
//! "is_red": {
//!     "args": {"color": {"default": null, "type": "Color", "choices": ["red", "green", "blue"]}},
//!     "doc": "Checks if the color is red",
//!     "name": "is it red?"
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::function::ParamSpec;
use crate::registry::{RegisteredCallable, Registry};
use crate::types::JobKind;

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExportFormat {
    /// Structured value
    #[default]
    Dict,
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Dict => "dict",
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
        }
    }

    /// Lenient lookup: unrecognized names fall back to `dict`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "json" => ExportFormat::Json,
            "yaml" | "yml" => ExportFormat::Yaml,
            "dict" => ExportFormat::Dict,
            other => {
                tracing::debug!("Unknown export format '{}', using dict", other);
                ExportFormat::Dict
            },
        }
    }
}

impl FromStr for ExportFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl From<String> for ExportFormat {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<ExportFormat> for String {
    fn from(format: ExportFormat) -> Self {
        format.as_str().to_string()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Export result: structured value or encoded text
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutput {
    Structured(Value),
    Text(String),
}

impl ExportOutput {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ExportOutput::Structured(value) => Some(value),
            ExportOutput::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExportOutput::Structured(_) => None,
            ExportOutput::Text(text) => Some(text),
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            ExportOutput::Structured(value) => Some(value),
            ExportOutput::Text(_) => None,
        }
    }
}

/// Exporter over a registry
#[derive(Debug, Clone, Copy)]
pub struct MetadataExporter {
    group_by_kind: bool,
}

impl Default for MetadataExporter {
    fn default() -> Self {
        Self {
            group_by_kind: true,
        }
    }
}

impl MetadataExporter {
    /// Exporter grouping entries by kind
    pub fn grouped() -> Self {
        Self {
            group_by_kind: true,
        }
    }

    /// Exporter emitting a single `{name: metadata}` mapping
    pub fn flat() -> Self {
        Self {
            group_by_kind: false,
        }
    }

    pub fn export(&self, registry: &Registry, format: ExportFormat) -> Result<ExportOutput> {
        let value = self.export_value(registry);
        Ok(match format {
            ExportFormat::Dict => ExportOutput::Structured(value),
            ExportFormat::Json => ExportOutput::Text(serde_json::to_string(&value)?),
            ExportFormat::Yaml => ExportOutput::Text(serde_yaml::to_string(&value)?),
        })
    }

    /// Structured metadata for the whole registry
    ///
    /// Grouped output always carries `condition` and `action`; `job` only
    /// appears when generic jobs are registered.
    pub fn export_value(&self, registry: &Registry) -> Value {
        if !self.group_by_kind {
            let flat: Map<String, Value> = registry
                .iter()
                .map(|c| (c.name.clone(), job_metadata(c)))
                .collect();
            return Value::Object(flat);
        }

        let mut groups = Map::new();
        for kind in [JobKind::Condition, JobKind::Action, JobKind::Job] {
            let entries: Map<String, Value> = registry
                .iter()
                .filter(|c| c.kind == kind)
                .map(|c| (c.name.clone(), job_metadata(c)))
                .collect();
            if kind == JobKind::Job && entries.is_empty() {
                continue;
            }
            groups.insert(kind.as_str().to_string(), Value::Object(entries));
        }
        Value::Object(groups)
    }
}

/// Metadata for a single callable
pub fn job_metadata(callable: &RegisteredCallable) -> Value {
    let args: Map<String, Value> = callable
        .function
        .params()
        .iter()
        .map(|p| (p.name.clone(), param_metadata(p)))
        .collect();

    json!({
        "args": args,
        "doc": callable.function.docstring(),
        "name": callable.label,
    })
}

fn param_metadata(param: &ParamSpec) -> Value {
    json!({
        "default": param.default,
        "type": param.param_type.type_name(),
        "choices": param.param_type.choices(),
    })
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::function::{JobFunction, ParamEnum, ParamType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Color {}

    impl ParamEnum for Color {
        const TYPE_NAME: &'static str = "Color";
        fn variants() -> &'static [&'static str] {
            &["red", "green", "blue"]
        }
    }

    fn sample_registry(calls: Arc<AtomicUsize>) -> Registry {
        let mut registry = Registry::new();
        registry.condition(
            JobFunction::new("first_condition", move |_s, args| {
                calls.fetch_add(1, Ordering::SeqCst);
                let lower: i64 = args.get("lower_number")?;
                let greater: i64 = args.get("greater_number")?;
                Ok(json!(lower < greater))
            })
            .param(ParamSpec::optional("lower_number", ParamType::Integer, 10))
            .param(ParamSpec::optional("greater_number", ParamType::Integer, 20))
            .doc("Checks if first number is lower than the second"),
            Some("First Condition"),
        );
        registry.condition(
            JobFunction::new("is_red", |_s, args| {
                Ok(json!(args.get::<String>("color")? == "red"))
            })
            .param(ParamSpec::required("color", ParamType::of_enum::<Color>()))
            .doc("Checks if the color is red"),
            Some("is it red?"),
        );
        registry.action(
            JobFunction::new("print_the_equation", |_s, _a| Ok(Value::Null)),
            Some("The Action"),
        );
        registry
    }

    #[test]
    fn test_export_grouped_dict() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = sample_registry(Arc::clone(&calls));

        let output = MetadataExporter::grouped()
            .export(&registry, ExportFormat::Dict)
            .unwrap();
        let value = output.as_value().unwrap();

        assert_eq!(
            value["condition"]["first_condition"],
            json!({
                "args": {
                    "lower_number": {"default": 10, "type": "integer", "choices": null},
                    "greater_number": {"default": 20, "type": "integer", "choices": null}
                },
                "doc": "Checks if first number is lower than the second",
                "name": "First Condition"
            })
        );
        assert_eq!(
            value["condition"]["is_red"]["args"]["color"]["choices"],
            json!(["red", "green", "blue"])
        );
        assert_eq!(value["condition"]["is_red"]["args"]["color"]["default"], Value::Null);
        assert_eq!(value["action"]["print_the_equation"]["doc"], Value::Null);
        assert!(value.get("job").is_none());

        // Exporting never calls the job
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_export_flat_keeps_registration_order() {
        let registry = sample_registry(Arc::new(AtomicUsize::new(0)));
        let value = MetadataExporter::flat().export_value(&registry);

        let names: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(names, ["first_condition", "is_red", "print_the_equation"]);

        let labels: Vec<_> = value
            .as_object()
            .unwrap()
            .values()
            .map(|m| m["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(labels, ["First Condition", "is it red?", "The Action"]);
    }

    #[test]
    fn test_export_json_round_trip() {
        let registry = sample_registry(Arc::new(AtomicUsize::new(0)));
        let exporter = MetadataExporter::grouped();

        let dict = exporter.export(&registry, ExportFormat::Dict).unwrap();
        let text = exporter.export(&registry, ExportFormat::Json).unwrap();
        let decoded: Value = serde_json::from_str(text.as_text().unwrap()).unwrap();

        assert_eq!(Some(&decoded), dict.as_value());
    }

    #[test]
    fn test_export_yaml() {
        let registry = sample_registry(Arc::new(AtomicUsize::new(0)));
        let output = MetadataExporter::grouped()
            .export(&registry, ExportFormat::Yaml)
            .unwrap();
        let text = output.as_text().unwrap();

        assert!(text.contains("is it red?"));
        let decoded: Value = serde_yaml::from_str(text).unwrap();
        assert_eq!(
            decoded["condition"]["is_red"]["args"]["color"]["choices"],
            json!(["red", "green", "blue"])
        );
    }

    #[test]
    fn test_generic_jobs_get_their_own_group() {
        let mut registry = Registry::new();
        registry.job(JobFunction::new("always_true", |_s, _a| Ok(json!(true))), None);

        let value = MetadataExporter::grouped().export_value(&registry);
        assert_eq!(value["condition"], json!({}));
        assert_eq!(value["action"], json!({}));
        assert_eq!(value["job"]["always_true"]["name"], json!("always_true"));
    }

    #[test]
    fn test_export_format_fallback() {
        assert_eq!(ExportFormat::from_name("JSON"), ExportFormat::Json);
        assert_eq!(ExportFormat::from_name("yml"), ExportFormat::Yaml);
        assert_eq!(ExportFormat::from_name("xml"), ExportFormat::Dict);
        assert_eq!("".parse::<ExportFormat>().unwrap(), ExportFormat::Dict);
    }
}
