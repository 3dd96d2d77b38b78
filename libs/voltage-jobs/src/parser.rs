//! Rule Parser
//!
//! Turns rule documents (JSON/YAML text, decoded values or native structs)
//! into the ordered job sequence executed by the engine.
//!
//! Two document shapes are accepted:
//!
//! ```text
//! flat:    [{"name": "is_positive", "kind": "condition", "args": {...}}, ...]
//! grouped: {"conditions": [{"name": ...}], "actions": [{"name": ...}]}
//! ```
//!
//! Grouped documents are normalized to all conditions followed by all
//! actions, each tagged with the kind implied by its list.

use serde_json::{Map, Value};

use crate::error::{Result, RuleError};
use crate::types::{JobKind, JobSpec, ParsedRule, RuleInput, RuleShape, RuleSpec};

/// Parser seam used by the engine
///
/// Implementations must be pure: parsing never touches the registry.
pub trait RuleParser: Send + Sync {
    fn parse(&self, input: RuleInput) -> Result<ParsedRule>;
}

/// Default parser for flat and grouped rule documents
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

impl DefaultParser {
    pub fn new() -> Self {
        Self
    }
}

impl RuleParser for DefaultParser {
    fn parse(&self, input: RuleInput) -> Result<ParsedRule> {
        match input {
            RuleInput::Text(text) => parse_value(decode_document(&text)?),
            RuleInput::Value(value) => parse_value(value),
            RuleInput::Jobs(jobs) => Ok(ParsedRule {
                jobs,
                shape: RuleShape::Flat,
            }),
            RuleInput::Rule(rule) => Ok(normalize_rule(rule)),
        }
    }
}

/// Parse any rule input with the default parser
pub fn parse(input: impl Into<RuleInput>) -> Result<Vec<JobSpec>> {
    DefaultParser.parse(input.into()).map(ParsedRule::into_jobs)
}

/// Decode a JSON or YAML document
///
/// JSON is tried first; YAML 1.2 is a superset, so anything JSON rejects
/// gets a second chance as YAML.
fn decode_document(text: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str::<Value>(text).map_err(|yaml_err| {
            tracing::debug!("Rule text rejected: json={}, yaml={}", json_err, yaml_err);
            RuleError::parse(yaml_err.to_string())
        }),
    }
}

/// Dispatch a decoded document by shape
fn parse_value(value: Value) -> Result<ParsedRule> {
    match value {
        Value::Array(items) => Ok(ParsedRule {
            jobs: parse_job_list(items, None)?,
            shape: RuleShape::Flat,
        }),
        Value::Object(map) => parse_grouped(map),
        other => Err(RuleError::invalid_input(format!(
            "expected a job list or a conditions/actions mapping, got {}",
            value_type_name(&other)
        ))),
    }
}

/// Parse a `{conditions: [...], actions: [...]}` document
fn parse_grouped(mut map: Map<String, Value>) -> Result<ParsedRule> {
    if !map.contains_key("conditions") && !map.contains_key("actions") {
        return Err(RuleError::invalid_input(
            "mapping needs a 'conditions' or 'actions' key",
        ));
    }

    let conditions = take_list(&mut map, "conditions")?;
    let actions = take_list(&mut map, "actions")?;

    let mut jobs = parse_job_list(conditions, Some(JobKind::Condition))?;
    jobs.extend(parse_job_list(actions, Some(JobKind::Action))?);

    Ok(ParsedRule {
        jobs,
        shape: RuleShape::Grouped,
    })
}

/// Remove a list-valued key; absent or null counts as empty
fn take_list(map: &mut Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(RuleError::invalid_input(format!(
            "'{}' must be a list, got {}",
            key,
            value_type_name(&other)
        ))),
    }
}

/// Parse job objects in order, forcing `kind` when it is implied
fn parse_job_list(items: Vec<Value>, kind: Option<JobKind>) -> Result<Vec<JobSpec>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_job(item, kind, index))
        .collect()
}

/// Parse a single job object
fn parse_job(item: Value, implied_kind: Option<JobKind>, index: usize) -> Result<JobSpec> {
    let mut job = match item {
        Value::Object(job) => job,
        other => {
            return Err(RuleError::invalid_input(format!(
                "job #{} must be a mapping, got {}",
                index,
                value_type_name(&other)
            )))
        },
    };

    let name = match job.remove("name") {
        Some(Value::String(name)) => name,
        Some(other) => {
            return Err(RuleError::invalid_input(format!(
                "job #{} 'name' must be a string, got {}",
                index,
                value_type_name(&other)
            )))
        },
        None => {
            return Err(RuleError::invalid_input(format!(
                "job #{} missing 'name'",
                index
            )))
        },
    };

    let args = match take_first(&mut job, &["args", "arguments"]) {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(args)) => args,
        Some(other) => {
            return Err(RuleError::invalid_input(format!(
                "job '{}' args must be a mapping, got {}",
                name,
                value_type_name(&other)
            )))
        },
    };

    let declared_kind = match take_first(&mut job, &["kind", "job_type"]) {
        None | Some(Value::Null) => JobKind::default(),
        Some(Value::String(kind)) => kind.parse()?,
        Some(other) => {
            return Err(RuleError::invalid_input(format!(
                "job '{}' kind must be a string, got {}",
                name,
                value_type_name(&other)
            )))
        },
    };

    Ok(JobSpec {
        name,
        kind: implied_kind.unwrap_or(declared_kind),
        args,
    })
}

/// Remove the first present key among aliases
fn take_first(map: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter().find_map(|key| map.remove(*key))
}

/// Normalize a native grouped rule
fn normalize_rule(rule: RuleSpec) -> ParsedRule {
    let conditions = rule.conditions.into_iter().map(|mut job| {
        job.kind = JobKind::Condition;
        job
    });
    let actions = rule.actions.into_iter().map(|mut job| {
        job.kind = JobKind::Action;
        job
    });

    ParsedRule {
        jobs: conditions.chain(actions).collect(),
        shape: RuleShape::Grouped,
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use serde_json::json;

    const FLAT_RULE: &str = r#"
    [
        {
            "name": "first_condition",
            "args": {"lower_number": 3, "greater_number": 10},
            "job_type": "condition"
        },
        {
            "name": "print_the_equation",
            "args": {"lower_number": 3, "greater_number": 10},
            "job_type": "action"
        }
    ]
    "#;

    #[test]
    fn test_parse_flat_json_string() {
        let parsed = DefaultParser.parse(FLAT_RULE.into()).unwrap();

        assert_eq!(parsed.shape, RuleShape::Flat);
        assert_eq!(parsed.jobs.len(), 2);
        assert_eq!(parsed.jobs[0].name, "first_condition");
        assert_eq!(parsed.jobs[0].kind, JobKind::Condition);
        assert_eq!(parsed.jobs[1].name, "print_the_equation");
        assert_eq!(
            Value::Object(parsed.jobs[1].args.clone()),
            json!({"lower_number": 3, "greater_number": 10})
        );
        assert_eq!(parsed.jobs[1].kind, JobKind::Action);
    }

    #[test]
    fn test_parse_grouped_orders_conditions_first() {
        // Actions listed before conditions in the document
        let jobs = parse(json!({
            "actions": [{"name": "a1"}, {"name": "a2"}],
            "conditions": [{"name": "c1"}, {"name": "c2", "kind": "action"}]
        }))
        .unwrap();

        let names: Vec<_> = jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, ["c1", "c2", "a1", "a2"]);

        // Implied kind wins over the declared one
        assert_eq!(jobs[1].kind, JobKind::Condition);
        assert_eq!(jobs[2].kind, JobKind::Action);
    }

    #[test]
    fn test_parse_yaml_document() {
        let yaml = r#"
conditions:
  - name: is_positive
    args:
      x: 3
actions:
  - name: record_result
    args:
      x: 3
"#;
        let parsed = DefaultParser.parse(yaml.into()).unwrap();

        assert_eq!(parsed.shape, RuleShape::Grouped);
        assert_eq!(parsed.jobs[0], JobSpec::condition("is_positive").with_arg("x", 3));
        assert_eq!(parsed.jobs[1], JobSpec::action("record_result").with_arg("x", 3));
    }

    #[test]
    fn test_parse_untagged_job_defaults_to_job() {
        let jobs = parse(json!([{"name": "always_true"}])).unwrap();
        assert_eq!(jobs[0].kind, JobKind::Job);
        assert!(jobs[0].args.is_empty());
    }

    #[test]
    fn test_parse_missing_lists_are_empty() {
        let jobs = parse(json!({"conditions": [], "actions": null})).unwrap();
        assert!(jobs.is_empty());

        let jobs = parse(r#"{"actions": [{"name": "notify"}]}"#).unwrap();
        assert_eq!(jobs, vec![JobSpec::action("notify")]);
    }

    #[test]
    fn test_parse_native_rule_spec() {
        let rule = RuleSpec::new()
            .action(JobSpec::job("send").with_arg("to", "ops"))
            .condition(JobSpec::job("check"));

        let parsed = DefaultParser.parse(rule.into()).unwrap();
        assert_eq!(parsed.shape, RuleShape::Grouped);
        assert_eq!(parsed.jobs[0], JobSpec::condition("check"));
        assert_eq!(parsed.jobs[1], JobSpec::action("send").with_arg("to", "ops"));
    }

    #[test]
    fn test_parse_native_job_list_keeps_order() {
        let jobs = vec![JobSpec::action("b"), JobSpec::condition("a")];
        let parsed = DefaultParser.parse(jobs.clone().into()).unwrap();
        assert_eq!(parsed.shape, RuleShape::Flat);
        assert_eq!(parsed.jobs, jobs);
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(parse(FLAT_RULE).unwrap(), parse(FLAT_RULE).unwrap());
    }

    #[test]
    fn test_parse_invalid_text() {
        let err = parse("{\"conditions\": [").unwrap_err();
        assert!(matches!(err, RuleError::Parse(_)), "got {:?}", err);
        assert!(err.to_string().contains("not valid JSON/YAML"));
    }

    #[test]
    fn test_parse_invalid_shapes() {
        for input in [
            json!(42),
            json!("just a string"),
            json!({"rules": []}),
            json!([1, 2]),
            json!([{"args": {}}]),
            json!([{"name": "x", "args": [1]}]),
            json!([{"name": "x", "kind": "trigger"}]),
            json!({"conditions": "c1"}),
        ] {
            let err = parse(input.clone()).unwrap_err();
            assert!(
                matches!(err, RuleError::InvalidInput(_)),
                "{} should be invalid input, got {:?}",
                input,
                err
            );
        }
    }

    #[test]
    fn test_parse_scalar_yaml_is_invalid_input() {
        let err = parse("hello").unwrap_err();
        assert!(matches!(err, RuleError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_empty_document_is_invalid_input() {
        // Empty and bare-marker documents decode as YAML null
        for text in ["", "---", "---\n"] {
            let err = parse(text).unwrap_err();
            assert!(
                matches!(err, RuleError::InvalidInput(_)),
                "{:?} should be invalid input, got {:?}",
                text,
                err
            );
        }
    }
}
