//! Voltage Jobs - Condition/Action Rule Engine
//!
//! A lightweight rule engine for VoltageEMS providing:
//! - Registration of named conditions, actions and generic jobs
//! - Rule parsing from JSON/YAML text or structured values
//! - Sequential execution with short-circuit on falsy conditions
//! - Lifecycle hooks, per-job timing and metadata export for UIs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │   Parser    │────▶│    Engine    │────▶│   Session   │
//! │ (JSON/YAML) │     │  (execute)   │     │ (results[]) │
//! └─────────────┘     └──────────────┘     └─────────────┘
//!                        │        │
//!                        ▼        ▼
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  Exporter   │◀────│   Registry   │     │   Signals   │
//! │ (metadata)  │     │ (callables)  │     │   (hooks)   │
//! └─────────────┘     └──────────────┘     └─────────────┘
//! ```

mod config;
mod error;
mod executor;
mod exporter;
mod function;
pub mod logger;
mod parser;
mod registry;
mod session;
pub mod signals;
pub mod types;

// Re-export public API
pub use config::{EngineConfig, ENV_PREFIX};
pub use error::{Result, RuleError};
pub use executor::{Engine, RuntimeMetrics};
pub use exporter::{job_metadata, ExportFormat, ExportOutput, MetadataExporter};
pub use function::{Arguments, JobFunction, JobHandler, ParamEnum, ParamSpec, ParamType};
pub use logger::RunLogger;
pub use parser::{parse, DefaultParser, RuleParser};
pub use registry::{JobDescriptor, JobSource, RegisteredCallable, Registry};
pub use session::{Session, RESULTS_KEY};
pub use signals::{HookEvent, HookPoint, ReceiverId, Signal, Signals};

// Re-export rule types for convenience
pub use types::{is_truthy, JobKind, JobSpec, ParsedRule, RuleInput, RuleShape, RuleSpec};
