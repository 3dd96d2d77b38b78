//! Rule Executor - run parsed job sequences against a session
//!
//! Executes a rule by:
//! 1. Normalizing the input through the parser
//! 2. Resolving each job in the registry and calling it with bound arguments
//! 3. Recording `{job, return}` entries and per-job timings
//! 4. Stopping at the first falsy condition (short-circuit AND)
//!
//! Errors raised by conditions and actions propagate unchanged; effects on
//! the session made before the failure are kept.

use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::exporter::{ExportFormat, ExportOutput, MetadataExporter};
use crate::function::JobFunction;
use crate::logger::RunLogger;
use crate::parser::{DefaultParser, RuleParser};
use crate::registry::{JobDescriptor, JobSource, Registry};
use crate::session::Session;
use crate::signals::{HookEvent, HookPoint, ReceiverId, Signal, Signals};
use crate::types::{is_truthy, JobKind, JobSpec, ParsedRule, RuleInput, RuleShape};

/// Timing metrics of the latest run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeMetrics {
    /// Duration per job name, first invocation only
    pub jobs: IndexMap<String, Duration>,
    /// Wall-clock duration of the whole run
    pub total_runtime: Duration,
}

impl RuntimeMetrics {
    fn reset(&mut self) {
        self.jobs.clear();
        self.total_runtime = Duration::ZERO;
    }

    /// Set-if-absent: a job name repeated within one run keeps its first timing
    fn record_job(&mut self, name: &str, elapsed: Duration) {
        self.jobs.entry(name.to_string()).or_insert(elapsed);
    }
}

/// Rule engine: registry + parser + executor + exporter
pub struct Engine {
    registry: Registry,
    parser: Box<dyn RuleParser>,
    signals: Signals,
    metrics: RuntimeMetrics,
    session: Session,
    parsed_rule: Vec<JobSpec>,
    config: EngineConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            parser: Box::new(DefaultParser),
            signals: Signals::new(),
            metrics: RuntimeMetrics::default(),
            session: Session::new(),
            parsed_rule: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Seed the engine-owned context session
    pub fn with_context(mut self, context: Session) -> Self {
        self.session = context;
        self
    }

    /// Replace the rule parser
    pub fn with_parser(mut self, parser: Box<dyn RuleParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Apply a configuration; attaches a run logger when `log_dir` is set
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        if let Some(log_dir) = &config.log_dir {
            let logger = Arc::new(RunLogger::new(log_dir, &config.name));
            self.signals
                .connect(HookPoint::PostEngineRun, move |event| logger.on_event(event));
        }
        self.config = config;
        self
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    pub fn register(&mut self, function: JobFunction, label: Option<&str>, kind: JobKind) {
        self.registry.register(function, label, kind);
    }

    pub fn condition(&mut self, function: JobFunction, label: Option<&str>) {
        self.registry.condition(function, label);
    }

    pub fn action(&mut self, function: JobFunction, label: Option<&str>) {
        self.registry.action(function, label);
    }

    pub fn job(&mut self, function: JobFunction, label: Option<&str>) {
        self.registry.job(function, label);
    }

    /// Bulk-register the jobs of an external source
    pub fn import_jobs(&mut self, source: &dyn JobSource) {
        self.registry.bulk_import(source, None);
    }

    /// Bulk-register with an explicit `(name, descriptor)` list
    pub fn import_jobs_with(
        &mut self,
        source: &dyn JobSource,
        overrides: Vec<(String, JobDescriptor)>,
    ) {
        self.registry.bulk_import(source, Some(overrides));
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    // ------------------------------------------------------------------
    // Hooks
    // ------------------------------------------------------------------

    pub fn signals(&self) -> &Signals {
        &self.signals
    }

    /// Look up a lifecycle signal by name (e.g. "pre_job_call")
    pub fn get_signal(&mut self, name: &str) -> Option<&mut Signal> {
        self.signals.by_name(name)
    }

    pub fn connect<F>(&mut self, point: HookPoint, receiver: F) -> ReceiverId
    where
        F: Fn(&HookEvent<'_>) + Send + Sync + 'static,
    {
        self.signals.connect(point, receiver)
    }

    // ------------------------------------------------------------------
    // Parsing and execution
    // ------------------------------------------------------------------

    /// Parse a rule and keep it as the engine's current rule
    pub fn parse(&mut self, rule: impl Into<RuleInput>) -> Result<Vec<JobSpec>> {
        let parsed = self.parser.parse(rule.into())?;
        self.parsed_rule = parsed.jobs.clone();
        Ok(parsed.jobs)
    }

    /// Run a rule against a caller-owned session
    ///
    /// Returns `true` when every job ran, `false` when a falsy condition
    /// (or, for flat job lists, any falsy job) cut the run short.
    pub fn run(&mut self, rule: impl Into<RuleInput>, session: &mut Session) -> Result<bool> {
        let parsed = self.parser.parse(rule.into())?;
        self.parsed_rule = parsed.jobs.clone();
        self.execute(&parsed, session)
    }

    /// Run a rule against the engine-owned context session
    pub fn run_in_context(&mut self, rule: impl Into<RuleInput>) -> Result<bool> {
        let mut session = std::mem::take(&mut self.session);
        let outcome = self.run(rule, &mut session);
        self.session = session;
        outcome
    }

    /// Import a job source, then run
    pub fn run_with_imports(
        &mut self,
        rule: impl Into<RuleInput>,
        session: &mut Session,
        source: &dyn JobSource,
    ) -> Result<bool> {
        self.import_jobs(source);
        self.run(rule, session)
    }

    fn execute(&mut self, rule: &ParsedRule, session: &mut Session) -> Result<bool> {
        let started = Instant::now();
        self.metrics.reset();

        debug!(
            "Run start: {} jobs ({:?})",
            rule.jobs.len(),
            rule.shape
        );
        self.signals.send(&HookEvent::PreEngineRun {
            rule: &rule.jobs,
            session: &*session,
        });

        let mut completed = true;
        for job in &rule.jobs {
            self.signals.send(&HookEvent::PreJobCall {
                job,
                session: &*session,
            });

            let callable = self.registry.resolve(&job.name)?;
            let arguments = callable.function.bind(job)?;

            let job_started = Instant::now();
            let result = callable.function.call(session, &arguments)?;
            let elapsed = job_started.elapsed();

            debug!("Job {} ({}) -> {} in {:?}", job.name, job.kind, result, elapsed);
            session.push_result(&job.name, result.clone());
            self.metrics.record_job(&job.name, elapsed);

            self.signals.send(&HookEvent::PostJobCall {
                job,
                session: &*session,
                result: &result,
            });

            if should_short_circuit(rule.shape, job.kind, &result) {
                debug!("Short-circuit at {} ({})", job.name, job.kind);
                completed = false;
                break;
            }
        }

        self.metrics.total_runtime = started.elapsed();
        self.signals.send(&HookEvent::PostEngineRun {
            rule: &rule.jobs,
            session: &*session,
            completed,
        });
        debug!(
            "Run end: completed={} in {:?}",
            completed, self.metrics.total_runtime
        );

        Ok(completed)
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Engine-owned context session
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Jobs of the most recently parsed rule
    pub fn parsed_rule(&self) -> &[JobSpec] {
        &self.parsed_rule
    }

    pub fn runtime_metrics(&self) -> &RuntimeMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Metadata export
    // ------------------------------------------------------------------

    /// Export registered callables in the given format
    pub fn export_metadata(&self, format: ExportFormat) -> Result<ExportOutput> {
        self.exporter().export(&self.registry, format)
    }

    /// Export in the configured format
    pub fn export_default(&self) -> Result<ExportOutput> {
        self.export_metadata(self.config.export_format)
    }

    fn exporter(&self) -> MetadataExporter {
        if self.config.group_exports_by_kind {
            MetadataExporter::grouped()
        } else {
            MetadataExporter::flat()
        }
    }
}

/// Falsy conditions always stop the run; in flat lists any falsy job does
fn should_short_circuit(shape: RuleShape, kind: JobKind, result: &Value) -> bool {
    if is_truthy(result) {
        return false;
    }
    kind == JobKind::Condition || shape == RuleShape::Flat
}
