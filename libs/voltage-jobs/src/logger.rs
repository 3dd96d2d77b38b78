//! Run execution logger
//!
//! Provides independent log files per engine, one line per run, capturing
//! the executed jobs, their results and whether the run completed.

use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{Local, Utc};
use serde_json::Value;
use tracing::warn;

use crate::signals::HookEvent;
use crate::types::{JobKind, JobSpec};

/// Logger for one engine's runs
pub struct RunLogger {
    engine: String,
    log_dir: PathBuf,
    current_date: Mutex<String>,
    current_file: Mutex<Option<File>>,
}

impl RunLogger {
    /// Create a new RunLogger for a named engine
    ///
    /// Log files will be created in: `{log_root}/rules/{engine}/`
    /// with naming format: `{YYYYMMDD}_{engine}.log`
    pub fn new(log_root: &Path, engine: &str) -> Self {
        let engine_dir = log_root.join("rules").join(engine);
        if let Err(e) = fs::create_dir_all(&engine_dir) {
            warn!("Log dir err {:?}: {}", engine_dir, e);
        }

        Self {
            engine: engine.to_string(),
            log_dir: engine_dir,
            current_date: Mutex::new(String::new()),
            current_file: Mutex::new(None),
        }
    }

    /// Log one finished run
    ///
    /// Format: `timestamp [RULE] engine jobs | results | status`
    pub fn log_run(&self, rule: &[JobSpec], results: &[Value], completed: bool) {
        let status = if completed { "completed" } else { "short-circuit" };
        let message = format!(
            "{} | {} | {}",
            format_jobs(rule),
            format_results(results),
            status
        );
        self.write_line(&message);
    }

    /// Hook receiver logging `post_engine_run` events
    pub fn on_event(&self, event: &HookEvent<'_>) {
        if let HookEvent::PostEngineRun {
            rule,
            session,
            completed,
        } = event
        {
            self.log_run(rule, session.results(), *completed);
        }
    }

    /// Path of today's log file
    pub fn current_path(&self) -> PathBuf {
        let today = Local::now().format("%Y%m%d").to_string();
        self.log_dir.join(format!("{}_{}.log", today, self.engine))
    }

    fn write_line(&self, message: &str) {
        let today = Local::now().format("%Y%m%d").to_string();
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");

        // Check if we need to rotate the file (new day)
        let Ok(mut current_date) = self.current_date.lock() else {
            warn!("Date lock fail");
            return;
        };
        let Ok(mut file_guard) = self.current_file.lock() else {
            warn!("File lock fail");
            return;
        };

        if *current_date != today {
            *current_date = today.clone();
            let file_path = self.log_dir.join(format!("{}_{}.log", today, self.engine));

            match OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)
            {
                Ok(file) => *file_guard = Some(file),
                Err(e) => {
                    warn!("Log open err {:?}: {}", file_path, e);
                    return;
                },
            }
        }

        if let Some(ref mut file) = *file_guard {
            let line = format!("{} [RULE] {} {}\n", timestamp, self.engine, message);
            if let Err(e) = file.write_all(line.as_bytes()) {
                warn!("Log write err: {}", e);
            }
        }
    }
}

/// Format the job sequence (e.g., "C:is_positive A:record_result")
pub fn format_jobs(jobs: &[JobSpec]) -> String {
    if jobs.is_empty() {
        return "-".to_string();
    }

    jobs.iter()
        .map(|job| {
            let tag = match job.kind {
                JobKind::Condition => "C",
                JobKind::Action => "A",
                JobKind::Job => "J",
            };
            format!("{}:{}", tag, job.name)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format recorded results (e.g., "is_positive=true, record_result=6")
pub fn format_results(results: &[Value]) -> String {
    if results.is_empty() {
        return "no result".to_string();
    }

    results
        .iter()
        .map(|entry| {
            let job = entry.get("job").and_then(Value::as_str).unwrap_or("?");
            let ret = entry.get("return").cloned().unwrap_or(Value::Null);
            // Remove quotes from string values
            format!("{}={}", job, ret.to_string().trim_matches('"'))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
