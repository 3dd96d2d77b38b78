//! Lifecycle hooks
//!
//! Four named signals fire around every run and every job call. Receivers
//! are plain observers: they run inline, in connection order, and cannot
//! change the engine's control flow.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::session::Session;
use crate::types::JobSpec;

/// Hook point in the run lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    PreEngineRun,
    PostEngineRun,
    PreJobCall,
    PostJobCall,
}

impl HookPoint {
    pub const ALL: [HookPoint; 4] = [
        HookPoint::PreEngineRun,
        HookPoint::PostEngineRun,
        HookPoint::PreJobCall,
        HookPoint::PostJobCall,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HookPoint::PreEngineRun => "pre_engine_run",
            HookPoint::PostEngineRun => "post_engine_run",
            HookPoint::PreJobCall => "pre_job_call",
            HookPoint::PostJobCall => "post_job_call",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|point| point.name() == name)
    }

    fn index(&self) -> usize {
        match self {
            HookPoint::PreEngineRun => 0,
            HookPoint::PostEngineRun => 1,
            HookPoint::PreJobCall => 2,
            HookPoint::PostJobCall => 3,
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload delivered to receivers
#[derive(Debug, Clone, Copy)]
pub enum HookEvent<'a> {
    PreEngineRun {
        rule: &'a [JobSpec],
        session: &'a Session,
    },
    PostEngineRun {
        rule: &'a [JobSpec],
        session: &'a Session,
        completed: bool,
    },
    PreJobCall {
        job: &'a JobSpec,
        session: &'a Session,
    },
    PostJobCall {
        job: &'a JobSpec,
        session: &'a Session,
        result: &'a Value,
    },
}

impl HookEvent<'_> {
    pub fn point(&self) -> HookPoint {
        match self {
            HookEvent::PreEngineRun { .. } => HookPoint::PreEngineRun,
            HookEvent::PostEngineRun { .. } => HookPoint::PostEngineRun,
            HookEvent::PreJobCall { .. } => HookPoint::PreJobCall,
            HookEvent::PostJobCall { .. } => HookPoint::PostJobCall,
        }
    }

    pub fn session(&self) -> &Session {
        match self {
            HookEvent::PreEngineRun { session, .. }
            | HookEvent::PostEngineRun { session, .. }
            | HookEvent::PreJobCall { session, .. }
            | HookEvent::PostJobCall { session, .. } => session,
        }
    }
}

/// Receiver callback
pub type Receiver = dyn Fn(&HookEvent<'_>) + Send + Sync;

/// Handle returned by [`Signal::connect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverId(u64);

/// A named signal with its ordered receivers
pub struct Signal {
    point: HookPoint,
    next_id: u64,
    receivers: Vec<(ReceiverId, Arc<Receiver>)>,
}

impl Signal {
    fn new(point: HookPoint) -> Self {
        Self {
            point,
            next_id: 0,
            receivers: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.point.name()
    }

    pub fn point(&self) -> HookPoint {
        self.point
    }

    pub fn connect<F>(&mut self, receiver: F) -> ReceiverId
    where
        F: Fn(&HookEvent<'_>) + Send + Sync + 'static,
    {
        let id = ReceiverId(self.next_id);
        self.next_id += 1;
        self.receivers.push((id, Arc::new(receiver)));
        id
    }

    /// Remove a receiver; returns whether it was connected
    pub fn disconnect(&mut self, id: ReceiverId) -> bool {
        let before = self.receivers.len();
        self.receivers.retain(|(rid, _)| *rid != id);
        self.receivers.len() != before
    }

    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }

    pub fn send(&self, event: &HookEvent<'_>) {
        for (_, receiver) in &self.receivers {
            receiver(event);
        }
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.name())
            .field("receivers", &self.receivers.len())
            .finish()
    }
}

/// All lifecycle signals of one engine
#[derive(Debug)]
pub struct Signals {
    signals: [Signal; 4],
}

impl Default for Signals {
    fn default() -> Self {
        Self {
            signals: HookPoint::ALL.map(Signal::new),
        }
    }
}

impl Signals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, point: HookPoint) -> &Signal {
        &self.signals[point.index()]
    }

    pub fn get_mut(&mut self, point: HookPoint) -> &mut Signal {
        &mut self.signals[point.index()]
    }

    /// Look up a signal by its name (e.g. "pre_job_call")
    pub fn by_name(&mut self, name: &str) -> Option<&mut Signal> {
        HookPoint::from_name(name).map(|point| self.get_mut(point))
    }

    /// Signal names in lifecycle order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.signals.iter().map(Signal::name)
    }

    pub fn connect<F>(&mut self, point: HookPoint, receiver: F) -> ReceiverId
    where
        F: Fn(&HookEvent<'_>) + Send + Sync + 'static,
    {
        self.get_mut(point).connect(receiver)
    }

    pub fn send(&self, event: &HookEvent<'_>) {
        self.get(event.point()).send(event);
    }
}
