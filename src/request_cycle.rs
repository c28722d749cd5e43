//! Per-request lifecycle.
//!
//! `Idle -> Collecting -> Submitted -> Predicting -> Resolved | Failed`, and
//! `reset()` back to `Idle`. The record is frozen once submitted.

use crate::errors::{DashError, DashResult};
use crate::form_builder::{FormBuilder, FormEdits};
use crate::inference::{InferenceInvoker, PredictionResult};
use crate::record::InputRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CyclePhase {
    Idle,
    Collecting,
    Submitted,
    Predicting,
    Resolved,
    Failed,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CyclePhase::Idle => "Idle",
            CyclePhase::Collecting => "Collecting",
            CyclePhase::Submitted => "Submitted",
            CyclePhase::Predicting => "Predicting",
            CyclePhase::Resolved => "Resolved",
            CyclePhase::Failed => "Failed",
        };
        write!(f, "{name}")
    }
}

pub struct PredictionCycle {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    phase: CyclePhase,
    record: Option<InputRecord>,
    result: Option<PredictionResult>,
    failure: Option<String>,
}

impl PredictionCycle {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            phase: CyclePhase::Idle,
            record: None,
            result: None,
            failure: None,
        }
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn record(&self) -> Option<&InputRecord> {
        self.record.as_ref()
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn advance(&mut self, allowed_from: &[CyclePhase], to: CyclePhase) -> DashResult<()> {
        if !allowed_from.contains(&self.phase) {
            return Err(DashError::invalid_transition(
                self.phase.to_string(),
                to.to_string(),
            ));
        }
        tracing::debug!("Cycle {}: {} -> {}", self.id, self.phase, to);
        self.phase = to;
        Ok(())
    }

    /// Recompute the record from the current edits. May be called repeatedly.
    pub fn collect(&mut self, form: &FormBuilder, edits: &FormEdits) -> DashResult<&InputRecord> {
        self.advance(&[CyclePhase::Idle, CyclePhase::Collecting], CyclePhase::Collecting)?;
        self.record = None;
        let record = form.build_record(edits)?;
        Ok(self.record.insert(record))
    }

    /// Freeze the collected record
    pub fn submit(&mut self) -> DashResult<()> {
        if self.record.is_none() {
            return Err(DashError::invalid_transition(
                self.phase.to_string(),
                CyclePhase::Submitted.to_string(),
            ));
        }
        self.advance(&[CyclePhase::Collecting], CyclePhase::Submitted)
    }

    /// Invoke the model on the frozen record
    pub fn run(&mut self, invoker: &InferenceInvoker) -> DashResult<PredictionResult> {
        self.advance(&[CyclePhase::Submitted], CyclePhase::Predicting)?;
        let record = self
            .record
            .as_ref()
            .ok_or_else(|| DashError::internal("submitted cycle has no record"))?;

        match invoker.infer(record) {
            Ok(result) => {
                self.phase = CyclePhase::Resolved;
                self.result = Some(result.clone());
                tracing::debug!("Cycle {}: Predicting -> Resolved", self.id);
                Ok(result)
            }
            Err(e) => {
                self.phase = CyclePhase::Failed;
                self.failure = Some(e.to_string());
                tracing::warn!("Cycle {} failed: {}", self.id, e);
                Err(e)
            }
        }
    }

    /// Back to `Idle` for the next interaction
    pub fn reset(&mut self) {
        self.phase = CyclePhase::Idle;
        self.record = None;
        self.result = None;
        self.failure = None;
    }

    /// Collect, submit and run in one pass
    pub fn execute(
        form: &FormBuilder,
        invoker: &InferenceInvoker,
        edits: &FormEdits,
    ) -> (Self, DashResult<PredictionResult>) {
        let mut cycle = Self::new();
        let outcome = cycle.drive(form, invoker, edits);
        (cycle, outcome)
    }

    fn drive(
        &mut self,
        form: &FormBuilder,
        invoker: &InferenceInvoker,
        edits: &FormEdits,
    ) -> DashResult<PredictionResult> {
        self.collect(form, edits)?;
        self.submit()?;
        self.run(invoker)
    }
}

impl Default for PredictionCycle {
    fn default() -> Self {
        Self::new()
    }
}
