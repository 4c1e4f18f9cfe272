//! Per-invocation ingestion stage tracking.
//!
//! Stages advance strictly one step at a time:
//! `idle → reading → detecting → validating → building → done`, with `error`
//! reachable from any non-idle, non-terminal stage. A tracker is created for
//! each ingestion run and never shared.

use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Reading,
    Detecting,
    Validating,
    Building,
    Done,
    Error,
}

impl Stage {
    pub fn percent(self) -> u8 {
        match self {
            Stage::Idle => 0,
            Stage::Reading => 20,
            Stage::Detecting => 40,
            Stage::Validating => 60,
            Stage::Building => 80,
            Stage::Done => 100,
            Stage::Error => 0,
        }
    }

    pub fn message_key(self) -> &'static str {
        match self {
            Stage::Idle => "progress.idle",
            Stage::Reading => "progress.reading",
            Stage::Detecting => "progress.detecting",
            Stage::Validating => "progress.validating",
            Stage::Building => "progress.building",
            Stage::Done => "progress.done",
            Stage::Error => "progress.error",
        }
    }

    fn successor(self) -> Option<Stage> {
        match self {
            Stage::Idle => Some(Stage::Reading),
            Stage::Reading => Some(Stage::Detecting),
            Stage::Detecting => Some(Stage::Validating),
            Stage::Validating => Some(Stage::Building),
            Stage::Building => Some(Stage::Done),
            Stage::Done | Stage::Error => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Error)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Reading => "reading",
            Stage::Detecting => "detecting",
            Stage::Validating => "validating",
            Stage::Building => "building",
            Stage::Done => "done",
            Stage::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub stage: Stage,
    pub message_key: String,
    pub percent: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
}

pub trait ProgressSink {
    fn update(&mut self, update: &ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: FnMut(&ProgressUpdate),
{
    fn update(&mut self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Sink that discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _update: &ProgressUpdate) {}
}

pub struct ProgressTracker<'a> {
    stage: Stage,
    percent: u8,
    sink: &'a mut dyn ProgressSink,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        Self {
            stage: Stage::Idle,
            percent: 0,
            sink,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Moves to `next` if it is the immediate successor of the current stage.
    /// Returns `false` and leaves the state untouched otherwise.
    pub fn advance(&mut self, next: Stage) -> bool {
        if self.stage.successor() != Some(next) {
            warn!("Refusing progress transition {} -> {}", self.stage, next);
            return false;
        }
        self.stage = next;
        self.percent = next.percent();
        debug!("Ingestion stage {} ({}%)", next, self.percent);
        self.sink.update(&ProgressUpdate {
            stage: next,
            message_key: next.message_key().to_string(),
            percent: self.percent,
            error: None,
        });
        true
    }

    /// Enters the terminal `error` stage, keeping the last reached percentage.
    pub fn fail(&mut self, code: ErrorCode) -> bool {
        if self.stage == Stage::Idle || self.stage.is_terminal() {
            warn!("Refusing error transition from {}", self.stage);
            return false;
        }
        self.stage = Stage::Error;
        debug!("Ingestion failed with {code} at {}%", self.percent);
        self.sink.update(&ProgressUpdate {
            stage: Stage::Error,
            message_key: format!("error.{code}"),
            percent: self.percent,
            error: Some(code),
        });
        true
    }
}
