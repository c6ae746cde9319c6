//! Fill reports.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A step of the fill pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Similarity analysis behind the idempotency gate
    Analysis,
    /// Text placeholder replacement
    Placeholders,
    /// Title restyling
    Title,
    /// Gallery grid
    Gallery,
    /// Image placeholder replacement
    Images,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Analysis => "analysis",
            Phase::Placeholders => "placeholders",
            Phase::Title => "title",
            Phase::Gallery => "gallery",
            Phase::Images => "images",
        };
        f.write_str(name)
    }
}

/// How a phase ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseOutcome {
    /// Batches were submitted
    Applied {
        /// Operations accepted
        operations: usize,
        /// Batches accepted
        batches: usize,
    },

    /// Nothing to do
    Skipped {
        /// Why
        reason: String,
    },

    /// The phase failed; later phases still ran
    Failed {
        /// Error message
        error: String,
    },
}

impl PhaseOutcome {
    /// Fold a phase result: "not found" means skipped, anything else failed.
    pub fn from_result(result: Result<PhaseOutcome>) -> Self {
        match result {
            Ok(outcome) => outcome,
            Err(Error::NotFound(what)) => PhaseOutcome::skipped(format!("{} not found", what)),
            Err(e) => PhaseOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    /// Skipped with a reason.
    pub fn skipped(reason: impl Into<String>) -> Self {
        PhaseOutcome::Skipped {
            reason: reason.into(),
        }
    }

    /// Check if the phase failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, PhaseOutcome::Failed { .. })
    }

    /// Operations accepted in this phase.
    pub fn operations(&self) -> usize {
        match self {
            PhaseOutcome::Applied { operations, .. } => *operations,
            _ => 0,
        }
    }
}

/// Outcome of one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    /// Which phase
    pub phase: Phase,

    /// How it ended
    #[serde(flatten)]
    pub outcome: PhaseOutcome,
}

/// Outcome of a whole fill run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    /// Document that was filled
    pub document_id: String,

    /// Phases in execution order
    pub phases: Vec<PhaseReport>,

    /// Non-fatal problems: missing placeholders, unusable images
    pub warnings: Vec<String>,
}

impl FillReport {
    /// Create an empty report.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            ..Default::default()
        }
    }

    /// Record a phase outcome.
    pub fn record(&mut self, phase: Phase, outcome: PhaseOutcome) {
        self.phases.push(PhaseReport { phase, outcome });
    }

    /// Outcome of a phase, if it ran.
    pub fn phase(&self, phase: Phase) -> Option<&PhaseOutcome> {
        self.phases
            .iter()
            .find(|r| r.phase == phase)
            .map(|r| &r.outcome)
    }

    /// Check if no phase failed.
    pub fn is_complete(&self) -> bool {
        !self.phases.iter().any(|r| r.outcome.is_failed())
    }

    /// Total operations accepted.
    pub fn operation_count(&self) -> usize {
        self.phases.iter().map(|r| r.outcome.operations()).sum()
    }
}
