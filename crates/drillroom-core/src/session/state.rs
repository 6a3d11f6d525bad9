//! Derived session state and the self-reflection answer set.

use serde::{Deserialize, Serialize};

use super::preset::{Preset, SessionConfig};
use crate::error::DispatchError;
use crate::problem::Problem;

/// One of the six named stages of a session's lifecycle. Pre-start is
/// `None` on the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Prep,
    Coding,
    Silent,
    Summary,
    Reflection,
    Done,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Prep => "Prep",
            Phase::Coding => "Coding",
            Phase::Silent => "Silent",
            Phase::Summary => "Summary",
            Phase::Reflection => "Reflection",
            Phase::Done => "Done",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal-or-not status, orthogonal to the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    AbandonedExplicit,
}

impl SessionStatus {
    /// Terminal sessions accept no further events.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::AbandonedExplicit => "abandoned_explicit",
        }
    }

    pub fn parse(s: &str) -> Option<SessionStatus> {
        match s {
            "in_progress" => Some(SessionStatus::InProgress),
            "completed" => Some(SessionStatus::Completed),
            "abandoned_explicit" => Some(SessionStatus::AbandonedExplicit),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearApproach {
    Yes,
    Partially,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StallRecovery {
    Yes,
    Partially,
    No,
    #[serde(rename = "n/a")]
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePressure {
    Comfortable,
    Manageable,
    Overwhelming,
}

/// The mandatory five-question self-assessment required to reach Done.
///
/// Field names serialize camelCase -- this is the `reflection.submitted`
/// wire payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reflection {
    pub clear_approach: ClearApproach,
    pub prolonged_stall: YesNo,
    pub recovered_from_stall: StallRecovery,
    pub time_pressure: TimePressure,
    pub would_change_approach: YesNo,
}

impl Reflection {
    /// Cross-field rule: recovery can only be inapplicable when no stall
    /// occurred in the first place.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.recovered_from_stall == StallRecovery::NotApplicable
            && self.prolonged_stall != YesNo::No
        {
            return Err(DispatchError::ValidationFailed(
                "recoveredFromStall may be \"n/a\" only when prolongedStall is \"no\"".into(),
            ));
        }
        Ok(())
    }
}

/// A derived, non-authoritative projection of the event log at a point in
/// time. Always a pure fold of the log plus "now"; never stored, never
/// updated independently of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Opaque id, assigned when `session.started` is folded.
    pub id: Option<String>,
    pub phase: Option<Phase>,
    pub status: SessionStatus,
    pub problem: Problem,
    pub preset: Preset,
    pub config: SessionConfig,
    /// Latest invariants scratchpad contents.
    pub invariants: String,
    /// Latest code buffer contents.
    pub code: String,
    pub nudges_used: u32,
    pub nudges_remaining: u32,
    /// True iff the phase is Coding and budget remains.
    pub nudges_allowed: bool,
    pub is_recording: bool,
    /// Countdown for the active phase, recomputed against "now" on every
    /// read. Signed: negative means overrun.
    pub remaining_ms: i64,
    /// How long prep actually took; set once coding starts.
    pub prep_time_used_ms: Option<i64>,
    pub prep_time_expired: bool,
    pub reflection: Option<Reflection>,
    pub session_started_at_ms: Option<i64>,
    pub prep_started_at_ms: Option<i64>,
    pub coding_started_at_ms: Option<i64>,
    pub silent_started_at_ms: Option<i64>,
}

impl SessionState {
    /// The fixed projection every fold starts from.
    pub(crate) fn initial(problem: Problem, preset: Preset) -> Self {
        let config = preset.config();
        Self {
            id: None,
            phase: None,
            status: SessionStatus::InProgress,
            problem,
            preset,
            config,
            invariants: String::new(),
            code: String::new(),
            nudges_used: 0,
            nudges_remaining: config.nudge_budget,
            nudges_allowed: false,
            is_recording: false,
            remaining_ms: config.prep_duration_ms,
            prep_time_used_ms: None,
            prep_time_expired: false,
            reflection: None,
            session_started_at_ms: None,
            prep_started_at_ms: None,
            coding_started_at_ms: None,
            silent_started_at_ms: None,
        }
    }
}
