//! State derivation: a strict left fold of the event log.
//!
//! Each event type touches exactly the fields it owns. Legality and bounds
//! were enforced at dispatch time; replay trusts the log it is given.

use uuid::Uuid;

use super::event::{EventPayload, SessionEvent};
use super::preset::Preset;
use super::state::{Phase, SessionState, SessionStatus};
use crate::problem::Problem;

/// Fold the ordered log into a projection, then run the cross-cutting
/// derivations (`prep_time_used_ms`, `nudges_allowed`). The caller is
/// responsible for refreshing `remaining_ms` against its own "now".
pub(crate) fn replay(problem: &Problem, preset: Preset, events: &[SessionEvent]) -> SessionState {
    let mut state = SessionState::initial(problem.clone(), preset);
    for event in events {
        apply(&mut state, event);
    }
    if let (Some(prep), Some(coding)) = (state.prep_started_at_ms, state.coding_started_at_ms) {
        state.prep_time_used_ms = Some(coding - prep);
    }
    state.nudges_allowed = state.phase == Some(Phase::Coding) && state.nudges_remaining > 0;
    state
}

fn apply(state: &mut SessionState, event: &SessionEvent) {
    match &event.payload {
        EventPayload::SessionStarted {} => {
            state.id = Some(Uuid::new_v4().to_string());
            state.phase = Some(Phase::Prep);
            state.session_started_at_ms = Some(event.timestamp);
            state.prep_started_at_ms = Some(event.timestamp);
        }
        EventPayload::PrepInvariantsChanged { text } => {
            state.invariants = text.clone();
        }
        EventPayload::PrepTimeExpired {} => {
            state.prep_time_expired = true;
        }
        EventPayload::CodingStarted {} => {
            state.phase = Some(Phase::Coding);
            state.coding_started_at_ms = Some(event.timestamp);
        }
        EventPayload::CodingCodeChanged { code } => {
            state.code = code.clone();
        }
        EventPayload::NudgeRequested {} => {
            state.nudges_used += 1;
            state.nudges_remaining = state.nudges_remaining.saturating_sub(1);
        }
        EventPayload::CodingSilentStarted {} => {
            state.phase = Some(Phase::Silent);
            state.silent_started_at_ms = Some(event.timestamp);
        }
        EventPayload::CodingSolutionSubmitted {} | EventPayload::SilentEnded {} => {
            state.phase = Some(Phase::Summary);
        }
        EventPayload::SummaryContinued {} => {
            state.phase = Some(Phase::Reflection);
        }
        EventPayload::ReflectionSubmitted(reflection) => {
            state.reflection = Some(*reflection);
        }
        EventPayload::SessionCompleted {} => {
            state.phase = Some(Phase::Done);
            state.status = SessionStatus::Completed;
        }
        EventPayload::SessionAbandoned {} => {
            // Phase is left where it was; status alone goes terminal.
            state.status = SessionStatus::AbandonedExplicit;
        }
        EventPayload::AudioStarted {} => {
            state.is_recording = true;
        }
        EventPayload::AudioStopped {} | EventPayload::AudioPermissionDenied {} => {
            state.is_recording = false;
        }
    }
}

/// Per-phase countdown against "now". Phases with no countdown read zero;
/// pre-start reads the full prep duration. Negative is the overrun signal,
/// not an error.
pub(crate) fn remaining_ms(state: &SessionState, now_ms: i64) -> i64 {
    let config = &state.config;
    match state.phase {
        None => config.prep_duration_ms,
        Some(Phase::Prep) => countdown(config.prep_duration_ms, state.prep_started_at_ms, now_ms),
        Some(Phase::Coding) => {
            countdown(config.coding_duration_ms, state.coding_started_at_ms, now_ms)
        }
        Some(Phase::Silent) => {
            countdown(config.silent_duration_ms, state.silent_started_at_ms, now_ms)
        }
        Some(Phase::Summary) | Some(Phase::Reflection) | Some(Phase::Done) => 0,
    }
}

fn countdown(duration_ms: i64, started_at_ms: Option<i64>, now_ms: i64) -> i64 {
    match started_at_ms {
        Some(started) => duration_ms - (now_ms - started),
        None => duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem;

    fn fixture() -> Problem {
        problem::builtin_catalog().remove(0)
    }

    fn event(timestamp: i64, payload: EventPayload) -> SessionEvent {
        SessionEvent { timestamp, payload }
    }

    #[test]
    fn empty_log_is_the_initial_projection() {
        let state = replay(&fixture(), Preset::Standard, &[]);
        assert_eq!(state.phase, None);
        assert_eq!(state.status, SessionStatus::InProgress);
        assert_eq!(state.nudges_remaining, 3);
        assert_eq!(state.remaining_ms, 5 * 60 * 1000);
        assert!(state.id.is_none());
    }

    #[test]
    fn started_stamps_both_entry_times() {
        let state = replay(
            &fixture(),
            Preset::Standard,
            &[event(1000, EventPayload::SessionStarted {})],
        );
        assert_eq!(state.phase, Some(Phase::Prep));
        assert_eq!(state.session_started_at_ms, Some(1000));
        assert_eq!(state.prep_started_at_ms, Some(1000));
        assert!(state.id.is_some());
    }

    #[test]
    fn prep_time_used_derives_from_entry_stamps() {
        let state = replay(
            &fixture(),
            Preset::Standard,
            &[
                event(1000, EventPayload::SessionStarted {}),
                event(181_000, EventPayload::CodingStarted {}),
            ],
        );
        assert_eq!(state.prep_time_used_ms, Some(180_000));
        assert_eq!(state.coding_started_at_ms, Some(181_000));
    }

    #[test]
    fn remaining_goes_negative_on_overrun() {
        let state = replay(
            &fixture(),
            Preset::Standard,
            &[event(1000, EventPayload::SessionStarted {})],
        );
        assert_eq!(remaining_ms(&state, 1000 + 360_000), -60_000);
    }

    #[test]
    fn summary_and_later_phases_have_no_countdown() {
        let state = replay(
            &fixture(),
            Preset::Standard,
            &[
                event(0, EventPayload::SessionStarted {}),
                event(10, EventPayload::CodingStarted {}),
                event(20, EventPayload::CodingSolutionSubmitted {}),
            ],
        );
        assert_eq!(state.phase, Some(Phase::Summary));
        assert_eq!(remaining_ms(&state, 999_999), 0);
        assert_eq!(state.silent_started_at_ms, None);
    }

    #[test]
    fn abandon_preserves_phase() {
        let state = replay(
            &fixture(),
            Preset::Standard,
            &[
                event(0, EventPayload::SessionStarted {}),
                event(10, EventPayload::CodingStarted {}),
                event(20, EventPayload::SessionAbandoned {}),
            ],
        );
        assert_eq!(state.status, SessionStatus::AbandonedExplicit);
        assert_eq!(state.phase, Some(Phase::Coding));
    }

    #[test]
    fn nudge_accounting() {
        let state = replay(
            &fixture(),
            Preset::Standard,
            &[
                event(0, EventPayload::SessionStarted {}),
                event(10, EventPayload::CodingStarted {}),
                event(20, EventPayload::NudgeRequested {}),
                event(30, EventPayload::NudgeRequested {}),
            ],
        );
        assert_eq!(state.nudges_used, 2);
        assert_eq!(state.nudges_remaining, 1);
        assert!(state.nudges_allowed);
    }
}
