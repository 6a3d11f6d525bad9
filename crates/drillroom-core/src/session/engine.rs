//! Session engine implementation.
//!
//! The engine is an event-sourced state machine. It owns an append-only log
//! of [`SessionEvent`]s, validates every proposed event against the current
//! phase before appending, derives state by replaying the log through the
//! reducer (memoized by log length), and notifies subscribers synchronously
//! after each successful append.
//!
//! Time comes exclusively from an injected clock, so the engine never
//! schedules anything itself -- a caller observes `state().remaining_ms`
//! and dispatches expiry events (see [`super::driver`]).
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = SessionEngine::new(problem, Preset::Standard);
//! engine.dispatch(EventPayload::SessionStarted {})?;
//! let state = engine.state(); // phase = Prep, countdown running
//! ```

use chrono::Utc;

use super::event::{EventKind, EventPayload, SessionEvent};
use super::preset::{Preset, SessionConfig};
use super::reducer;
use super::state::{Phase, SessionState};
use crate::error::DispatchError;
use crate::problem::Problem;

/// Zero-argument clock returning epoch milliseconds. Injected so every
/// engine operation is deterministic under a substituted clock.
pub type Clock = Box<dyn Fn() -> i64 + Send>;

/// Handle returned by [`SessionEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Subscriber = Box<dyn FnMut(&SessionEvent, &SessionState) + Send>;

/// Core session state machine. One instance per practice session; no
/// cross-instance sharing.
pub struct SessionEngine {
    problem: Problem,
    preset: Preset,
    clock: Clock,
    events: Vec<SessionEvent>,
    /// Projection memo keyed by log length. Its `remaining_ms` is stale by
    /// construction; `state()` refreshes it on every read.
    cache_len: usize,
    cache: SessionState,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber: u64,
}

impl SessionEngine {
    /// Engine over the system clock.
    pub fn new(problem: Problem, preset: Preset) -> Self {
        Self::with_clock(problem, preset, Box::new(|| Utc::now().timestamp_millis()))
    }

    /// Engine over an injected clock (tests, simulations).
    pub fn with_clock(problem: Problem, preset: Preset, clock: Clock) -> Self {
        let cache = SessionState::initial(problem.clone(), preset);
        Self {
            problem,
            preset,
            clock,
            events: Vec::new(),
            cache_len: 0,
            cache,
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    pub fn config(&self) -> SessionConfig {
        self.preset.config()
    }

    /// Validate and append one event.
    ///
    /// Checks short-circuit in a fixed order: terminal status, transition
    /// table, then event-specific rules (nudge budget, reflection
    /// validity). A rejected dispatch is a complete no-op.
    ///
    /// Accepting `reflection.submitted` additionally appends a synthetic
    /// `session.completed` with its own independent clock reading --
    /// completion is never reachable by direct dispatch.
    pub fn dispatch(&mut self, payload: EventPayload) -> Result<SessionEvent, DispatchError> {
        let kind = payload.kind();
        self.check_transition(kind)?;
        match &payload {
            EventPayload::NudgeRequested {} if self.projection().nudges_remaining == 0 => {
                return Err(DispatchError::NudgeBudgetExhausted);
            }
            EventPayload::ReflectionSubmitted(reflection) => reflection.validate()?,
            _ => {}
        }
        let event = SessionEvent {
            timestamp: (self.clock)(),
            payload,
        };
        self.append(event.clone());
        if kind == EventKind::ReflectionSubmitted {
            let completed = SessionEvent {
                timestamp: (self.clock)(),
                payload: EventPayload::SessionCompleted {},
            };
            self.append(completed);
        }
        Ok(event)
    }

    /// Dispatch from wire parts: a dotted event identifier plus its JSON
    /// payload. Identifiers outside the closed set fail with
    /// `INVALID_EVENT_TYPE`; payloads that do not decode for their type
    /// fail with `VALIDATION_FAILED`.
    pub fn dispatch_raw(
        &mut self,
        event_type: &str,
        data: serde_json::Value,
    ) -> Result<SessionEvent, DispatchError> {
        let kind = EventKind::parse(event_type)
            .ok_or_else(|| DispatchError::InvalidEventType(event_type.to_string()))?;
        self.check_transition(kind)?;
        let payload = EventPayload::from_parts(kind, data)
            .map_err(|e| DispatchError::ValidationFailed(e.to_string()))?;
        self.dispatch(payload)
    }

    /// Current projection with `remaining_ms` recomputed against the clock,
    /// so repeated calls without new events still reflect elapsed time.
    pub fn state(&mut self) -> SessionState {
        let now = (self.clock)();
        let mut state = self.projection().clone();
        state.remaining_ms = reducer::remaining_ms(&state, now);
        state
    }

    /// Defensive copy of the ordered log.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.clone()
    }

    /// Register a listener invoked after every successful append (the
    /// synthetic completion included), in registration order.
    pub fn subscribe(
        &mut self,
        subscriber: impl FnMut(&SessionEvent, &SessionState) + Send + 'static,
    ) -> SubscriberId {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Remove a listener. Safe to call with an already-removed id.
    pub fn unsubscribe(&mut self, id: SubscriberId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Wholesale-replace the log with an externally stored sequence and
    /// rebuild the projection. Replay trusts the supplied log as
    /// previously validated; historical transitions are not re-checked.
    pub fn restore(&mut self, events: Vec<SessionEvent>) {
        self.events = events;
        self.rebuild();
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Validation shared by both dispatch entry points: terminal status
    /// first, then the transition table.
    fn check_transition(&mut self, kind: EventKind) -> Result<(), DispatchError> {
        let (status, phase) = {
            let s = self.projection();
            (s.status, s.phase)
        };
        if status.is_terminal() {
            return Err(DispatchError::SessionTerminated(status));
        }
        if !transition_allowed(phase, kind) {
            return Err(DispatchError::InvalidPhase { event: kind, phase });
        }
        Ok(())
    }

    fn append(&mut self, event: SessionEvent) {
        self.events.push(event.clone());
        self.rebuild();
        if self.subscribers.is_empty() {
            return;
        }
        let now = (self.clock)();
        let mut state = self.cache.clone();
        state.remaining_ms = reducer::remaining_ms(&state, now);
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&event, &state);
        }
    }

    /// Replay from scratch only when the log has grown since the memo.
    fn projection(&mut self) -> &SessionState {
        if self.cache_len != self.events.len() {
            self.rebuild();
        }
        &self.cache
    }

    fn rebuild(&mut self) {
        self.cache = reducer::replay(&self.problem, self.preset, &self.events);
        self.cache_len = self.events.len();
    }
}

/// The transition table: which phase(s) may source each event.
///
/// `session.completed` has no legal direct-dispatch source; it exists only
/// as the engine's own side effect of an accepted reflection. Done accepts
/// nothing (and its `completed` status is caught even earlier).
pub(crate) fn transition_allowed(phase: Option<Phase>, kind: EventKind) -> bool {
    use EventKind::*;
    match kind {
        SessionStarted => phase.is_none(),
        PrepInvariantsChanged | PrepTimeExpired | CodingStarted | AudioPermissionDenied => {
            phase == Some(Phase::Prep)
        }
        NudgeRequested | CodingSilentStarted | CodingSolutionSubmitted => {
            phase == Some(Phase::Coding)
        }
        CodingCodeChanged | AudioStarted | AudioStopped => {
            matches!(phase, Some(Phase::Coding) | Some(Phase::Silent))
        }
        SilentEnded => phase == Some(Phase::Silent),
        SummaryContinued => phase == Some(Phase::Summary),
        ReflectionSubmitted => phase == Some(Phase::Reflection),
        SessionAbandoned => matches!(
            phase,
            Some(Phase::Prep)
                | Some(Phase::Coding)
                | Some(Phase::Silent)
                | Some(Phase::Summary)
                | Some(Phase::Reflection)
        ),
        SessionCompleted => false,
    }
}
