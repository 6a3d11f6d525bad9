//! Wall-clock session driver.
//!
//! The engine never initiates phase transitions on its own; a caller has to
//! observe an expired countdown and dispatch the corresponding event. This
//! is that caller for CLI and test use -- invoke it periodically, in the
//! style of a timer tick.

use super::engine::SessionEngine;
use super::event::{EventPayload, SessionEvent};
use super::state::Phase;
use crate::error::DispatchError;

/// Dispatch whatever expiry transitions the current clock reading calls
/// for, oldest first. A prep overrun produces `prep.time_expired` and then
/// `coding.started` in the same tick; coding and silent overruns produce
/// their single auto-transition. Returns the events appended.
pub fn advance_expired(engine: &mut SessionEngine) -> Result<Vec<SessionEvent>, DispatchError> {
    let mut produced = Vec::new();
    loop {
        let state = engine.state();
        if state.status.is_terminal() || state.remaining_ms > 0 {
            break;
        }
        let payload = match state.phase {
            Some(Phase::Prep) if !state.prep_time_expired => EventPayload::PrepTimeExpired {},
            Some(Phase::Prep) => EventPayload::CodingStarted {},
            Some(Phase::Coding) => EventPayload::CodingSilentStarted {},
            Some(Phase::Silent) => EventPayload::SilentEnded {},
            // Summary onward reads zero remaining but has no countdown.
            _ => break,
        };
        tracing::debug!(event = payload.kind().as_str(), "phase expired, auto-advancing");
        produced.push(engine.dispatch(payload)?);
    }
    Ok(produced)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::problem;
    use crate::session::{Preset, SessionEngine};

    fn engine_at(start_ms: i64) -> (SessionEngine, Arc<AtomicI64>) {
        let clock = Arc::new(AtomicI64::new(start_ms));
        let handle = clock.clone();
        let engine = SessionEngine::with_clock(
            problem::builtin_catalog().remove(0),
            Preset::Standard,
            Box::new(move || handle.load(Ordering::SeqCst)),
        );
        (engine, clock)
    }

    #[test]
    fn nothing_due_while_countdown_runs() {
        let (mut engine, _clock) = engine_at(0);
        engine.dispatch(EventPayload::SessionStarted {}).unwrap();
        assert!(advance_expired(&mut engine).unwrap().is_empty());
    }

    #[test]
    fn prep_expiry_chains_into_coding() {
        let (mut engine, clock) = engine_at(0);
        engine.dispatch(EventPayload::SessionStarted {}).unwrap();
        clock.store(300_001, Ordering::SeqCst);
        let produced = advance_expired(&mut engine).unwrap();
        let kinds: Vec<_> = produced.iter().map(|e| e.payload.kind().as_str()).collect();
        assert_eq!(kinds, ["prep.time_expired", "coding.started"]);
        let state = engine.state();
        assert_eq!(state.phase, Some(Phase::Coding));
        assert!(state.prep_time_expired);
        // Coding entry was stamped at the same tick, so its countdown is full.
        assert_eq!(state.remaining_ms, 35 * 60 * 1000);
    }

    #[test]
    fn coding_expiry_enters_silent() {
        let (mut engine, clock) = engine_at(0);
        engine.dispatch(EventPayload::SessionStarted {}).unwrap();
        engine.dispatch(EventPayload::CodingStarted {}).unwrap();
        clock.store(40 * 60 * 1000, Ordering::SeqCst);
        let produced = advance_expired(&mut engine).unwrap();
        assert_eq!(produced.len(), 1);
        assert_eq!(engine.state().phase, Some(Phase::Silent));
    }

    #[test]
    fn silent_expiry_reaches_summary_and_stops() {
        let (mut engine, clock) = engine_at(0);
        engine.dispatch(EventPayload::SessionStarted {}).unwrap();
        engine.dispatch(EventPayload::CodingStarted {}).unwrap();
        engine.dispatch(EventPayload::CodingSilentStarted {}).unwrap();
        clock.store(10_000_000, Ordering::SeqCst);
        let produced = advance_expired(&mut engine).unwrap();
        assert_eq!(produced.len(), 1);
        assert_eq!(engine.state().phase, Some(Phase::Summary));
        // Summary has no countdown; a second tick is a no-op.
        assert!(advance_expired(&mut engine).unwrap().is_empty());
    }
}
