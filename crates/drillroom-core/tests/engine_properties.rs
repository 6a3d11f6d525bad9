//! Engine invariants checked over randomized dispatch sequences.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use proptest::prelude::*;

use drillroom_core::{
    problem, ClearApproach, EventPayload, Preset, Reflection, SessionEngine, SessionStatus,
    StallRecovery, TimePressure, YesNo,
};

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

fn arb_reflection() -> impl Strategy<Value = Reflection> {
    (
        prop_oneof![
            Just(ClearApproach::Yes),
            Just(ClearApproach::Partially),
            Just(ClearApproach::No),
        ],
        prop_oneof![Just(YesNo::Yes), Just(YesNo::No)],
        prop_oneof![
            Just(StallRecovery::Yes),
            Just(StallRecovery::Partially),
            Just(StallRecovery::No),
            Just(StallRecovery::NotApplicable),
        ],
        prop_oneof![
            Just(TimePressure::Comfortable),
            Just(TimePressure::Manageable),
            Just(TimePressure::Overwhelming),
        ],
        prop_oneof![Just(YesNo::Yes), Just(YesNo::No)],
    )
        .prop_map(
            |(
                clear_approach,
                prolonged_stall,
                recovered_from_stall,
                time_pressure,
                would_change_approach,
            )| Reflection {
                clear_approach,
                prolonged_stall,
                recovered_from_stall,
                time_pressure,
                would_change_approach,
            },
        )
}

/// Any member of the closed event set, valid or not for the current phase.
fn arb_payload() -> impl Strategy<Value = EventPayload> {
    prop_oneof![
        Just(EventPayload::SessionStarted {}),
        "[a-z ]{0,12}".prop_map(|text| EventPayload::PrepInvariantsChanged { text }),
        Just(EventPayload::PrepTimeExpired {}),
        Just(EventPayload::CodingStarted {}),
        "[a-z ]{0,12}".prop_map(|code| EventPayload::CodingCodeChanged { code }),
        Just(EventPayload::NudgeRequested {}),
        Just(EventPayload::CodingSilentStarted {}),
        Just(EventPayload::CodingSolutionSubmitted {}),
        Just(EventPayload::SilentEnded {}),
        Just(EventPayload::SummaryContinued {}),
        arb_reflection().prop_map(EventPayload::ReflectionSubmitted),
        Just(EventPayload::SessionCompleted {}),
        Just(EventPayload::SessionAbandoned {}),
        Just(EventPayload::AudioStarted {}),
        Just(EventPayload::AudioStopped {}),
        Just(EventPayload::AudioPermissionDenied {}),
    ]
}

proptest! {
    #[test]
    fn nudge_sum_equals_the_budget(payloads in proptest::collection::vec(arb_payload(), 1..60)) {
        let (mut engine, clock) = engine_at(0);
        let budget = engine.config().nudge_budget;
        for payload in payloads {
            clock.fetch_add(500, Ordering::SeqCst);
            let _ = engine.dispatch(payload);
            let state = engine.state();
            prop_assert_eq!(state.nudges_used + state.nudges_remaining, budget);
        }
    }

    #[test]
    fn rejection_changes_nothing(payloads in proptest::collection::vec(arb_payload(), 1..60)) {
        let (mut engine, clock) = engine_at(0);
        for payload in payloads {
            clock.fetch_add(500, Ordering::SeqCst);
            let before_len = engine.events().len();
            let before = engine.state();
            if engine.dispatch(payload).is_err() {
                let after = engine.state();
                prop_assert_eq!(engine.events().len(), before_len);
                prop_assert_eq!(after.phase, before.phase);
                prop_assert_eq!(after.status, before.status);
                prop_assert_eq!(after.invariants, before.invariants);
                prop_assert_eq!(after.code, before.code);
                prop_assert_eq!(after.nudges_used, before.nudges_used);
            }
        }
    }

    #[test]
    fn completion_never_dispatches_directly(payloads in proptest::collection::vec(arb_payload(), 0..40)) {
        let (mut engine, clock) = engine_at(0);
        for payload in payloads {
            clock.fetch_add(500, Ordering::SeqCst);
            let status_before = engine.state().status;
            let err = engine.dispatch(EventPayload::SessionCompleted {}).unwrap_err();
            let expected = if status_before == SessionStatus::InProgress {
                "INVALID_PHASE"
            } else {
                "SESSION_TERMINATED"
            };
            prop_assert_eq!(err.code(), expected);
            let _ = engine.dispatch(payload);
        }
    }

    #[test]
    fn replay_reproduces_the_projection(payloads in proptest::collection::vec(arb_payload(), 1..60)) {
        let (mut engine, clock) = engine_at(0);
        for payload in payloads {
            clock.fetch_add(500, Ordering::SeqCst);
            let _ = engine.dispatch(payload);
        }
        let original = engine.state();

        let (mut revived, _clock) = engine_at(0);
        revived.restore(engine.events());
        let replayed = revived.state();

        prop_assert_eq!(replayed.phase, original.phase);
        prop_assert_eq!(replayed.status, original.status);
        prop_assert_eq!(replayed.invariants, original.invariants);
        prop_assert_eq!(replayed.code, original.code);
        prop_assert_eq!(replayed.nudges_used, original.nudges_used);
        prop_assert_eq!(replayed.nudges_remaining, original.nudges_remaining);
        prop_assert_eq!(replayed.reflection, original.reflection);
        prop_assert_eq!(replayed.prep_time_used_ms, original.prep_time_used_ms);
        prop_assert_eq!(replayed.session_started_at_ms, original.session_started_at_ms);
        prop_assert_eq!(replayed.silent_started_at_ms, original.silent_started_at_ms);
    }
}
