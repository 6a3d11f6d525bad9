//! Session event log types.
//!
//! Every accepted action becomes a [`SessionEvent`] appended to the session
//! log. The serialized shape `{type, timestamp, data}` is the contract
//! persistence must preserve for faithful replay; events are never mutated
//! or removed once appended, and their order is exactly append order.

use serde::{Deserialize, Serialize};

use super::state::Reflection;

/// An immutable, timestamped, typed record appended to a session's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Clock reading at the moment of acceptance, epoch milliseconds.
    pub timestamp: i64,
    #[serde(flatten)]
    pub payload: EventPayload,
}

/// Type-specific event payload. Serializes adjacently tagged so that the
/// wire shape carries the dotted event identifier under `type` and the
/// payload under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EventPayload {
    #[serde(rename = "session.started")]
    SessionStarted {},
    #[serde(rename = "prep.invariants_changed")]
    PrepInvariantsChanged { text: String },
    #[serde(rename = "prep.time_expired")]
    PrepTimeExpired {},
    #[serde(rename = "coding.started")]
    CodingStarted {},
    #[serde(rename = "coding.code_changed")]
    CodingCodeChanged { code: String },
    #[serde(rename = "nudge.requested")]
    NudgeRequested {},
    #[serde(rename = "coding.silent_started")]
    CodingSilentStarted {},
    #[serde(rename = "coding.solution_submitted")]
    CodingSolutionSubmitted {},
    #[serde(rename = "silent.ended")]
    SilentEnded {},
    #[serde(rename = "summary.continued")]
    SummaryContinued {},
    #[serde(rename = "reflection.submitted")]
    ReflectionSubmitted(Reflection),
    #[serde(rename = "session.completed")]
    SessionCompleted {},
    #[serde(rename = "session.abandoned")]
    SessionAbandoned {},
    #[serde(rename = "audio.started")]
    AudioStarted {},
    #[serde(rename = "audio.stopped")]
    AudioStopped {},
    #[serde(rename = "audio.permission_denied")]
    AudioPermissionDenied {},
}

/// Fieldless mirror of the payload tags. Used by the transition table and
/// by the string-keyed dispatch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SessionStarted,
    PrepInvariantsChanged,
    PrepTimeExpired,
    CodingStarted,
    CodingCodeChanged,
    NudgeRequested,
    CodingSilentStarted,
    CodingSolutionSubmitted,
    SilentEnded,
    SummaryContinued,
    ReflectionSubmitted,
    SessionCompleted,
    SessionAbandoned,
    AudioStarted,
    AudioStopped,
    AudioPermissionDenied,
}

impl EventKind {
    pub const ALL: [EventKind; 16] = [
        EventKind::SessionStarted,
        EventKind::PrepInvariantsChanged,
        EventKind::PrepTimeExpired,
        EventKind::CodingStarted,
        EventKind::CodingCodeChanged,
        EventKind::NudgeRequested,
        EventKind::CodingSilentStarted,
        EventKind::CodingSolutionSubmitted,
        EventKind::SilentEnded,
        EventKind::SummaryContinued,
        EventKind::ReflectionSubmitted,
        EventKind::SessionCompleted,
        EventKind::SessionAbandoned,
        EventKind::AudioStarted,
        EventKind::AudioStopped,
        EventKind::AudioPermissionDenied,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SessionStarted => "session.started",
            EventKind::PrepInvariantsChanged => "prep.invariants_changed",
            EventKind::PrepTimeExpired => "prep.time_expired",
            EventKind::CodingStarted => "coding.started",
            EventKind::CodingCodeChanged => "coding.code_changed",
            EventKind::NudgeRequested => "nudge.requested",
            EventKind::CodingSilentStarted => "coding.silent_started",
            EventKind::CodingSolutionSubmitted => "coding.solution_submitted",
            EventKind::SilentEnded => "silent.ended",
            EventKind::SummaryContinued => "summary.continued",
            EventKind::ReflectionSubmitted => "reflection.submitted",
            EventKind::SessionCompleted => "session.completed",
            EventKind::SessionAbandoned => "session.abandoned",
            EventKind::AudioStarted => "audio.started",
            EventKind::AudioStopped => "audio.stopped",
            EventKind::AudioPermissionDenied => "audio.permission_denied",
        }
    }

    /// Look up a dotted identifier. `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<EventKind> {
        EventKind::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::SessionStarted {} => EventKind::SessionStarted,
            EventPayload::PrepInvariantsChanged { .. } => EventKind::PrepInvariantsChanged,
            EventPayload::PrepTimeExpired {} => EventKind::PrepTimeExpired,
            EventPayload::CodingStarted {} => EventKind::CodingStarted,
            EventPayload::CodingCodeChanged { .. } => EventKind::CodingCodeChanged,
            EventPayload::NudgeRequested {} => EventKind::NudgeRequested,
            EventPayload::CodingSilentStarted {} => EventKind::CodingSilentStarted,
            EventPayload::CodingSolutionSubmitted {} => EventKind::CodingSolutionSubmitted,
            EventPayload::SilentEnded {} => EventKind::SilentEnded,
            EventPayload::SummaryContinued {} => EventKind::SummaryContinued,
            EventPayload::ReflectionSubmitted(_) => EventKind::ReflectionSubmitted,
            EventPayload::SessionCompleted {} => EventKind::SessionCompleted,
            EventPayload::SessionAbandoned {} => EventKind::SessionAbandoned,
            EventPayload::AudioStarted {} => EventKind::AudioStarted,
            EventPayload::AudioStopped {} => EventKind::AudioStopped,
            EventPayload::AudioPermissionDenied {} => EventKind::AudioPermissionDenied,
        }
    }

    /// Decode a payload from its wire parts (identifier + JSON data).
    pub fn from_parts(
        kind: EventKind,
        data: serde_json::Value,
    ) -> Result<EventPayload, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "type": kind.as_str(),
            "data": data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{ClearApproach, StallRecovery, TimePressure, YesNo};

    #[test]
    fn wire_shape() {
        let event = SessionEvent {
            timestamp: 1000,
            payload: EventPayload::PrepInvariantsChanged {
                text: "array is sorted".into(),
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "prep.invariants_changed");
        assert_eq!(value["timestamp"], 1000);
        assert_eq!(value["data"]["text"], "array is sorted");
    }

    #[test]
    fn empty_payload_serializes_as_empty_object() {
        let event = SessionEvent {
            timestamp: 42,
            payload: EventPayload::NudgeRequested {},
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["data"], serde_json::json!({}));
    }

    #[test]
    fn round_trip() {
        let original = SessionEvent {
            timestamp: 7,
            payload: EventPayload::ReflectionSubmitted(Reflection {
                clear_approach: ClearApproach::Partially,
                prolonged_stall: YesNo::Yes,
                recovered_from_stall: StallRecovery::Partially,
                time_pressure: TimePressure::Manageable,
                would_change_approach: YesNo::No,
            }),
        };
        let json = serde_json::to_string(&original).unwrap();
        let back: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn kind_strings_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::parse("session.paused"), None);
    }

    #[test]
    fn from_parts_rejects_malformed_data() {
        let err = EventPayload::from_parts(
            EventKind::PrepInvariantsChanged,
            serde_json::json!({ "text": 5 }),
        );
        assert!(err.is_err());
    }
}
