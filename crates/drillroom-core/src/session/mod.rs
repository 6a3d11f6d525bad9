mod driver;
mod engine;
mod event;
mod preset;
mod reducer;
mod state;

pub use driver::advance_expired;
pub use engine::{Clock, SessionEngine, SubscriberId};
pub use event::{EventKind, EventPayload, SessionEvent};
pub use preset::{Preset, SessionConfig};
pub use state::{
    ClearApproach, Phase, Reflection, SessionState, SessionStatus, StallRecovery, TimePressure,
    YesNo,
};
