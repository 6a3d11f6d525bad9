//! # Drillroom Core Library
//!
//! This library provides the core business logic for Drillroom, a timed
//! coding-interview rehearsal tool. It implements a CLI-first philosophy
//! where all operations are available via a standalone CLI binary; any GUI
//! is a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Session Engine**: An event-sourced state machine over an injected
//!   clock. Every user/system action is proposed through `dispatch()`,
//!   validated against the current phase, and appended to an immutable log;
//!   state is always derived by replaying that log.
//! - **Storage**: SQLite-based event-log persistence and TOML-based
//!   configuration
//! - **Driver**: Caller-invoked timer tick that dispatches phase-expiry
//!   transitions; the engine never schedules anything itself
//!
//! ## Key Components
//!
//! - [`SessionEngine`]: Core session state machine
//! - [`Preset`]: Timing/budget presets for a session
//! - [`Database`]: Event-log persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod problem;
pub mod session;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, DispatchError};
pub use problem::{Difficulty, Problem};
pub use session::{
    advance_expired, ClearApproach, Clock, EventKind, EventPayload, Phase, Preset, Reflection,
    SessionConfig, SessionEngine, SessionEvent, SessionState, SessionStatus, StallRecovery,
    SubscriberId, TimePressure, YesNo,
};
pub use storage::{Config, Database, SessionRecord};
