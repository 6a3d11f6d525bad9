use std::path::PathBuf;

use clap::Subcommand;
use drillroom_core::storage::Database;
use drillroom_core::{
    advance_expired, Config, DatabaseError, DispatchError, EventPayload, Preset, SessionEngine,
    SessionRecord,
};
use serde_json::json;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a new session
    Start {
        /// Preset name (defaults to the configured preset)
        #[arg(long)]
        preset: Option<String>,
        /// Problem id from the built-in catalog
        #[arg(long)]
        problem: String,
    },
    /// Print current session state as JSON
    Status,
    /// Record the invariants scratchpad
    Invariants { text: String },
    /// Move from prep to coding
    StartCoding,
    /// Record the code buffer
    Code {
        /// Read the buffer from a file instead of the argument
        #[arg(long)]
        file: Option<PathBuf>,
        code: Option<String>,
    },
    /// Spend one nudge
    Nudge,
    /// Enter the silent interval
    Silent,
    /// Submit early, skipping the silent interval
    Submit,
    /// Leave the summary screen
    Continue,
    /// Answer the self-reflection and complete the session
    Reflect {
        /// yes | partially | no
        #[arg(long)]
        clear_approach: String,
        /// yes | no
        #[arg(long)]
        prolonged_stall: String,
        /// yes | partially | no | n/a
        #[arg(long)]
        recovered_from_stall: String,
        /// comfortable | manageable | overwhelming
        #[arg(long)]
        time_pressure: String,
        /// yes | no
        #[arg(long)]
        would_change_approach: String,
    },
    /// Abandon the session
    Abandon,
    /// Audio capture markers
    Audio {
        #[command(subcommand)]
        action: AudioAction,
    },
    /// Dispatch any timer expirations that are due
    Tick,
    /// Dump a session's event log as JSON
    Events {
        /// Session id (defaults to the session in progress)
        #[arg(long)]
        id: Option<String>,
    },
    /// List stored sessions
    List,
}

#[derive(Subcommand)]
pub enum AudioAction {
    /// Recording began
    Start,
    /// Recording stopped
    Stop,
    /// Microphone permission was denied during prep
    Denied,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;
    match action {
        SessionAction::Start { preset, problem } => {
            if let Some(active) = db.active_session()? {
                return Err(
                    format!("session {} is still in progress; abandon it first", active.id).into(),
                );
            }
            let preset = match preset {
                Some(name) => name.parse::<Preset>()?,
                None => Config::load()?.defaults.preset,
            };
            let problem = drillroom_core::problem::find(&problem)
                .ok_or_else(|| format!("unknown problem '{problem}' (see `problem list`)"))?;
            let mut engine = SessionEngine::new(problem, preset);
            engine
                .dispatch(EventPayload::SessionStarted {})
                .map_err(reject)?;
            let state = engine.state();
            let id = state
                .id
                .clone()
                .ok_or("engine did not assign a session id")?;
            db.save_session(
                &id,
                engine.problem(),
                engine.preset(),
                state.status,
                &engine.events(),
            )?;
            print_json(&state)?;
        }
        SessionAction::Status => {
            let (_record, mut engine) = load_active(&db)?;
            print_json(&engine.state())?;
        }
        SessionAction::Invariants { text } => {
            apply(&mut db, EventPayload::PrepInvariantsChanged { text })?;
        }
        SessionAction::StartCoding => {
            apply(&mut db, EventPayload::CodingStarted {})?;
        }
        SessionAction::Code { file, code } => {
            let code = match (file, code) {
                (Some(path), _) => std::fs::read_to_string(path)?,
                (None, Some(code)) => code,
                (None, None) => return Err("provide CODE or --file".into()),
            };
            apply(&mut db, EventPayload::CodingCodeChanged { code })?;
        }
        SessionAction::Nudge => {
            apply(&mut db, EventPayload::NudgeRequested {})?;
        }
        SessionAction::Silent => {
            apply(&mut db, EventPayload::CodingSilentStarted {})?;
        }
        SessionAction::Submit => {
            apply(&mut db, EventPayload::CodingSolutionSubmitted {})?;
        }
        SessionAction::Continue => {
            apply(&mut db, EventPayload::SummaryContinued {})?;
        }
        SessionAction::Reflect {
            clear_approach,
            prolonged_stall,
            recovered_from_stall,
            time_pressure,
            would_change_approach,
        } => {
            let (record, mut engine) = load_active(&db)?;
            engine
                .dispatch_raw(
                    "reflection.submitted",
                    json!({
                        "clearApproach": clear_approach,
                        "prolongedStall": prolonged_stall,
                        "recoveredFromStall": recovered_from_stall,
                        "timePressure": time_pressure,
                        "wouldChangeApproach": would_change_approach,
                    }),
                )
                .map_err(reject)?;
            persist(&mut db, &record, &mut engine)?;
            print_json(&engine.state())?;
        }
        SessionAction::Abandon => {
            apply(&mut db, EventPayload::SessionAbandoned {})?;
        }
        SessionAction::Audio { action } => {
            let payload = match action {
                AudioAction::Start => EventPayload::AudioStarted {},
                AudioAction::Stop => EventPayload::AudioStopped {},
                AudioAction::Denied => EventPayload::AudioPermissionDenied {},
            };
            apply(&mut db, payload)?;
        }
        SessionAction::Tick => {
            let (record, mut engine) = load_active(&db)?;
            let produced = advance_expired(&mut engine).map_err(reject)?;
            if !produced.is_empty() {
                persist(&mut db, &record, &mut engine)?;
            }
            print_json(&produced)?;
        }
        SessionAction::Events { id } => {
            let record = match id {
                Some(id) => db.get_session(&id)?,
                None => db.active_session()?.ok_or(DatabaseError::NoActiveSession)?,
            };
            print_json(&db.load_events(&record.id)?)?;
        }
        SessionAction::List => {
            print_json(&db.list_sessions()?)?;
        }
    }
    Ok(())
}

/// Load the in-progress session and rebuild its engine from the stored log.
fn load_active(db: &Database) -> Result<(SessionRecord, SessionEngine), Box<dyn std::error::Error>> {
    let record = db.active_session()?.ok_or(DatabaseError::NoActiveSession)?;
    let mut engine = SessionEngine::new(record.problem.clone(), record.preset);
    engine.restore(db.load_events(&record.id)?);
    Ok((record, engine))
}

/// Write the engine's full event array back under the stored row's id.
/// The projection regenerates its opaque id on every replay; the row keeps
/// the id the session was created under.
fn persist(
    db: &mut Database,
    record: &SessionRecord,
    engine: &mut SessionEngine,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = engine.state().status;
    db.save_session(
        &record.id,
        engine.problem(),
        engine.preset(),
        status,
        &engine.events(),
    )?;
    Ok(())
}

fn apply(db: &mut Database, payload: EventPayload) -> Result<(), Box<dyn std::error::Error>> {
    let (record, mut engine) = load_active(db)?;
    let event = engine.dispatch(payload).map_err(reject)?;
    persist(db, &record, &mut engine)?;
    print_json(&event)?;
    Ok(())
}

/// Rejections leave the store untouched; surface the code with the message.
fn reject(err: DispatchError) -> Box<dyn std::error::Error> {
    format!("{}: {}", err.code(), err).into()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
