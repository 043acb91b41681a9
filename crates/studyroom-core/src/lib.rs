//! # Studyroom Core Library
//!
//! This library provides the core business logic for the Studyroom
//! study-session engine. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary, with any GUI
//! being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Cycle Generator**: pure mapping from a time budget and settings
//!   to an ordered list of study/break cycles
//! - **Countdown Engine**: a wall-clock-based state machine that
//!   requires the caller to periodically invoke `tick()`
//! - **Session Controller**: owns the active session and orchestrates
//!   cycle transitions
//! - **Storage**: SQLite-based session/stats persistence and TOML-based
//!   settings
//! - **Achievements**: pure evaluation of unlock thresholds against the
//!   aggregate statistics
//!
//! ## Key Components
//!
//! - [`StudyEngine`]: boundary surface consumed by collaborators
//! - [`SessionController`]: session state machine
//! - [`CountdownEngine`]: per-cycle countdown state machine
//! - [`Store`]: session and statistics persistence

pub mod achievements;
pub mod engine;
pub mod error;
pub mod events;
pub mod session;
pub mod stats;
pub mod storage;

pub use achievements::{Achievement, AchievementKind};
pub use engine::StudyEngine;
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use session::{
    generate_cycles, CountdownEngine, Cycle, CycleKind, Session, SessionController, SessionStatus,
    Settings, TimerState,
};
pub use stats::{SessionSummary, Stats, SubjectStats};
pub use storage::{RecordOutcome, Store};
